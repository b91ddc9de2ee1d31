use crate::error::NestError;
use crate::free_rect::FreeRectPool;
use crate::orientation::{self, Orientation};
use crate::types::{PackConfig, PackingResult, Part, PlacedItem, Sheet};

/// One physical copy of a part awaiting placement.
#[derive(Debug, Clone, Copy)]
struct PartInstance {
    part_index: usize,
    width: f64,
    height: f64,
}

impl PartInstance {
    fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// The placement chosen by one scan pass.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    instance_index: usize,
    rect_index: usize,
    orientation: Orientation,
    score: f64,
}

/// Packs every part copy onto as few sheets as the greedy heuristic
/// manages: instances sorted largest-first, each placement chosen by best
/// short-side fit over every remaining instance, orientation and free
/// rectangle, with the pool re-split and re-merged after each commit.
///
/// The run is strictly sequential; every decision depends on the pool state
/// left by the previous one. Given its inputs the function is pure, so
/// separate invocations may run concurrently.
pub fn pack(parts: &[Part], config: &PackConfig) -> Result<PackingResult, NestError> {
    config.validate()?;
    ensure_parts_fit(parts, config)?;

    let total_items: u32 = parts.iter().map(|p| p.quantity).sum();

    let mut remaining = expand_instances(parts);
    let mut sheets: Vec<Sheet> = Vec::new();

    while !remaining.is_empty() {
        let sheet_index = sheets.len();
        let mut pool = FreeRectPool::new(
            config.edge_gap,
            config.edge_gap,
            config.usable_width(),
            config.usable_height(),
        );
        let mut items: Vec<PlacedItem> = Vec::new();

        // Re-scan from scratch after every commit: the split/merge changed
        // the pool, so earlier rejected placements may have become viable
        // (and the best candidate may have changed).
        while let Some(best) = scan_pass(&remaining, &items, &pool, config) {
            let rect = pool
                .get(best.rect_index)
                .ok_or_else(|| NestError::Internal("chosen free rectangle vanished".to_string()))?;
            let instance = remaining[best.instance_index];
            let part = &parts[instance.part_index];

            items.push(PlacedItem {
                part: part.name.clone(),
                part_index: instance.part_index,
                x: rect.x,
                y: rect.y,
                // Store the true footprint; the spacing inflation exists
                // only for fit testing and splitting.
                width: best.orientation.width,
                height: best.orientation.height,
                rotation: best.orientation.rotation,
                mirrored: best.orientation.mirrored,
            });

            pool.split(
                best.rect_index,
                best.orientation.width + config.part_spacing,
                best.orientation.height + config.part_spacing,
            );
            pool.merge();
            remaining.remove(best.instance_index);
        }

        if items.is_empty() {
            // Pre-flight guarantees every instance fits an empty sheet, so
            // an empty pass here is a logic fault, not a capacity problem.
            // Surfacing it beats opening empty sheets forever.
            return Err(NestError::Internal(format!(
                "no instance of {} remaining could be placed on an empty sheet",
                remaining.len()
            )));
        }

        tracing::debug!(
            sheet = sheet_index,
            placed = items.len(),
            remaining = remaining.len(),
            "sheet finished"
        );

        sheets.push(Sheet {
            index: sheet_index,
            width: config.sheet_width,
            height: config.sheet_height,
            items,
            free_rects: pool.into_rects(),
        });
    }

    let used_area: f64 = parts.iter().map(|p| p.area() * p.quantity as f64).sum();
    let total_sheet_area = config.sheet_width * config.sheet_height * sheets.len() as f64;
    let utilization = if total_sheet_area > 0.0 {
        used_area / total_sheet_area
    } else {
        0.0
    };

    Ok(PackingResult {
        total_items,
        total_sheets: sheets.len(),
        utilization,
        sheets,
    })
}

/// Rejects any part whose spacing-inflated footprint cannot fit the usable
/// interior in any allowed orientation. Checked up front so the sheet loop
/// can never spin opening empty sheets.
fn ensure_parts_fit(parts: &[Part], config: &PackConfig) -> Result<(), NestError> {
    let usable_width = config.usable_width();
    let usable_height = config.usable_height();

    for part in parts {
        if part.quantity == 0 {
            continue;
        }
        let fits = orientation::generate(
            part.width,
            part.height,
            config.allow_rotation,
            config.allow_mirroring,
        )
        .iter()
        .any(|o| {
            o.width + config.part_spacing <= usable_width
                && o.height + config.part_spacing <= usable_height
        });
        if !fits {
            return Err(NestError::UnplaceablePart {
                part: part.name.clone(),
                width: part.width,
                height: part.height,
            });
        }
    }
    Ok(())
}

fn expand_instances(parts: &[Part]) -> Vec<PartInstance> {
    let mut instances = Vec::new();
    for (part_index, part) in parts.iter().enumerate() {
        for _ in 0..part.quantity {
            instances.push(PartInstance {
                part_index,
                width: part.width,
                height: part.height,
            });
        }
    }
    // Largest-first placement reduces fragmentation. Stable sort keeps
    // input order among equal areas, which keeps layouts reproducible.
    instances.sort_by(|a, b| b.area().total_cmp(&a.area()));
    instances
}

/// One full scan over remaining instances x orientations x free rects,
/// returning the single globally best-scoring placement, if any.
fn scan_pass(
    remaining: &[PartInstance],
    items: &[PlacedItem],
    pool: &FreeRectPool,
    config: &PackConfig,
) -> Option<Candidate> {
    let mut best: Option<Candidate> = None;

    for (instance_index, instance) in remaining.iter().enumerate() {
        let orientations = orientation::generate(
            instance.width,
            instance.height,
            config.allow_rotation,
            config.allow_mirroring,
        );
        for o in orientations {
            let fit = pool.best_fit(
                o.width + config.part_spacing,
                o.height + config.part_spacing,
                o.rotation,
                items,
                config.part_spacing,
            );
            if let Some(fit) = fit
                && best.is_none_or(|b| fit.score < b.score)
            {
                best = Some(Candidate {
                    instance_index,
                    rect_index: fit.rect_index,
                    orientation: o,
                    score: fit.score,
                });
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::free_rect::EPS;
    use std::collections::HashMap;

    /// Validates a complete result:
    /// 1. Every item lies inside the sheet interior minus the edge gap
    /// 2. No two spacing-inflated items on the same sheet overlap
    /// 3. Every part's placed count equals its requested quantity
    fn assert_result_valid(result: &PackingResult, parts: &[Part], config: &PackConfig) {
        let mut counts: HashMap<&str, u32> = HashMap::new();

        for sheet in &result.sheets {
            for (i, item) in sheet.items.iter().enumerate() {
                assert!(
                    item.x >= config.edge_gap - EPS && item.y >= config.edge_gap - EPS,
                    "sheet {}, item {i} at ({}, {}) violates edge gap {}",
                    sheet.index,
                    item.x,
                    item.y,
                    config.edge_gap
                );
                assert!(
                    item.x + item.width <= config.sheet_width - config.edge_gap + EPS,
                    "sheet {}, item {i} exceeds usable width",
                    sheet.index
                );
                assert!(
                    item.y + item.height <= config.sheet_height - config.edge_gap + EPS,
                    "sheet {}, item {i} exceeds usable height",
                    sheet.index
                );
                *counts.entry(item.part.as_str()).or_default() += 1;
            }
            assert_no_overlaps(sheet, config.part_spacing);
        }

        for part in parts {
            assert_eq!(
                counts.get(part.name.as_str()).copied().unwrap_or(0),
                part.quantity,
                "part '{}' placed count != quantity",
                part.name
            );
        }
    }

    fn assert_no_overlaps(sheet: &Sheet, spacing: f64) {
        for i in 0..sheet.items.len() {
            for j in (i + 1)..sheet.items.len() {
                let a = &sheet.items[i];
                let b = &sheet.items[j];
                let overlaps = a.x < b.x + b.width + spacing - EPS
                    && b.x < a.x + a.width + spacing - EPS
                    && a.y < b.y + b.height + spacing - EPS
                    && b.y < a.y + a.height + spacing - EPS;
                assert!(
                    !overlaps,
                    "sheet {}: item {i} ({}x{} @ {},{}) overlaps item {j} ({}x{} @ {},{})",
                    sheet.index, a.width, a.height, a.x, a.y, b.width, b.height, b.x, b.y
                );
            }
        }
    }

    #[test]
    fn test_four_parts_single_sheet_utilization() {
        let parts = vec![Part::from_size("panel", 100.0, 50.0, 4)];
        let mut config = PackConfig::new(300.0, 300.0);
        config.allow_rotation = false;

        let result = pack(&parts, &config).unwrap();
        assert_result_valid(&result, &parts, &config);
        assert_eq!(result.total_items, 4);
        assert_eq!(result.total_sheets, 1);
        assert!((result.utilization - 20000.0 / 90000.0).abs() < 1e-9);
    }

    #[test]
    fn test_oversized_part_is_unplaceable() {
        let parts = vec![
            Part::from_size("small", 50.0, 50.0, 2),
            Part::from_size("slab", 250.0, 250.0, 1),
        ];
        let config = PackConfig::new(200.0, 200.0);

        match pack(&parts, &config) {
            Err(NestError::UnplaceablePart { part, .. }) => assert_eq!(part, "slab"),
            other => panic!("expected UnplaceablePart, got {other:?}"),
        }
    }

    #[test]
    fn test_rotation_makes_part_placeable() {
        let parts = vec![Part::from_size("rail", 50.0, 180.0, 1)];
        let mut config = PackConfig::new(200.0, 100.0);

        config.allow_rotation = false;
        assert!(matches!(
            pack(&parts, &config),
            Err(NestError::UnplaceablePart { .. })
        ));

        config.allow_rotation = true;
        let result = pack(&parts, &config).unwrap();
        assert_result_valid(&result, &parts, &config);
        assert_eq!(result.sheets[0].items[0].rotation, 90);
    }

    #[test]
    fn test_two_part_mix_with_rotation() {
        let parts = vec![
            Part::from_size("a", 100.0, 100.0, 2),
            Part::from_size("b", 50.0, 200.0, 1),
        ];
        let config = PackConfig::new(200.0, 200.0);

        let result = pack(&parts, &config).unwrap();
        assert_result_valid(&result, &parts, &config);
        assert_eq!(result.total_items, 3);
        assert_eq!(result.total_sheets, 1);
    }

    #[test]
    fn test_overflow_opens_second_sheet() {
        let parts = vec![Part::from_size("block", 60.0, 60.0, 4)];
        let mut config = PackConfig::new(100.0, 100.0);
        config.allow_rotation = false;

        let result = pack(&parts, &config).unwrap();
        assert_result_valid(&result, &parts, &config);
        // One 60x60 block per 100x100 sheet: the leftover strips are too
        // narrow for another.
        assert_eq!(result.total_sheets, 4);
    }

    #[test]
    fn test_edge_gap_shrinks_capacity() {
        let parts = vec![Part::from_size("panel", 100.0, 100.0, 1)];
        let mut config = PackConfig::new(110.0, 110.0);
        config.allow_rotation = false;
        config.edge_gap = 10.0;

        // Usable interior is 90x90: too small.
        assert!(matches!(
            pack(&parts, &config),
            Err(NestError::UnplaceablePart { .. })
        ));

        config.edge_gap = 5.0;
        let result = pack(&parts, &config).unwrap();
        assert_result_valid(&result, &parts, &config);
        assert_eq!(result.sheets[0].items[0].x, 5.0);
        assert_eq!(result.sheets[0].items[0].y, 5.0);
    }

    #[test]
    fn test_part_spacing_separates_items() {
        let parts = vec![Part::from_size("strip", 45.0, 90.0, 2)];
        let mut config = PackConfig::new(100.0, 100.0);
        config.allow_rotation = false;
        config.part_spacing = 5.0;

        let result = pack(&parts, &config).unwrap();
        assert_result_valid(&result, &parts, &config);
        assert_eq!(result.total_sheets, 1);
        let sheet = &result.sheets[0];
        let gap = (sheet.items[1].x - (sheet.items[0].x + sheet.items[0].width)).abs();
        assert!(gap >= 5.0 - EPS);
    }

    #[test]
    fn test_spacing_overflow_needs_second_sheet() {
        // 50 + 10 + 50 = 110 > 100, so the second copy cannot share a row
        // with the first.
        let parts = vec![Part::from_size("half", 50.0, 90.0, 2)];
        let mut config = PackConfig::new(100.0, 100.0);
        config.allow_rotation = false;
        config.part_spacing = 10.0;

        let result = pack(&parts, &config).unwrap();
        assert_result_valid(&result, &parts, &config);
        assert_eq!(result.total_sheets, 2);
    }

    #[test]
    fn test_free_area_conservation() {
        // Free rects plus spacing-inflated footprints must tile the usable
        // interior exactly.
        let parts = vec![
            Part::from_size("a", 80.0, 60.0, 3),
            Part::from_size("b", 40.0, 40.0, 4),
        ];
        let mut config = PackConfig::new(300.0, 200.0);
        config.allow_rotation = false;
        config.part_spacing = 2.0;
        config.edge_gap = 4.0;

        let result = pack(&parts, &config).unwrap();
        assert_result_valid(&result, &parts, &config);
        for sheet in &result.sheets {
            let free: f64 = sheet.free_rects.iter().map(|r| r.width * r.height).sum();
            let used: f64 = sheet
                .items
                .iter()
                .map(|i| (i.width + config.part_spacing) * (i.height + config.part_spacing))
                .sum();
            let usable = config.usable_width() * config.usable_height();
            assert!(
                (free + used - usable).abs() < 1e-6,
                "sheet {}: free {free} + used {used} != usable {usable}",
                sheet.index
            );
        }
    }

    #[test]
    fn test_large_batch_mixed_sizes() {
        let parts = vec![
            Part::from_size("door", 800.0, 600.0, 5),
            Part::from_size("shelf", 400.0, 300.0, 8),
            Part::from_size("side", 600.0, 400.0, 4),
            Part::from_size("back", 1200.0, 600.0, 3),
            Part::from_size("drawer", 300.0, 200.0, 6),
            Part::from_size("top", 500.0, 500.0, 4),
        ];
        let total: u32 = parts.iter().map(|p| p.quantity).sum();
        assert_eq!(total, 30);

        let config = PackConfig::new(2440.0, 1220.0);
        let result = pack(&parts, &config).unwrap();
        assert_result_valid(&result, &parts, &config);
        assert_eq!(result.total_items, 30);

        // Area lower bound on the sheet count.
        let used: f64 = parts.iter().map(|p| p.area() * p.quantity as f64).sum();
        let min_sheets = (used / (2440.0 * 1220.0)).ceil() as usize;
        assert!(result.total_sheets >= min_sheets);
        assert!(result.utilization > 0.0 && result.utilization <= 1.0);
    }

    #[test]
    fn test_deterministic_layouts() {
        let parts = vec![
            Part::from_size("a", 120.0, 80.0, 4),
            Part::from_size("b", 80.0, 120.0, 4),
            Part::from_size("c", 60.0, 60.0, 5),
        ];
        let mut config = PackConfig::new(400.0, 300.0);
        config.part_spacing = 3.0;

        let first = pack(&parts, &config).unwrap();
        let second = pack(&parts, &config).unwrap();
        assert_eq!(first.total_sheets, second.total_sheets);
        for (s1, s2) in first.sheets.iter().zip(&second.sheets) {
            assert_eq!(s1.items.len(), s2.items.len());
            for (a, b) in s1.items.iter().zip(&s2.items) {
                assert_eq!(a.part, b.part);
                assert_eq!((a.x, a.y), (b.x, b.y));
                assert_eq!((a.rotation, a.mirrored), (b.rotation, b.mirrored));
            }
        }
    }

    #[test]
    fn test_zero_quantity_parts_are_skipped() {
        let parts = vec![
            Part::from_size("wanted", 50.0, 50.0, 2),
            Part::from_size("none", 500.0, 500.0, 0),
        ];
        let config = PackConfig::new(200.0, 200.0);
        // The oversized part has quantity 0 and must not trip pre-flight.
        let result = pack(&parts, &config).unwrap();
        assert_eq!(result.total_items, 2);
        assert_eq!(result.total_sheets, 1);
    }

    #[test]
    fn test_no_parts_no_sheets() {
        let config = PackConfig::new(200.0, 200.0);
        let result = pack(&[], &config).unwrap();
        assert_eq!(result.total_items, 0);
        assert_eq!(result.total_sheets, 0);
        assert_eq!(result.utilization, 0.0);
    }

    #[test]
    fn test_invalid_config_rejected_before_packing() {
        let parts = vec![Part::from_size("p", 10.0, 10.0, 1)];
        let config = PackConfig::new(0.0, 100.0);
        assert!(matches!(
            pack(&parts, &config),
            Err(NestError::InvalidSheetConfig(_))
        ));
    }
}
