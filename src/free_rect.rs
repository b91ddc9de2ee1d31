use crate::types::PlacedItem;
use serde::{Deserialize, Serialize};

/// Tolerance for adjacency and remainder tests on millimeter coordinates.
pub const EPS: f64 = 1e-9;

/// An axis-aligned unplaced region of a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FreeRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl FreeRect {
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BestFit {
    pub rect_index: usize,
    pub score: f64,
}

/// The set of free rectangles of one sheet.
///
/// Rectangles are kept in insertion order; `best_fit` breaks score ties by
/// first encounter, so insertion order is the deterministic tie-break that
/// keeps layouts reproducible.
#[derive(Debug, Clone)]
pub struct FreeRectPool {
    rects: Vec<FreeRect>,
}

impl FreeRectPool {
    /// A pool holding the usable interior of a fresh sheet.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            rects: vec![FreeRect {
                x,
                y,
                width,
                height,
            }],
        }
    }

    pub fn rects(&self) -> &[FreeRect] {
        &self.rects
    }

    pub fn into_rects(self) -> Vec<FreeRect> {
        self.rects
    }

    pub fn get(&self, index: usize) -> Option<FreeRect> {
        self.rects.get(index).copied()
    }

    /// Finds the free rectangle best fitting a spacing-inflated candidate
    /// footprint, scored by "best short side fit" (smaller leftover on the
    /// tighter dimension wins). A rectangle only qualifies if placing the
    /// candidate at its origin collides with no already-placed item.
    pub fn best_fit(
        &self,
        candidate_width: f64,
        candidate_height: f64,
        rotation: i32,
        placed: &[PlacedItem],
        spacing: f64,
    ) -> Option<BestFit> {
        let mut best: Option<BestFit> = None;

        for (rect_index, rect) in self.rects.iter().enumerate() {
            if candidate_width > rect.width || candidate_height > rect.height {
                continue;
            }
            if collides(
                placed,
                rect.x,
                rect.y,
                candidate_width,
                candidate_height,
                rotation,
                spacing,
            ) {
                continue;
            }
            let score = f64::min(
                rect.width - candidate_width,
                rect.height - candidate_height,
            );
            // Strict comparison: the first rectangle with the lowest score
            // wins, which makes layouts independent of anything but
            // insertion order.
            if best.is_none_or(|b| score < b.score) {
                best = Some(BestFit { rect_index, score });
            }
        }

        best
    }

    /// Guillotine split after committing a placement of `used_width` x
    /// `used_height` at the origin of the rectangle at `index`.
    ///
    /// When both remainders are positive the axis leaving the larger single
    /// leftover rectangle is cut first: a wider remainder keeps the
    /// full-height right strip, a taller remainder keeps the full-width
    /// bottom strip.
    pub fn split(&mut self, index: usize, used_width: f64, used_height: f64) {
        let rect = self.rects.remove(index);
        let remaining_width = rect.width - used_width;
        let remaining_height = rect.height - used_height;

        if remaining_width > EPS && remaining_height > EPS {
            if remaining_width >= remaining_height {
                self.rects.push(FreeRect {
                    x: rect.x + used_width,
                    y: rect.y,
                    width: remaining_width,
                    height: rect.height,
                });
                self.rects.push(FreeRect {
                    x: rect.x,
                    y: rect.y + used_height,
                    width: used_width,
                    height: remaining_height,
                });
            } else {
                self.rects.push(FreeRect {
                    x: rect.x,
                    y: rect.y + used_height,
                    width: rect.width,
                    height: remaining_height,
                });
                self.rects.push(FreeRect {
                    x: rect.x + used_width,
                    y: rect.y,
                    width: remaining_width,
                    height: used_height,
                });
            }
        } else if remaining_width > EPS {
            self.rects.push(FreeRect {
                x: rect.x + used_width,
                y: rect.y,
                width: remaining_width,
                height: rect.height,
            });
        } else if remaining_height > EPS {
            self.rects.push(FreeRect {
                x: rect.x,
                y: rect.y + used_height,
                width: rect.width,
                height: remaining_height,
            });
        }
    }

    /// Re-joins edge-adjacent rectangles with a matching side, repeating
    /// until a full pass makes no merge. Counteracts guillotine
    /// fragmentation that would otherwise block placements an obviously
    /// large enough region could take.
    pub fn merge(&mut self) {
        let mut merged = true;
        while merged {
            merged = false;
            'outer: for i in 0..self.rects.len() {
                for j in (i + 1)..self.rects.len() {
                    if let Some(m) = try_merge(self.rects[i], self.rects[j]) {
                        self.rects[i] = m;
                        self.rects.remove(j);
                        merged = true;
                        break 'outer;
                    }
                }
            }
        }
    }

    pub fn total_free_area(&self) -> f64 {
        self.rects.iter().map(FreeRect::area).sum()
    }
}

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= EPS
}

fn try_merge(a: FreeRect, b: FreeRect) -> Option<FreeRect> {
    // Horizontal: same row and height, touching along x.
    if approx_eq(a.y, b.y) && approx_eq(a.height, b.height) {
        if approx_eq(a.x + a.width, b.x) {
            return Some(FreeRect {
                x: a.x,
                y: a.y,
                width: a.width + b.width,
                height: a.height,
            });
        }
        if approx_eq(b.x + b.width, a.x) {
            return Some(FreeRect {
                x: b.x,
                y: b.y,
                width: a.width + b.width,
                height: a.height,
            });
        }
    }
    // Vertical: same column and width, touching along y.
    if approx_eq(a.x, b.x) && approx_eq(a.width, b.width) {
        if approx_eq(a.y + a.height, b.y) {
            return Some(FreeRect {
                x: a.x,
                y: a.y,
                width: a.width,
                height: a.height + b.height,
            });
        }
        if approx_eq(b.y + b.height, a.y) {
            return Some(FreeRect {
                x: b.x,
                y: b.y,
                width: a.width,
                height: a.height + b.height,
            });
        }
    }
    None
}

/// Tests a candidate footprint at (x, y) against every placed item.
///
/// Candidate dimensions arrive already inflated by the part spacing; placed
/// items are inflated on their trailing edges. When either side of a pair
/// involves a 90 degree rotation the candidate box is grown on all sides by
/// 10% of its larger dimension — a conservative stand-in for exact
/// rotated-rectangle intersection, which this model does not attempt.
pub fn collides(
    placed: &[PlacedItem],
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    rotation: i32,
    spacing: f64,
) -> bool {
    for item in placed {
        let mut left = x;
        let mut top = y;
        let mut right = x + width;
        let mut bottom = y + height;

        if rotation != 0 || item.rotation != 0 {
            let safety_margin = f64::max(width, height) * 0.1;
            left -= safety_margin;
            top -= safety_margin;
            right += safety_margin;
            bottom += safety_margin;
        }

        let item_right = item.x + item.width + spacing;
        let item_bottom = item.y + item.height + spacing;

        if left < item_right && right > item.x && top < item_bottom && bottom > item.y {
            return true;
        }
    }
    false
}
