use crate::types::Sheet;

const MAX_WIDTH: f64 = 80.0;
const MAX_HEIGHT: f64 = 40.0;

/// Draws a sheet layout as an ASCII grid, one box per placed item with the
/// part name centered inside when it fits.
pub fn render_sheet(sheet: &Sheet) -> String {
    let scale = f64::min(MAX_WIDTH / sheet.width, MAX_HEIGHT / sheet.height);
    let grid_w = (sheet.width * scale).round() as usize;
    let grid_h = (sheet.height * scale).round() as usize;

    if grid_w == 0 || grid_h == 0 {
        return String::new();
    }

    let mut grid = vec![vec![' '; grid_w + 1]; grid_h + 1];

    // Sheet border first, placements on top.
    draw_rect(&mut grid, 0, 0, grid_w, grid_h);

    for item in &sheet.items {
        let sx = (item.x * scale).round() as usize;
        let sy = (item.y * scale).round() as usize;
        let sw = (item.width * scale).round() as usize;
        let sh = (item.height * scale).round() as usize;

        if sw == 0 || sh == 0 {
            continue;
        }

        draw_rect(&mut grid, sx, sy, sw, sh);

        let label = format!("{} {:.0}x{:.0}", item.part, item.width, item.height);
        let label_chars: Vec<char> = label.chars().collect();

        if sw > 2 && sh > 0 {
            let cx = sx + sw / 2;
            let cy = sy + sh / 2;
            let half = label_chars.len() / 2;
            let start_x = cx.saturating_sub(half);

            for (i, &ch) in label_chars.iter().enumerate() {
                let x = start_x + i;
                if x > sx && x < sx + sw && cy > sy && cy < sy + sh {
                    grid[cy][x] = ch;
                }
            }
        }
    }

    let mut result = String::new();
    for row in &grid {
        let line: String = row.iter().collect();
        result.push_str(line.trim_end());
        result.push('\n');
    }
    result
}

#[allow(clippy::needless_range_loop)]
fn draw_rect(grid: &mut [Vec<char>], x: usize, y: usize, w: usize, h: usize) {
    let rows = grid.len();
    let cols = if rows > 0 { grid[0].len() } else { return };

    // Horizontal edges
    for i in x..=x + w {
        if i < cols {
            if y < rows {
                grid[y][i] = if grid[y][i] == '|' || grid[y][i] == '+' {
                    '+'
                } else {
                    '-'
                };
            }
            if y + h < rows {
                grid[y + h][i] = if grid[y + h][i] == '|' || grid[y + h][i] == '+' {
                    '+'
                } else {
                    '-'
                };
            }
        }
    }

    // Vertical edges
    for j in y..=y + h {
        if j < rows {
            if x < cols {
                grid[j][x] = if grid[j][x] == '-' || grid[j][x] == '+' {
                    '+'
                } else {
                    '|'
                };
            }
            if x + w < cols {
                grid[j][x + w] = if grid[j][x + w] == '-' || grid[j][x + w] == '+' {
                    '+'
                } else {
                    '|'
                };
            }
        }
    }

    // Corners
    for &cx in &[x, x + w] {
        for &cy in &[y, y + h] {
            if cy < rows && cx < cols {
                grid[cy][cx] = '+';
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PlacedItem;

    fn sheet_with(items: Vec<PlacedItem>) -> Sheet {
        Sheet {
            index: 0,
            width: 100.0,
            height: 100.0,
            items,
            free_rects: vec![],
        }
    }

    fn item(part: &str, x: f64, y: f64, width: f64, height: f64) -> PlacedItem {
        PlacedItem {
            part: part.to_string(),
            part_index: 0,
            x,
            y,
            width,
            height,
            rotation: 0,
            mirrored: false,
        }
    }

    #[test]
    fn test_render_single_item() {
        let sheet = sheet_with(vec![item("panel", 0.0, 0.0, 100.0, 100.0)]);
        let output = render_sheet(&sheet);
        assert!(output.contains('+'));
        assert!(output.contains('-'));
        assert!(output.contains('|'));
        assert!(output.contains("panel 100x100"));
    }

    #[test]
    fn test_render_two_items() {
        let sheet = sheet_with(vec![
            item("a", 0.0, 0.0, 50.0, 100.0),
            item("b", 50.0, 0.0, 50.0, 100.0),
        ]);
        let output = render_sheet(&sheet);
        assert!(output.contains("a 50x100"));
        assert!(output.contains("b 50x100"));
    }

    #[test]
    fn test_render_empty_sheet_has_border() {
        let sheet = sheet_with(vec![]);
        let output = render_sheet(&sheet);
        assert!(output.contains('+'));
    }
}
