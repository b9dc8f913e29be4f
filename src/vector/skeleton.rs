//! Zhang-Suen thinning to a one-pixel skeleton.

use image::{GrayImage, Luma};

/// Safety cap on thinning iterations. Convergence is normally on the order
/// of the maximum stroke half-width.
pub const MAX_THINNING_ITERATIONS: usize = 1000;

/// Thin an ink=255 mask to a one-pixel-wide skeleton, preserving
/// connectivity. Terminates when neither sub-iteration removes a pixel, or
/// at the safety cap.
pub fn zhang_suen(mask: &GrayImage) -> GrayImage {
    let width = mask.width() as usize;
    let height = mask.height() as usize;
    let mut grid: Vec<bool> = mask.pixels().map(|p| p.0[0] == 255).collect();

    let at = |grid: &[bool], x: i64, y: i64| -> bool {
        if x < 0 || y < 0 || x >= width as i64 || y >= height as i64 {
            return false;
        }
        grid[y as usize * width + x as usize]
    };

    let mut to_remove: Vec<usize> = Vec::new();
    let mut iterations = 0usize;
    for _ in 0..MAX_THINNING_ITERATIONS {
        let mut changed = false;

        for sub in 0..2 {
            to_remove.clear();
            for y in 0..height as i64 {
                for x in 0..width as i64 {
                    if !at(&grid, x, y) {
                        continue;
                    }
                    // Neighbors in the fixed traversal order P2..P9:
                    // N, NE, E, SE, S, SW, W, NW.
                    let p = [
                        at(&grid, x, y - 1),
                        at(&grid, x + 1, y - 1),
                        at(&grid, x + 1, y),
                        at(&grid, x + 1, y + 1),
                        at(&grid, x, y + 1),
                        at(&grid, x - 1, y + 1),
                        at(&grid, x - 1, y),
                        at(&grid, x - 1, y - 1),
                    ];

                    let neighbor_count = p.iter().filter(|&&v| v).count();
                    if !(2..=6).contains(&neighbor_count) {
                        continue;
                    }

                    let transitions = (0..8)
                        .filter(|&i| !p[i] && p[(i + 1) % 8])
                        .count();
                    if transitions != 1 {
                        continue;
                    }

                    let (p2, p4, p6, p8) = (p[0], p[2], p[4], p[6]);
                    let ok = if sub == 0 {
                        !(p2 && p4 && p6) && !(p4 && p6 && p8)
                    } else {
                        !(p2 && p4 && p8) && !(p2 && p6 && p8)
                    };
                    if ok {
                        to_remove.push(y as usize * width + x as usize);
                    }
                }
            }

            if !to_remove.is_empty() {
                changed = true;
                for &idx in &to_remove {
                    grid[idx] = false;
                }
            }
        }

        iterations += 1;
        if !changed {
            break;
        }
    }
    tracing::debug!(iterations, "thinning converged");

    let mut out = GrayImage::new(mask.width(), mask.height());
    for (pixel, &on) in out.pixels_mut().zip(grid.iter()) {
        *pixel = Luma([if on { 255 } else { 0 }]);
    }
    out
}
