//! Grid layout for attributes drawn as a block of several badges.
//!
//! Layout is computed on image sizes alone; the logos stage loads the images,
//! asks for placements and draws them. Offsets are relative to the layer's
//! `left`/`top` and grow in the direction of their sign, so a block anchored
//! with a negative offset extends back towards the anchor edge.

use crate::skin::{BlockSpec, Direction, Extent, Sizing};

/// Where one image of a block goes, relative to the layer offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Index into the (deduplicated) image list.
    pub index: usize,
    pub dx: i32,
    pub dy: i32,
    pub width: u32,
    pub height: u32,
}

/// Drops repeated filenames, keeping first occurrences, unless `clones` is set.
pub fn dedup_files(files: &[String], clones: bool) -> Vec<String> {
    if clones {
        return files.to_vec();
    }
    let mut unique: Vec<String> = Vec::with_capacity(files.len());
    for file in files {
        if !unique.contains(file) {
            unique.push(file.clone());
        }
    }
    unique
}

/// Column and row counts for `n` images.
///
/// With both counts at 0 the grid is `floor(sqrt n)` columns by
/// `floor(n / cols)` rows, which can leave images out (5 images give 2x2).
/// With one count at 0 it is derived as `ceil(n / other)`.
pub fn derive_grid(n: u32, cols: u32, rows: u32) -> (u32, u32) {
    let n = n.max(1);
    match (cols, rows) {
        (0, 0) => {
            let cols = n.isqrt();
            (cols, n / cols)
        }
        (0, rows) => (n.div_ceil(rows), rows),
        (cols, 0) => (cols, n.div_ceil(cols)),
        (cols, rows) => (cols, rows),
    }
}

/// Grid used to tile language flags: `ceil(sqrt n)` by `ceil(n / cols)`.
pub fn tile_grid(n: u32) -> (u32, u32) {
    let n = n.max(1);
    let root = n.isqrt();
    let cols = if root * root < n { root + 1 } else { root };
    (cols, n.div_ceil(cols))
}

/// Lays out images of the given native sizes.
///
/// `width`/`height` are the layer's extents: `Fixed` sets the base cell size,
/// `Equal` reuses the first image's size for every cell and `Auto` keeps each
/// image's own size. Static sizing divides the base size by the grid counts.
///
/// Cells grow away from the anchor edge for a zero or positive offset and
/// towards it for a negative one, so a block at offset 0 never runs off the
/// canvas.
pub fn layout_block(
    sizes: &[(u32, u32)],
    block: &BlockSpec,
    width: Extent,
    height: Extent,
    left: i32,
    top: i32,
) -> Vec<Placement> {
    let Some(&(first_w, first_h)) = sizes.first() else {
        return Vec::new();
    };
    let n = sizes.len() as u32;
    let static_size = block.sizing == Sizing::Static;
    let row_major = block.direction == Direction::RowMajor;

    let mut base_w = width.fixed().unwrap_or(first_w);
    let mut base_h = height.fixed().unwrap_or(first_h);
    let (cols, rows) = if n > 1 {
        derive_grid(n, block.cols, block.rows)
    } else {
        (1, 1)
    };
    if n > 1 && static_size {
        base_w /= cols;
        base_h /= rows;
    }

    let auto_x = !static_size && width == Extent::Auto;
    let auto_y = !static_size && height == Extent::Auto;
    let sx = if left >= 0 { 1 } else { -1 };
    let sy = if top >= 0 { 1 } else { -1 };

    let mut placements = vec![Placement {
        index: 0,
        dx: 0,
        dy: 0,
        width: base_w,
        height: base_h,
    }];

    let (mut col, mut row) = (0u32, 0u32);
    let mut off_x = if row_major { sx * base_w as i32 } else { 0 };
    let mut off_y = if row_major { 0 } else { sy * base_h as i32 };
    let mut max_w = base_w;
    let mut max_h = base_h;

    for (index, &(native_w, native_h)) in sizes.iter().enumerate().skip(1) {
        if row_major {
            col += 1;
            if col >= cols {
                col = 0;
                row += 1;
                if row >= rows {
                    break;
                }
            }
        } else {
            row += 1;
            if row >= rows {
                row = 0;
                col += 1;
                if col >= cols {
                    break;
                }
            }
        }

        let (w, dx) = if auto_x {
            if row_major {
                off_x = if col == 0 { 0 } else { off_x };
            } else if row == 0 {
                off_x += sx * max_w as i32;
            }
            (native_w, off_x)
        } else {
            (base_w, sx * (col * base_w) as i32 + sx * col as i32 * block.hmargin)
        };

        let (h, dy) = if auto_y {
            if row_major {
                if col == 0 {
                    off_y += sy * max_h as i32;
                }
            } else {
                off_y = if row == 0 { 0 } else { off_y };
            }
            (native_h, off_y)
        } else {
            (base_h, sy * (row * base_h) as i32 + sy * row as i32 * block.vmargin)
        };

        placements.push(Placement {
            index,
            dx,
            dy,
            width: w,
            height: h,
        });

        // Width accumulates along a row; height tracks the tallest image of the row.
        if auto_x {
            if row_major {
                off_x += sx * w as i32;
            } else {
                max_w = if max_w < w || row == 0 { w } else { max_w };
            }
        }
        if auto_y {
            if row_major {
                max_h = if max_h < h || col == 0 { h } else { max_h };
            } else {
                off_y += sy * h as i32;
            }
        }
    }

    placements
}
