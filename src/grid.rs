//! Grid shape selection for the broad-phase index.
//!
//! The cell grid always partitions the padded particle count exactly: the
//! shape is a divisor pair `[gx, gy]` with `gx * gy == particle_count`, picked
//! so the grid's aspect ratio tracks the canvas aspect ratio. One particle per
//! cell on average keeps the 3x3 neighbor walk short.

use glam::Vec2;

/// Shape of the cell grid and the pixel size of one cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridShape {
    /// Number of cells along x and y.
    pub size: [u32; 2],
    /// Size of one cell in canvas pixels.
    pub cell_size: [f32; 2],
}

impl GridShape {
    /// Derive the grid for a padded particle count and a canvas size.
    pub fn new(particle_count: u32, canvas_width: u32, canvas_height: u32) -> Self {
        let size = grid_size(particle_count, canvas_width, canvas_height);
        Self {
            size,
            cell_size: [
                canvas_width as f32 / size[0] as f32,
                canvas_height as f32 / size[1] as f32,
            ],
        }
    }

    /// Total number of cells (`gx * gy`).
    pub fn cell_count(&self) -> u32 {
        self.size[0] * self.size[1]
    }

    /// Cell coordinate owning a canvas position, clamped to the grid.
    ///
    /// Mirrors `cell_of` in the compute shader.
    pub fn cell_of(&self, pos: Vec2) -> [i32; 2] {
        let max_x = self.size[0] as i32 - 1;
        let max_y = self.size[1] as i32 - 1;
        let cx = (pos.x / self.cell_size[0]).floor() as i32;
        let cy = (pos.y / self.cell_size[1]).floor() as i32;
        [cx.clamp(0, max_x), cy.clamp(0, max_y)]
    }

    /// Row-major index of a cell coordinate.
    pub fn cell_index(&self, cell: [i32; 2]) -> usize {
        cell[1] as usize * self.size[0] as usize + cell[0] as usize
    }
}

/// Pick a `[gx, gy]` divisor pair of `particle_count` whose aspect ratio best
/// matches the canvas.
///
/// The i-th smallest divisor is paired with the i-th largest, and the pair
/// whose `max/min` ratio is closest to the canvas `max/min` ratio wins. On an
/// exact tie the earlier pair is kept. The larger grid dimension follows the
/// longer canvas axis.
///
/// Counts of 0 or 1 give `[1, 1]`.
///
/// # Example
///
/// ```
/// use sparkfield::grid::grid_size;
///
/// assert_eq!(grid_size(24, 800, 600), [6, 4]);
/// assert_eq!(grid_size(24, 600, 800), [4, 6]);
/// ```
pub fn grid_size(particle_count: u32, canvas_width: u32, canvas_height: u32) -> [u32; 2] {
    if particle_count <= 1 {
        return [1, 1];
    }

    let canvas_ratio = aspect_ratio(canvas_width.max(1), canvas_height.max(1));
    let divisors = divisors(particle_count);
    let last = divisors.len() - 1;

    let mut best = (divisors[0], divisors[last]);
    let mut best_error = (aspect_ratio(best.0, best.1) - canvas_ratio).abs();

    for (i, &small) in divisors.iter().enumerate().skip(1) {
        let large = divisors[last - i];
        let error = (aspect_ratio(small, large) - canvas_ratio).abs();
        if error < best_error {
            best = (small, large);
            best_error = error;
        }
    }

    let (lo, hi) = (best.0.min(best.1), best.0.max(best.1));
    if canvas_width > canvas_height {
        [hi, lo]
    } else {
        [lo, hi]
    }
}

/// All positive divisors of `n`, ascending.
pub fn divisors(n: u32) -> Vec<u32> {
    let mut low = Vec::new();
    let mut high = Vec::new();
    let mut i = 1u32;
    while (i as u64) * (i as u64) <= n as u64 {
        if n % i == 0 {
            low.push(i);
            if i != n / i {
                high.push(n / i);
            }
        }
        i += 1;
    }
    low.extend(high.into_iter().rev());
    low
}

fn aspect_ratio(a: u32, b: u32) -> f64 {
    a.max(b) as f64 / a.min(b) as f64
}
