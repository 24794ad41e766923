//! Host-side model of the per-cell linked lists built on the GPU.
//!
//! The GPU builds the index with one atomic exchange per particle, so the
//! order inside a chain depends on scheduling. [`CellLists`] builds the same
//! structure sequentially and can check any pair of `heads`/`lists` buffers
//! (for example a GPU readback) for completeness.

use std::fmt;

use glam::Vec2;

use crate::grid::GridShape;
use crate::particle::{GpuParticle, NO_INDEX};

/// Cell heads plus per-particle next pointers, as laid out in GPU memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellLists {
    /// First particle in each cell, or [`NO_INDEX`].
    pub heads: Vec<i32>,
    /// Next particle in the same cell, or [`NO_INDEX`].
    pub lists: Vec<i32>,
}

/// Why a `heads`/`lists` pair is not a valid index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListDefect {
    /// A pointer is outside the particle range.
    OutOfRange { cell: usize, value: i32 },
    /// A particle is reachable more than once (duplicate or cycle).
    Revisited { index: usize },
    /// An active particle is reachable from no cell.
    Missing { index: usize },
    /// A particle sits in a cell other than the one its position maps to.
    WrongCell { index: usize, expected: usize, found: usize },
}

impl fmt::Display for ListDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListDefect::OutOfRange { cell, value } => {
                write!(f, "cell {} chain points outside the particle range ({})", cell, value)
            }
            ListDefect::Revisited { index } => write!(f, "particle {} reached twice", index),
            ListDefect::Missing { index } => write!(f, "particle {} is in no cell", index),
            ListDefect::WrongCell { index, expected, found } => write!(
                f,
                "particle {} found in cell {} but belongs to cell {}",
                index, found, expected
            ),
        }
    }
}

impl std::error::Error for ListDefect {}

impl CellLists {
    /// Reset every head to empty, then insert the first `active_count`
    /// particles at the head of their cell.
    pub fn build(particles: &[GpuParticle], active_count: usize, grid: &GridShape) -> Self {
        let mut heads = vec![NO_INDEX; grid.cell_count() as usize];
        let mut lists = vec![NO_INDEX; particles.len()];

        for (index, particle) in particles.iter().enumerate().take(active_count) {
            let cell = grid.cell_index(grid.cell_of(Vec2::from(particle.next_pos)));
            lists[index] = heads[cell];
            heads[cell] = index as i32;
        }

        Self { heads, lists }
    }

    pub fn from_buffers(heads: Vec<i32>, lists: Vec<i32>) -> Self {
        Self { heads, lists }
    }

    /// Particle indices in one cell, head first.
    pub fn cell(&self, cell: usize) -> CellIter<'_> {
        CellIter {
            lists: &self.lists,
            current: self.heads.get(cell).copied().unwrap_or(NO_INDEX),
            remaining: self.lists.len(),
        }
    }

    /// Candidates around `center`, scanning the 3x3 window in the given
    /// column and row order and skipping cells off the grid.
    pub fn neighborhood(
        &self,
        grid: &GridShape,
        center: [i32; 2],
        offsets_x: [i32; 3],
        offsets_y: [i32; 3],
    ) -> Vec<usize> {
        let mut out = Vec::new();
        for dx in offsets_x {
            for dy in offsets_y {
                let cell = [center[0] + dx, center[1] + dy];
                if cell[0] < 0
                    || cell[1] < 0
                    || cell[0] >= grid.size[0] as i32
                    || cell[1] >= grid.size[1] as i32
                {
                    continue;
                }
                out.extend(self.cell(grid.cell_index(cell)));
            }
        }
        out
    }

    /// Check that walking every chain visits each of the first
    /// `active_count` particles exactly once, in the cell its position maps
    /// to, and nothing else.
    pub fn verify(
        &self,
        particles: &[GpuParticle],
        active_count: usize,
        grid: &GridShape,
    ) -> Result<(), ListDefect> {
        self.verify_by(active_count, |index| {
            grid.cell_index(grid.cell_of(Vec2::from(particles[index].next_pos)))
        })
    }

    /// Like [`verify`](Self::verify), but trusts each particle's
    /// `cell_index_start` instead of recomputing the cell from its position.
    /// Meant for GPU readbacks, whose float division can round a boundary
    /// position into the neighboring cell.
    pub fn verify_assigned(
        &self,
        particles: &[GpuParticle],
        active_count: usize,
        grid: &GridShape,
    ) -> Result<(), ListDefect> {
        self.verify_by(active_count, |index| {
            let [x, y] = particles[index].cell_index_start;
            if x < 0 || y < 0 || x >= grid.size[0] as i32 || y >= grid.size[1] as i32 {
                usize::MAX
            } else {
                grid.cell_index([x, y])
            }
        })
    }

    fn verify_by<F>(&self, active_count: usize, expected_cell: F) -> Result<(), ListDefect>
    where
        F: Fn(usize) -> usize,
    {
        let mut seen = vec![false; self.lists.len()];

        for (cell, &head) in self.heads.iter().enumerate() {
            let mut current = head;
            while current != NO_INDEX {
                if current < 0 || current as usize >= self.lists.len() {
                    return Err(ListDefect::OutOfRange { cell, value: current });
                }
                let index = current as usize;
                if seen[index] {
                    return Err(ListDefect::Revisited { index });
                }
                seen[index] = true;

                let expected = expected_cell(index);
                if expected != cell {
                    return Err(ListDefect::WrongCell {
                        index,
                        expected,
                        found: cell,
                    });
                }
                current = self.lists[index];
            }
        }

        for (index, &visited) in seen.iter().enumerate() {
            if index < active_count && !visited {
                return Err(ListDefect::Missing { index });
            }
            if index >= active_count && visited {
                return Err(ListDefect::Revisited { index });
            }
        }
        Ok(())
    }
}

/// Walks one cell's chain. Stops after `lists.len()` steps so a corrupted
/// buffer cannot loop forever.
pub struct CellIter<'a> {
    lists: &'a [i32],
    current: i32,
    remaining: usize,
}

impl Iterator for CellIter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.current < 0 || self.remaining == 0 {
            return None;
        }
        let index = self.current as usize;
        self.current = *self.lists.get(index)?;
        self.remaining -= 1;
        Some(index)
    }
}
