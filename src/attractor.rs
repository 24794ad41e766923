//! Point attractors.
//!
//! The registry always holds at least one entry: index 0 is an inert
//! sentinel at the origin so the GPU-side array is never empty.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

/// Whether an attractor pulls, pushes, or does nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Repel,
    Inert,
    Attract,
}

impl Direction {
    pub fn sign(self) -> f32 {
        match self {
            Direction::Repel => -1.0,
            Direction::Inert => 0.0,
            Direction::Attract => 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Attractor {
    pub position: Vec2,
    pub direction: Direction,
}

impl Attractor {
    pub const SENTINEL: Attractor = Attractor {
        position: Vec2::ZERO,
        direction: Direction::Inert,
    };

    /// `[x, y, direction]`.
    pub fn to_array(self) -> [f32; 3] {
        [self.position.x, self.position.y, self.direction.sign()]
    }

    pub fn to_gpu(self) -> GpuAttractor {
        GpuAttractor {
            position: self.position.to_array(),
            direction: self.direction.sign(),
            _padding: 0.0,
        }
    }
}

/// GPU layout of one attractor. Mirrors `struct Attractor` in [`ATTRACTOR_WGSL`].
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct GpuAttractor {
    pub position: [f32; 2],
    pub direction: f32,
    pub _padding: f32,
}

pub const ATTRACTOR_WGSL: &str = r#"
struct Attractor {
    pos: vec2<f32>,
    direction: f32,
    _padding: f32,
};
"#;

/// The ordered list of attractors.
#[derive(Clone, Debug, PartialEq)]
pub struct AttractorRegistry {
    attractors: Vec<Attractor>,
}

impl Default for AttractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AttractorRegistry {
    /// A registry holding only the sentinel.
    pub fn new() -> Self {
        Self {
            attractors: vec![Attractor::SENTINEL],
        }
    }

    pub fn add(&mut self, position: Vec2, direction: Direction) {
        self.attractors.push(Attractor {
            position,
            direction,
        });
    }

    /// Drop everything but the sentinel.
    pub fn clear(&mut self) {
        self.attractors.truncate(1);
    }

    pub fn len(&self) -> usize {
        self.attractors.len()
    }

    /// Never true; the sentinel is always present.
    pub fn is_empty(&self) -> bool {
        self.attractors.is_empty()
    }

    pub fn as_slice(&self) -> &[Attractor] {
        &self.attractors
    }

    /// `[x, y, direction]` per entry, sentinel first.
    pub fn to_arrays(&self) -> Vec<[f32; 3]> {
        self.attractors.iter().map(|a| a.to_array()).collect()
    }

    /// Snapshot for upload; length equals [`len`](Self::len).
    pub fn to_gpu(&self) -> Vec<GpuAttractor> {
        self.attractors.iter().map(|a| a.to_gpu()).collect()
    }
}
