//! Uniform records shared between host and shaders.
//!
//! Each record is written to its GPU buffer whole; no field is ever patched
//! in place. The layouts follow WGSL uniform rules (vec2 aligned to 8,
//! vec3 to 16, struct size rounded to 16) with explicit padding fields.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::grid::GridShape;
use crate::settings::Settings;

/// Canvas and grid metadata. Rewritten when the particle count, particle
/// size or canvas changes.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GlobalUniforms {
    pub canvas_size: [f32; 2],
    pub particle_size: f32,
    /// Requested particle count; slots at or above it are padding.
    pub particle_count: u32,
    pub grid_cell_size: [f32; 2],
    pub grid_size: [i32; 2],
}

impl GlobalUniforms {
    pub fn new(settings: &Settings, canvas_size: Vec2, grid: &GridShape) -> Self {
        Self {
            canvas_size: canvas_size.to_array(),
            particle_size: settings.particle_size,
            particle_count: settings.particle_count,
            grid_cell_size: grid.cell_size,
            grid_size: [grid.size[0] as i32, grid.size[1] as i32],
        }
    }
}

/// Per-frame values. Rewritten every step.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct SimulationUniforms {
    pub delta_time: f32,
    pub _pad0: f32,
    /// Pointer position in canvas pixels.
    pub attractor_pos: [f32; 2],
    pub is_attractor_enabled: u32,
    pub current_frame: u32,
    pub _pad1: [u32; 2],
}

impl SimulationUniforms {
    pub fn new(delta_time: f32, pointer: Vec2, pointer_held: bool, frame: u32) -> Self {
        Self {
            delta_time,
            attractor_pos: pointer.to_array(),
            is_attractor_enabled: pointer_held as u32,
            current_frame: frame,
            ..Self::default()
        }
    }
}

/// Physics constants. Rewritten when one of them is changed.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct StaticSimulationUniforms {
    pub temp_on_hit: f32,
    pub cooldown_rate: f32,
    pub attractor_mass: f32,
    /// Coefficient of restitution.
    pub restitution: f32,
    pub max_collisions_per_frame: u32,
    pub _pad: [u32; 3],
}

impl StaticSimulationUniforms {
    pub fn new(settings: &Settings) -> Self {
        Self {
            temp_on_hit: settings.temp_on_hit,
            cooldown_rate: settings.cooldown_rate,
            attractor_mass: settings.attractor_mass,
            restitution: settings.restitution,
            max_collisions_per_frame: settings.max_collisions_per_frame,
            _pad: [0; 3],
        }
    }
}

/// Colors blended by particle heat.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct RenderUniforms {
    pub color1: [f32; 3],
    pub _pad0: f32,
    pub color2: [f32; 3],
    pub _pad1: f32,
}

impl RenderUniforms {
    pub fn new(settings: &Settings) -> Self {
        Self {
            color1: settings.color1_rgb(),
            color2: settings.color2_rgb(),
            ..Self::default()
        }
    }
}

pub const UNIFORMS_WGSL: &str = r#"
struct GlobalUniforms {
    canvasSize: vec2<f32>,
    particleSize: f32,
    particleCount: u32,
    gridCellSizeInPixels: vec2<f32>,
    gridSize: vec2<i32>,
};

struct SimulationUniforms {
    deltaTime: f32,
    attractorPos: vec2<f32>,
    isAttractorEnabled: u32,
    currentFrame: u32,
};

struct StaticSimulationUniforms {
    tempOnHit: f32,
    cooldownRate: f32,
    attractorMass: f32,
    E: f32,
    maxColl: u32,
};

struct RenderUniforms {
    color1: vec3<f32>,
    color2: vec3<f32>,
};
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{offset_of, size_of};

    #[test]
    fn test_record_sizes() {
        assert_eq!(size_of::<GlobalUniforms>(), 32);
        assert_eq!(size_of::<SimulationUniforms>(), 32);
        assert_eq!(size_of::<StaticSimulationUniforms>(), 32);
        assert_eq!(size_of::<RenderUniforms>(), 32);
    }

    #[test]
    fn test_offsets_follow_wgsl_alignment() {
        assert_eq!(offset_of!(GlobalUniforms, particle_count), 12);
        assert_eq!(offset_of!(GlobalUniforms, grid_cell_size), 16);
        assert_eq!(offset_of!(GlobalUniforms, grid_size), 24);
        assert_eq!(offset_of!(SimulationUniforms, attractor_pos), 8);
        assert_eq!(offset_of!(SimulationUniforms, current_frame), 20);
        assert_eq!(offset_of!(StaticSimulationUniforms, max_collisions_per_frame), 16);
        assert_eq!(offset_of!(RenderUniforms, color2), 16);
    }

    #[test]
    fn test_global_from_grid() {
        let settings = Settings {
            particle_count: 65,
            particle_size: 2.0,
            ..Settings::default()
        };
        let grid = GridShape::new(120, 800, 600);
        let u = GlobalUniforms::new(&settings, Vec2::new(800.0, 600.0), &grid);
        assert_eq!(u.canvas_size, [800.0, 600.0]);
        assert_eq!(u.particle_count, 65);
        assert_eq!(u.grid_size, [12, 10]);
        assert_eq!(u.grid_cell_size, grid.cell_size);
    }

    #[test]
    fn test_simulation_flags() {
        let on = SimulationUniforms::new(0.016, Vec2::new(3.0, 4.0), true, 9);
        assert_eq!(on.is_attractor_enabled, 1);
        assert_eq!(on.current_frame, 9);
        assert_eq!(on.attractor_pos, [3.0, 4.0]);
        let off = SimulationUniforms::new(0.016, Vec2::ZERO, false, 10);
        assert_eq!(off.is_attractor_enabled, 0);
    }

    #[test]
    fn test_static_and_render_from_settings() {
        let settings = Settings::preset("JiggleZoom").unwrap();
        let s = StaticSimulationUniforms::new(&settings);
        assert_eq!(s.max_collisions_per_frame, 2);
        assert!((s.restitution - 0.6).abs() < 1e-6);

        let r = RenderUniforms::new(&settings);
        assert_eq!(r.color2, [0.0, 0.0, 0.0]);
        assert!((r.color1[1] - 179.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_records_serialize_whole() {
        let r = RenderUniforms::new(&Settings::default());
        assert_eq!(bytemuck::bytes_of(&r).len(), 32);
    }
}
