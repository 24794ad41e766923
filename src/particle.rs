//! Per-particle state and particle store initialization.

use std::f32::consts::TAU;

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::settings::{Settings, StartingPosition};

/// Number of lanes in one compute workgroup.
///
/// Particle buffers are padded to a multiple of this.
pub const WORKGROUP_SIZE: u32 = 60;

/// Sentinel for "no collision partner" and "empty cell".
pub const NO_INDEX: i32 = -1;

/// Round a requested particle count up to a whole number of workgroups.
///
/// ```
/// use sparkfield::particle::padded_particle_count;
///
/// assert_eq!(padded_particle_count(65, 60), 120);
/// assert_eq!(padded_particle_count(60, 60), 60);
/// ```
///
/// Counts too close to `u32::MAX` to round up are rounded down instead.
pub fn padded_particle_count(particle_count: u32, group_width: u32) -> u32 {
    if group_width == 0 {
        return particle_count;
    }
    particle_count
        .div_ceil(group_width)
        .checked_mul(group_width)
        .unwrap_or(u32::MAX / group_width * group_width)
}

/// Largest padded slot count whose particle buffer fits in one storage
/// binding of `max_binding_bytes`.
pub fn slot_capacity(max_binding_bytes: u64, group_width: u32) -> u32 {
    let slots = max_binding_bytes / std::mem::size_of::<GpuParticle>() as u64;
    let slots = slots.min(u32::MAX as u64) as u32;
    if group_width == 0 {
        slots
    } else {
        slots / group_width * group_width
    }
}

/// GPU layout of one particle. Mirrors `struct Particle` in [`PARTICLE_WGSL`].
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct GpuParticle {
    /// Position in canvas pixels, origin bottom-left.
    pub next_pos: [f32; 2],
    /// Velocity in pixels per second.
    pub next_vel: [f32; 2],
    pub mass: f32,
    /// Last collision partner, or [`NO_INDEX`].
    pub collision_other_index: i32,
    /// Owning grid cell; rewritten by the grid-build stage every frame.
    pub cell_index_start: [i32; 2],
    /// Scan order of the neighbor columns, a permutation of `{-1, 0, 1}`.
    pub cells_offsets_x: [i32; 3],
    /// Scan order of the neighbor rows, a permutation of `{-1, 0, 1}`.
    pub cells_offsets_y: [i32; 3],
    /// Heat gained from collisions; drives color.
    pub temperature: f32,
    pub _padding: f32,
}

impl GpuParticle {
    /// A resting particle of unit mass at `position`, scanning neighbors in
    /// natural order.
    pub fn at(position: [f32; 2]) -> Self {
        Self {
            next_pos: position,
            next_vel: [0.0; 2],
            mass: 1.0,
            collision_other_index: NO_INDEX,
            cell_index_start: [0; 2],
            cells_offsets_x: [-1, 0, 1],
            cells_offsets_y: [-1, 0, 1],
            temperature: 0.0,
            _padding: 0.0,
        }
    }
}

pub const PARTICLE_WGSL: &str = r#"
struct Particle {
    nextPos: vec2<f32>,
    nextVel: vec2<f32>,
    mass: f32,
    collisionOtherIndex: i32,
    cellIndexStart: vec2<i32>,
    cellsOffsetsX: array<i32, 3>,
    cellsOffsetsY: array<i32, 3>,
    temperature: f32,
    _padding: f32,
};
"#;

/// A fresh permutation of `{-1, 0, 1}`.
pub fn shuffled_offsets<R: Rng + ?Sized>(rng: &mut R) -> [i32; 3] {
    let mut offsets = [-1, 0, 1];
    offsets.shuffle(rng);
    offsets
}

/// Ordered, finite mass bounds. Non-finite bounds fall back to the defaults.
fn mass_range(settings: &Settings) -> (f32, f32) {
    let defaults = Settings::default();
    let finite_or = |value: f32, fallback: f32| if value.is_finite() { value } else { fallback };
    let a = finite_or(settings.min_mass, defaults.min_mass);
    let b = finite_or(settings.max_mass, defaults.max_mass);
    (a.min(b), a.max(b))
}

/// Build the initial contents of a particle buffer with `slots` entries.
///
/// Every slot is populated, padding slots included, so the buffer never holds
/// uninitialized data.
pub fn init_particles<R: Rng + ?Sized>(
    settings: &Settings,
    canvas_size: Vec2,
    slots: u32,
    rng: &mut R,
) -> Vec<GpuParticle> {
    let (min_mass, max_mass) = mass_range(settings);

    (0..slots)
        .map(|_| {
            let angle = rng.gen::<f32>() * TAU;

            let position = match settings.starting_position {
                StartingPosition::Random => Vec2::new(
                    rng.gen::<f32>() * canvas_size.x,
                    rng.gen::<f32>() * canvas_size.y,
                ),
                StartingPosition::Ring => canvas_size * 0.5,
            };

            // Overwritten by the first grid build.
            let cell_index_start = [rng.gen_range(0..3), rng.gen_range(0..3)];

            let t = rng.gen::<f32>();
            let mass = ((1.0 - t) * min_mass + t * max_mass).clamp(min_mass, max_mass);
            let velocity = Vec2::from_angle(angle) * settings.speed;

            GpuParticle {
                next_pos: position.to_array(),
                next_vel: velocity.to_array(),
                mass,
                collision_other_index: NO_INDEX,
                cell_index_start,
                cells_offsets_x: shuffled_offsets(rng),
                cells_offsets_y: shuffled_offsets(rng),
                temperature: 0.0,
                _padding: 0.0,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use std::mem::{offset_of, size_of};

    fn is_offset_permutation(offsets: [i32; 3]) -> bool {
        let mut sorted = offsets;
        sorted.sort();
        sorted == [-1, 0, 1]
    }

    #[test]
    fn test_layout_matches_wgsl() {
        assert_eq!(size_of::<GpuParticle>(), 64);
        assert_eq!(offset_of!(GpuParticle, next_vel), 8);
        assert_eq!(offset_of!(GpuParticle, mass), 16);
        assert_eq!(offset_of!(GpuParticle, collision_other_index), 20);
        assert_eq!(offset_of!(GpuParticle, cell_index_start), 24);
        assert_eq!(offset_of!(GpuParticle, cells_offsets_x), 32);
        assert_eq!(offset_of!(GpuParticle, cells_offsets_y), 44);
        assert_eq!(offset_of!(GpuParticle, temperature), 56);
    }

    #[test]
    fn test_padded_count() {
        assert_eq!(padded_particle_count(65, 60), 120);
        assert_eq!(padded_particle_count(60, 60), 60);
        assert_eq!(padded_particle_count(1, 60), 60);
        assert_eq!(padded_particle_count(0, 60), 0);
        assert_eq!(padded_particle_count(600060, WORKGROUP_SIZE), 600060);
    }

    #[test]
    fn test_mass_within_bounds() {
        let settings = Settings {
            min_mass: 2.0,
            max_mass: 7.5,
            ..Settings::default()
        };
        for seed in 0..16 {
            let mut rng = SmallRng::seed_from_u64(seed);
            for p in init_particles(&settings, Vec2::new(800.0, 600.0), 240, &mut rng) {
                assert!(p.mass >= 2.0 && p.mass <= 7.5, "mass {} out of range", p.mass);
            }
        }
    }

    #[test]
    fn test_padded_count_near_u32_max() {
        assert_eq!(padded_particle_count(u32::MAX, 60), u32::MAX / 60 * 60);
        assert_eq!(padded_particle_count(u32::MAX - 10, 60), u32::MAX / 60 * 60);
        assert_eq!(padded_particle_count(17, 0), 17);
    }

    #[test]
    fn test_slot_capacity() {
        // 128 MiB default binding limit, 64-byte particles
        assert_eq!(slot_capacity(128 << 20, 60), 2_097_120);
        assert_eq!(slot_capacity(64 * 59, 60), 0);
        assert_eq!(slot_capacity(u64::MAX, 60), u32::MAX / 60 * 60);
    }

    #[test]
    fn test_non_finite_mass_bounds_fall_back() {
        let settings = Settings::from_json_str(r#"{"minMass":1,"maxMass":1e39}"#).unwrap();
        assert!(settings.max_mass.is_infinite());
        let mut rng = SmallRng::seed_from_u64(5);
        for p in init_particles(&settings, Vec2::new(100.0, 100.0), 120, &mut rng) {
            assert!(p.mass.is_finite());
            assert!(p.mass >= 1.0 && p.mass <= Settings::default().max_mass);
        }

        let settings = Settings {
            min_mass: f32::NAN,
            max_mass: f32::NEG_INFINITY,
            ..Settings::default()
        };
        let defaults = Settings::default();
        for p in init_particles(&settings, Vec2::new(100.0, 100.0), 60, &mut rng) {
            assert!(p.mass >= defaults.min_mass && p.mass <= defaults.max_mass);
        }
    }

    #[test]
    fn test_widest_finite_mass_range() {
        let settings = Settings {
            min_mass: -3e38,
            max_mass: 3e38,
            ..Settings::default()
        };
        let mut rng = SmallRng::seed_from_u64(6);
        for p in init_particles(&settings, Vec2::new(100.0, 100.0), 240, &mut rng) {
            assert!(p.mass.is_finite());
            assert!(p.mass >= -3e38 && p.mass <= 3e38);
        }
    }

    #[test]
    fn test_equal_mass_bounds() {
        let settings = Settings {
            min_mass: 4.0,
            max_mass: 4.0,
            ..Settings::default()
        };
        let mut rng = SmallRng::seed_from_u64(8);
        for p in init_particles(&settings, Vec2::new(100.0, 100.0), 60, &mut rng) {
            assert_eq!(p.mass, 4.0);
        }
    }

    #[test]
    fn test_inverted_mass_range_is_tolerated() {
        let settings = Settings {
            min_mass: 9.0,
            max_mass: 3.0,
            ..Settings::default()
        };
        let mut rng = SmallRng::seed_from_u64(1);
        for p in init_particles(&settings, Vec2::new(100.0, 100.0), 60, &mut rng) {
            assert!(p.mass >= 3.0 && p.mass <= 9.0);
        }
    }

    #[test]
    fn test_offsets_are_permutations() {
        let mut rng = SmallRng::seed_from_u64(7);
        let particles = init_particles(&Settings::default(), Vec2::new(640.0, 480.0), 600, &mut rng);
        for p in &particles {
            assert!(is_offset_permutation(p.cells_offsets_x));
            assert!(is_offset_permutation(p.cells_offsets_y));
        }
        // shuffling actually happens
        assert!(particles.iter().any(|p| p.cells_offsets_x != [-1, 0, 1]));
    }

    #[test]
    fn test_seeded_init_is_reproducible() {
        let settings = Settings::default();
        let canvas = Vec2::new(1280.0, 720.0);
        let a = init_particles(&settings, canvas, 120, &mut SmallRng::seed_from_u64(42));
        let b = init_particles(&settings, canvas, 120, &mut SmallRng::seed_from_u64(42));
        let c = init_particles(&settings, canvas, 120, &mut SmallRng::seed_from_u64(43));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_random_positions_inside_canvas() {
        let mut rng = SmallRng::seed_from_u64(3);
        for p in init_particles(&Settings::default(), Vec2::new(320.0, 200.0), 600, &mut rng) {
            assert!(p.next_pos[0] >= 0.0 && p.next_pos[0] <= 320.0);
            assert!(p.next_pos[1] >= 0.0 && p.next_pos[1] <= 200.0);
            assert_eq!(p.collision_other_index, NO_INDEX);
            assert_eq!(p.temperature, 0.0);
            assert!((0..3).contains(&p.cell_index_start[0]));
            assert!((0..3).contains(&p.cell_index_start[1]));
        }
    }

    #[test]
    fn test_ring_starts_at_center_with_configured_speed() {
        let settings = Settings {
            starting_position: StartingPosition::Ring,
            speed: 300.0,
            ..Settings::default()
        };
        let mut rng = SmallRng::seed_from_u64(11);
        for p in init_particles(&settings, Vec2::new(800.0, 600.0), 60, &mut rng) {
            assert_eq!(p.next_pos, [400.0, 300.0]);
            let speed = Vec2::from(p.next_vel).length();
            assert!((speed - 300.0).abs() < 1e-2, "speed {}", speed);
        }
    }
}
