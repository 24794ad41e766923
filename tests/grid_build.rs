//! Completeness of the per-cell linked lists over many seeds and shapes.

use glam::Vec2;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use sparkfield::grid::GridShape;
use sparkfield::particle::{init_particles, padded_particle_count, WORKGROUP_SIZE};
use sparkfield::spatial::CellLists;
use sparkfield::{Settings, StartingPosition};

fn build(settings: &Settings, canvas: [u32; 2], seed: u64) -> (CellLists, Vec<sparkfield::GpuParticle>, GridShape, usize) {
    let max_count = padded_particle_count(settings.particle_count, WORKGROUP_SIZE);
    let grid = GridShape::new(max_count, canvas[0], canvas[1]);
    let size = Vec2::new(canvas[0] as f32, canvas[1] as f32);
    let particles = init_particles(settings, size, max_count, &mut SmallRng::seed_from_u64(seed));
    let active = settings.particle_count as usize;
    (CellLists::build(&particles, active, &grid), particles, grid, active)
}

#[test]
fn test_every_particle_listed_once() {
    for seed in 0..32 {
        let settings = Settings {
            particle_count: 600,
            ..Settings::default()
        };
        let (lists, particles, grid, active) = build(&settings, [800, 600], seed);
        assert_eq!(lists.verify(&particles, active, &grid), Ok(()), "seed {}", seed);

        let mut seen: Vec<usize> = (0..grid.cell_count() as usize)
            .flat_map(|cell| lists.cell(cell))
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..600).collect::<Vec<_>>(), "seed {}", seed);
    }
}

#[test]
fn test_padding_slots_never_listed() {
    for seed in 0..8 {
        let settings = Settings {
            particle_count: 65,
            ..Settings::default()
        };
        let (lists, particles, grid, active) = build(&settings, [1024, 768], seed);
        assert_eq!(particles.len(), 120);
        assert_eq!(lists.verify(&particles, active, &grid), Ok(()));
    }
}

#[test]
fn test_crowded_cell() {
    // Ring mode puts every particle in the center cell
    let settings = Settings {
        particle_count: 240,
        starting_position: StartingPosition::Ring,
        ..Settings::default()
    };
    let (lists, particles, grid, active) = build(&settings, [640, 480], 3);
    assert_eq!(lists.verify(&particles, active, &grid), Ok(()));

    let center = grid.cell_index(grid.cell_of(Vec2::new(320.0, 240.0)));
    assert_eq!(lists.cell(center).count(), 240);
    let others: usize = (0..grid.cell_count() as usize)
        .filter(|&c| c != center)
        .map(|c| lists.cell(c).count())
        .sum();
    assert_eq!(others, 0);
}

#[test]
fn test_odd_canvas_shapes() {
    for canvas in [[1, 1], [3000, 200], [200, 3000], [777, 555]] {
        let settings = Settings {
            particle_count: 180,
            ..Settings::default()
        };
        let (lists, particles, grid, active) = build(&settings, canvas, 11);
        assert_eq!(grid.cell_count(), 180);
        assert_eq!(lists.verify(&particles, active, &grid), Ok(()), "canvas {:?}", canvas);
    }
}

#[test]
fn test_zero_particles() {
    let settings = Settings {
        particle_count: 0,
        ..Settings::default()
    };
    let (lists, particles, grid, active) = build(&settings, [800, 600], 0);
    assert!(particles.is_empty());
    assert_eq!(grid.size, [1, 1]);
    assert_eq!(lists.heads, vec![-1]);
    assert_eq!(lists.verify(&particles, active, &grid), Ok(()));
}
