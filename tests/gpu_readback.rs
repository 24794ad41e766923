//! Headless GPU tests. Each test returns early when no adapter is available.

use rand::rngs::SmallRng;
use rand::SeedableRng;

use sparkfield::gpu::{request_headless_device, FrameInput, SimulationContext};
use sparkfield::particle::{padded_particle_count, NO_INDEX, WORKGROUP_SIZE};
use sparkfield::settings::{hex_to_rgb, SettingChange};
use sparkfield::{Direction, Settings, Vec2};

const CANVAS: [u32; 2] = [800, 600];
const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

fn context(settings: Settings, seed: u64) -> Option<SimulationContext> {
    let _ = env_logger::builder().is_test(true).try_init();
    match pollster::block_on(request_headless_device()) {
        Ok((device, queue)) => Some(SimulationContext::new(
            device,
            queue,
            TARGET_FORMAT,
            CANVAS,
            settings,
            SmallRng::seed_from_u64(seed),
        )),
        Err(e) => {
            log::warn!("skipping GPU test: {}", e);
            None
        }
    }
}

fn settings_with_count(particle_count: u32) -> Settings {
    Settings {
        particle_count,
        ..Settings::default()
    }
}

#[test]
fn test_gpu_grid_build_is_complete() {
    let Some(mut ctx) = context(settings_with_count(1200), 1) else {
        return;
    };
    ctx.build_grid();

    let particles = ctx.read_particles().unwrap();
    let lists = ctx.read_cell_lists().unwrap();
    assert_eq!(lists.verify_assigned(&particles, 1200, ctx.grid()), Ok(()));

    // cellIndexStart was overwritten with the cell of the position, give or
    // take float rounding at a cell boundary
    for p in &particles {
        let host = ctx.grid().cell_of(Vec2::from(p.next_pos));
        assert!((p.cell_index_start[0] - host[0]).abs() <= 1);
        assert!((p.cell_index_start[1] - host[1]).abs() <= 1);
    }
}

#[test]
fn test_gpu_grid_build_masks_padding() {
    let Some(mut ctx) = context(settings_with_count(65), 2) else {
        return;
    };
    assert_eq!(ctx.max_count(), 120);
    ctx.build_grid();

    let particles = ctx.read_particles().unwrap();
    let lists = ctx.read_cell_lists().unwrap();
    assert_eq!(lists.verify_assigned(&particles, 65, ctx.grid()), Ok(()));
    assert!(lists.lists[65..].iter().all(|&n| n == NO_INDEX));
}

#[test]
fn test_gpu_grid_rebuilt_after_steps() {
    let Some(mut ctx) = context(settings_with_count(600), 3) else {
        return;
    };
    let input = FrameInput {
        delta_time: 1.0 / 60.0,
        ..FrameInput::default()
    };
    for _ in 0..5 {
        ctx.step(&input, None);
    }
    ctx.build_grid();

    let particles = ctx.read_particles().unwrap();
    let lists = ctx.read_cell_lists().unwrap();
    assert_eq!(lists.verify_assigned(&particles, 600, ctx.grid()), Ok(()));
    assert_eq!(ctx.frame(), 5);

    for p in &particles[..600] {
        assert!(p.next_pos[0] >= 0.0 && p.next_pos[0] <= CANVAS[0] as f32);
        assert!(p.next_pos[1] >= 0.0 && p.next_pos[1] <= CANVAS[1] as f32);
        assert!(p.temperature >= 0.0);
    }
}

#[test]
fn test_render_instance_count_is_padded() {
    for count in [1, 59, 60, 61, 6000] {
        let Some(ctx) = context(settings_with_count(count), 4) else {
            return;
        };
        assert_eq!(
            ctx.render_instance_count(),
            padded_particle_count(count, WORKGROUP_SIZE)
        );
    }
}

#[test]
fn test_settings_reactions() {
    let Some(mut ctx) = context(settings_with_count(120), 5) else {
        return;
    };

    let changed = ctx.update_settings([SettingChange::ParticleCount(300)]);
    assert_eq!(changed.reactions().len(), 1);
    assert_eq!(ctx.max_count(), 300);
    assert_eq!(ctx.global_uniforms().particle_count, 300);
    assert_eq!(ctx.grid().cell_count(), 300);

    let changed = ctx.update_settings([SettingChange::ParticleSize(3.0)]);
    assert!(!changed.is_empty());
    assert_eq!(ctx.global_uniforms().particle_size, 3.0);
    assert_eq!(ctx.max_count(), 300);

    // unchanged value: nothing to do
    let changed = ctx.update_settings([SettingChange::ParticleSize(3.0)]);
    assert!(changed.is_empty());

    ctx.update_settings([SettingChange::Color1("#ff0000".into())]);
    assert_eq!(ctx.settings().color1_rgb(), hex_to_rgb("#ff0000"));
}

#[test]
fn test_attractor_buffer_rebuilt() {
    let Some(mut ctx) = context(settings_with_count(60), 6) else {
        return;
    };
    assert_eq!(ctx.bound_attractor_count(), 1);

    ctx.add_attractor(Vec2::new(10.0, 20.0), Direction::Attract);
    ctx.add_attractor(Vec2::new(30.0, 40.0), Direction::Repel);
    assert_eq!(ctx.bound_attractor_count(), 3);
    assert_eq!(
        ctx.attractors().to_arrays(),
        vec![[0.0, 0.0, 0.0], [10.0, 20.0, 1.0], [30.0, 40.0, -1.0]]
    );

    ctx.clear_attractors();
    assert_eq!(ctx.bound_attractor_count(), 1);
    assert_eq!(ctx.attractors().to_arrays(), vec![[0.0, 0.0, 0.0]]);
}

#[test]
fn test_render_to_offscreen_target() {
    let Some(mut ctx) = context(settings_with_count(60), 7) else {
        return;
    };
    let texture = ctx.device().create_texture(&wgpu::TextureDescriptor {
        label: Some("Offscreen Target"),
        size: wgpu::Extent3d {
            width: CANVAS[0],
            height: CANVAS[1],
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: TARGET_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    let input = FrameInput {
        delta_time: 1.0 / 60.0,
        pointer: Vec2::new(400.0, 300.0),
        pointer_held: true,
    };
    ctx.step(&input, Some(&view));
    ctx.step(&input, Some(&view));
    assert_eq!(ctx.frame(), 2);

    // a readback forces the queue to drain
    assert_eq!(ctx.read_particles().unwrap().len(), 60);
}

#[test]
fn test_zero_particles_is_a_noop() {
    let Some(mut ctx) = context(settings_with_count(0), 8) else {
        return;
    };
    assert_eq!(ctx.max_count(), 0);
    assert_eq!(ctx.grid().size, [1, 1]);
    ctx.step(&FrameInput::default(), None);
    assert!(ctx.read_particles().unwrap().is_empty());
}
