//! GPU side of the simulation.
//!
//! [`SimulationContext`] owns every GPU handle: device, queue, pipelines, the
//! particle store, uniform buffers, the attractor buffer and the sprite. All
//! reconfiguration goes through it and replaces its fields wholesale.

mod attractor_binding;
mod layouts;
mod particle_store;
mod pipelines;
mod readback;
mod sprite_binding;
mod uniform_buffers;

use glam::Vec2;
use rand::rngs::SmallRng;

pub use attractor_binding::AttractorBinding;
pub use layouts::BindGroupLayouts;
pub use particle_store::ParticleStore;
pub use pipelines::{Pipelines, ADDITIVE_BLENDING};
pub use readback::read_buffer;
pub use sprite_binding::SpriteBinding;
pub use uniform_buffers::UniformManager;

use crate::attractor::{AttractorRegistry, Direction};
use crate::error::GpuError;
use crate::grid::GridShape;
use crate::particle::{
    init_particles, padded_particle_count, slot_capacity, GpuParticle, WORKGROUP_SIZE,
};
use crate::settings::{ChangeSet, Reaction, SettingChange, Settings};
use crate::shaders::QUAD_VERTICES;
use crate::spatial::CellLists;
use crate::sprite::SpriteTexture;
use crate::uniforms::{GlobalUniforms, RenderUniforms, SimulationUniforms, StaticSimulationUniforms};

/// Create an instance on the primary backends.
pub fn create_instance() -> wgpu::Instance {
    wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::PRIMARY,
        ..Default::default()
    })
}

/// Request a device with default limits and log uncaptured errors.
pub async fn request_device(
    adapter: &wgpu::Adapter,
) -> Result<(wgpu::Device, wgpu::Queue), GpuError> {
    log::info!("Using GPU: {:?}", adapter.get_info());

    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                memory_hints: wgpu::MemoryHints::Performance,
            },
            None,
        )
        .await?;

    device.on_uncaptured_error(Box::new(|error| {
        log::error!("GPU uncaptured error: {:?}", error);
    }));

    Ok((device, queue))
}

/// A device without a surface, for tests and offline runs.
pub async fn request_headless_device() -> Result<(wgpu::Device, wgpu::Queue), GpuError> {
    let instance = create_instance();
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await
        .ok_or(GpuError::NoAdapter)?;
    request_device(&adapter).await
}

/// Per-frame inputs to [`SimulationContext::step`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameInput {
    /// Seconds since the previous step.
    pub delta_time: f32,
    /// Pointer in canvas pixels, origin bottom-left.
    pub pointer: Vec2,
    /// Whether the pointer acts as a live attractor.
    pub pointer_held: bool,
}

pub struct SimulationContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
    canvas_size: [u32; 2],
    settings: Settings,
    rng: SmallRng,
    layouts: BindGroupLayouts,
    pipelines: Pipelines,
    uniforms: UniformManager,
    store: ParticleStore,
    registry: AttractorRegistry,
    attractors: AttractorBinding,
    sprite: SpriteBinding,
    frame: u32,
}

impl SimulationContext {
    /// Build every GPU resource and populate the particle store.
    ///
    /// `target_format` is the format of the views later passed to
    /// [`encode_render`](Self::encode_render). `rng` drives particle
    /// initialization and offset shuffling.
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        target_format: wgpu::TextureFormat,
        canvas_size: [u32; 2],
        settings: Settings,
        mut rng: SmallRng,
    ) -> Self {
        let layouts = BindGroupLayouts::new(&device);
        let pipelines = Pipelines::new(&device, &layouts, target_format);

        let (store, global) = build_store(&device, &layouts, &settings, canvas_size, &mut rng);

        let uniforms = UniformManager::new(
            &device,
            &layouts.common,
            global,
            StaticSimulationUniforms::new(&settings),
            RenderUniforms::new(&settings),
        );

        let registry = AttractorRegistry::new();
        let attractors = AttractorBinding::new(&device, &layouts.simulation, &uniforms, &registry);
        let sprite = SpriteBinding::new(
            &device,
            &queue,
            &layouts.render,
            &uniforms,
            &SpriteTexture::default(),
        );

        Self {
            device,
            queue,
            canvas_size,
            settings,
            rng,
            layouts,
            pipelines,
            uniforms,
            store,
            registry,
            attractors,
            sprite,
            frame: 0,
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn canvas_size(&self) -> [u32; 2] {
        self.canvas_size
    }

    pub fn grid(&self) -> &GridShape {
        &self.store.grid
    }

    /// Padded slot count (`PARTICLE_MAX_COUNT`).
    pub fn max_count(&self) -> u32 {
        self.store.max_count
    }

    pub fn attractors(&self) -> &AttractorRegistry {
        &self.registry
    }

    /// Entries in the attractor buffer currently bound.
    pub fn bound_attractor_count(&self) -> usize {
        self.attractors.len
    }

    pub fn global_uniforms(&self) -> &GlobalUniforms {
        self.uniforms.global()
    }

    /// Steps taken since construction.
    pub fn frame(&self) -> u32 {
        self.frame
    }

    /// Replace the particle sprite.
    pub fn set_sprite(&mut self, sprite: &SpriteTexture) {
        self.sprite = SpriteBinding::new(
            &self.device,
            &self.queue,
            &self.layouts.render,
            &self.uniforms,
            sprite,
        );
    }

    /// Discard the particle store and build a new one from the current
    /// settings. Also rewrites the global uniforms.
    pub fn reinitialize(&mut self) {
        let (store, global) = build_store(
            &self.device,
            &self.layouts,
            &self.settings,
            self.canvas_size,
            &mut self.rng,
        );
        self.store = store;
        self.uniforms.write_global(&self.queue, global);
    }

    /// Replace the particle store with exactly these particles, padded to
    /// whole workgroups. All of them are active; the particle count setting
    /// follows.
    pub fn load_particles(&mut self, particles: &[GpuParticle]) {
        let active = particles.len() as u32;
        let max_count = padded_particle_count(active, WORKGROUP_SIZE);
        let mut slots = particles.to_vec();
        slots.resize(max_count as usize, GpuParticle::at([0.0, 0.0]));

        let grid = GridShape::new(max_count, self.canvas_size[0], self.canvas_size[1]);
        log::debug!("loading {} particles into {} slots", active, max_count);
        self.store = ParticleStore::new(&self.device, &self.layouts, &slots, grid);
        self.settings.particle_count = active;
        self.update_global_uniforms();
    }

    /// Respawn all particles with the current settings.
    pub fn restart(&mut self) {
        self.reinitialize();
    }

    pub fn update_global_uniforms(&mut self) {
        let canvas = Vec2::new(self.canvas_size[0] as f32, self.canvas_size[1] as f32);
        let global = GlobalUniforms::new(&self.settings, canvas, &self.store.grid);
        self.uniforms.write_global(&self.queue, global);
    }

    /// Write the per-frame record and advance the frame counter.
    pub fn update_simulation_uniforms(&mut self, input: &FrameInput) {
        self.frame = self.frame.wrapping_add(1);
        self.uniforms.write_simulation(
            &self.queue,
            SimulationUniforms::new(input.delta_time, input.pointer, input.pointer_held, self.frame),
        );
    }

    pub fn update_static_simulation_uniforms(&mut self) {
        self.uniforms
            .write_static(&self.queue, StaticSimulationUniforms::new(&self.settings));
    }

    pub fn update_render_uniforms(&mut self) {
        self.uniforms
            .write_render(&self.queue, RenderUniforms::new(&self.settings));
    }

    /// Run exactly the recomputes the changed keys require.
    pub fn apply_settings(&mut self, changes: &ChangeSet) {
        for reaction in changes.reactions() {
            match reaction {
                Reaction::Reinitialize => self.reinitialize(),
                Reaction::GlobalUniforms => self.update_global_uniforms(),
                Reaction::StaticSimulationUniforms => self.update_static_simulation_uniforms(),
                Reaction::RenderUniforms => self.update_render_uniforms(),
                Reaction::None => {}
            }
        }
    }

    /// Apply a batch of setting changes and react to the ones that took.
    /// Returns the keys that actually changed.
    pub fn update_settings<I>(&mut self, changes: I) -> ChangeSet
    where
        I: IntoIterator<Item = SettingChange>,
    {
        let changed: ChangeSet = changes
            .into_iter()
            .filter_map(|change| self.settings.apply(change))
            .collect();
        self.apply_settings(&changed);
        changed
    }

    pub fn add_attractor(&mut self, position: Vec2, direction: Direction) {
        self.registry.add(position, direction);
        self.rebind_attractors();
    }

    pub fn clear_attractors(&mut self) {
        self.registry.clear();
        self.rebind_attractors();
    }

    fn rebind_attractors(&mut self) {
        self.attractors = AttractorBinding::new(
            &self.device,
            &self.layouts.simulation,
            &self.uniforms,
            &self.registry,
        );
    }

    /// Reset, grid-build and integrate, in that order, in one compute pass.
    pub fn encode_compute(&self, encoder: &mut wgpu::CommandEncoder) {
        self.encode_stages(encoder, true);
    }

    /// Reset and grid-build only. Leaves particles untouched.
    pub fn encode_grid_build(&self, encoder: &mut wgpu::CommandEncoder) {
        self.encode_stages(encoder, false);
    }

    fn encode_stages(&self, encoder: &mut wgpu::CommandEncoder, integrate: bool) {
        let particle_groups = self.store.particle_workgroups(WORKGROUP_SIZE);
        if particle_groups == 0 {
            return;
        }
        let cell_groups = self.store.cell_workgroups(WORKGROUP_SIZE);

        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("Simulation Pass"),
            timestamp_writes: None,
        });
        pass.set_bind_group(0, &self.uniforms.common_bind_group, &[]);
        pass.set_bind_group(1, &self.store.compute_bind_group, &[]);
        pass.set_bind_group(2, &self.attractors.simulation_bind_group, &[]);

        pass.set_pipeline(&self.pipelines.reset);
        pass.dispatch_workgroups(cell_groups, 1, 1);

        pass.set_pipeline(&self.pipelines.build_grid);
        pass.dispatch_workgroups(particle_groups, 1, 1);

        if integrate {
            pass.set_pipeline(&self.pipelines.integrate);
            pass.dispatch_workgroups(particle_groups, 1, 1);
        }
    }

    /// Instances issued per draw: every padded slot.
    pub fn render_instance_count(&self) -> u32 {
        self.store.max_count
    }

    /// Clear `target` to the background color and draw every slot.
    pub fn encode_render(&self, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView) {
        let [r, g, b] = self.settings.background_rgb();

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: r as f64,
                        g: g as f64,
                        b: b as f64,
                        a: 1.0,
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(&self.pipelines.render);
        pass.set_bind_group(0, &self.uniforms.common_bind_group, &[]);
        pass.set_bind_group(1, &self.store.render_bind_group, &[]);
        pass.set_bind_group(2, &self.sprite.render_bind_group, &[]);
        pass.draw(0..QUAD_VERTICES, 0..self.render_instance_count());
    }

    /// One frame: write the per-frame uniforms, encode the compute stages
    /// and (given a target) the render pass, and submit. Does not wait for
    /// the GPU.
    pub fn step(&mut self, input: &FrameInput, target: Option<&wgpu::TextureView>) {
        self.update_simulation_uniforms(input);

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Frame Encoder"),
        });
        self.encode_compute(&mut encoder);
        if let Some(view) = target {
            self.encode_render(&mut encoder, view);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    /// Submit only the reset and grid-build stages.
    pub fn build_grid(&mut self) {
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Grid Build Encoder"),
        });
        self.encode_grid_build(&mut encoder);
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    /// Every particle slot, padding included.
    pub fn read_particles(&self) -> Result<Vec<GpuParticle>, GpuError> {
        let mut particles: Vec<GpuParticle> =
            read_buffer(&self.device, &self.queue, &self.store.particles)?;
        particles.truncate(self.store.max_count as usize);
        Ok(particles)
    }

    /// Current `heads` and `lists` buffers.
    pub fn read_cell_lists(&self) -> Result<CellLists, GpuError> {
        let mut heads: Vec<i32> = read_buffer(&self.device, &self.queue, &self.store.heads)?;
        let mut lists: Vec<i32> = read_buffer(&self.device, &self.queue, &self.store.lists)?;
        heads.truncate(self.store.grid.cell_count() as usize);
        lists.truncate(self.store.max_count as usize);
        Ok(CellLists::from_buffers(heads, lists))
    }
}

fn build_store(
    device: &wgpu::Device,
    layouts: &BindGroupLayouts,
    settings: &Settings,
    canvas_size: [u32; 2],
    rng: &mut SmallRng,
) -> (ParticleStore, GlobalUniforms) {
    let requested = padded_particle_count(settings.particle_count, WORKGROUP_SIZE);
    let limits = device.limits();
    let capacity = slot_capacity(
        (limits.max_storage_buffer_binding_size as u64).min(limits.max_buffer_size),
        WORKGROUP_SIZE,
    );
    if requested > capacity {
        log::warn!(
            "{} particle slots exceed the device buffer limit, clamping to {}",
            requested,
            capacity
        );
    }
    let max_count = requested.min(capacity);
    let grid = GridShape::new(max_count, canvas_size[0], canvas_size[1]);
    let canvas = Vec2::new(canvas_size[0] as f32, canvas_size[1] as f32);

    log::info!(
        "initializing {} particle slots ({} requested), grid {}x{}, cell {:.1}x{:.1} px",
        max_count,
        settings.particle_count,
        grid.size[0],
        grid.size[1],
        grid.cell_size[0],
        grid.cell_size[1],
    );

    let particles = init_particles(settings, canvas, max_count, rng);
    let store = ParticleStore::new(device, layouts, &particles, grid);
    let global = GlobalUniforms::new(settings, canvas, &grid);
    (store, global)
}
