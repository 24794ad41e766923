//! Particle, head and list buffers plus the bind groups that reference them.
//!
//! The store is immutable once built. Changing the particle count or
//! restarting builds a new store and drops the old one.

use wgpu::util::DeviceExt;

use super::layouts::BindGroupLayouts;
use crate::grid::GridShape;
use crate::particle::{GpuParticle, NO_INDEX};

pub struct ParticleStore {
    pub particles: wgpu::Buffer,
    pub heads: wgpu::Buffer,
    pub lists: wgpu::Buffer,
    /// Group 1 of the compute stages.
    pub compute_bind_group: wgpu::BindGroup,
    /// Group 1 of the render pipeline.
    pub render_bind_group: wgpu::BindGroup,
    pub grid: GridShape,
    /// Padded slot count (`PARTICLE_MAX_COUNT`).
    pub max_count: u32,
}

fn storage_usage() -> wgpu::BufferUsages {
    wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::COPY_SRC
}

impl ParticleStore {
    /// Upload `particles` (every padded slot) and allocate an empty grid.
    ///
    /// Zero-slot stores still get one-element buffers since wgpu rejects
    /// empty bindings.
    pub fn new(
        device: &wgpu::Device,
        layouts: &BindGroupLayouts,
        particles: &[GpuParticle],
        grid: GridShape,
    ) -> Self {
        let max_count = particles.len() as u32;

        let contents: Vec<GpuParticle> = if particles.is_empty() {
            vec![GpuParticle::at([0.0, 0.0])]
        } else {
            particles.to_vec()
        };
        let particle_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Buffer"),
            contents: bytemuck::cast_slice(&contents),
            usage: storage_usage(),
        });

        let empty_heads = vec![NO_INDEX; (grid.cell_count() as usize).max(1)];
        let heads = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Heads Buffer"),
            contents: bytemuck::cast_slice(&empty_heads),
            usage: storage_usage(),
        });

        let empty_lists = vec![NO_INDEX; contents.len()];
        let lists = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Lists Buffer"),
            contents: bytemuck::cast_slice(&empty_lists),
            usage: storage_usage(),
        });

        let compute_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Particle Compute Bind Group"),
            layout: &layouts.compute,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: particle_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: heads.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: lists.as_entire_binding(),
                },
            ],
        });

        let render_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Particle Render Bind Group"),
            layout: &layouts.particle,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: particle_buffer.as_entire_binding(),
            }],
        });

        Self {
            particles: particle_buffer,
            heads,
            lists,
            compute_bind_group,
            render_bind_group,
            grid,
            max_count,
        }
    }

    /// Workgroups covering every particle slot.
    pub fn particle_workgroups(&self, group_width: u32) -> u32 {
        self.max_count.div_ceil(group_width)
    }

    /// Workgroups covering every grid cell.
    pub fn cell_workgroups(&self, group_width: u32) -> u32 {
        if self.max_count == 0 {
            return 0;
        }
        self.grid.cell_count().div_ceil(group_width)
    }
}
