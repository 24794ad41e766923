//! Attractor buffer and the simulation bind group (group 2 of the compute
//! stages) that references it.

use wgpu::util::DeviceExt;

use super::uniform_buffers::UniformManager;
use crate::attractor::AttractorRegistry;

pub struct AttractorBinding {
    pub buffer: wgpu::Buffer,
    pub simulation_bind_group: wgpu::BindGroup,
    /// Entries in the buffer, sentinel included.
    pub len: usize,
}

impl AttractorBinding {
    /// Snapshot the registry into a fresh buffer and bind group.
    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        uniforms: &UniformManager,
        registry: &AttractorRegistry,
    ) -> Self {
        let snapshot = registry.to_gpu();
        log::debug!("rebuilding attractor buffer with {} entries", snapshot.len());

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Attractor Buffer"),
            contents: bytemuck::cast_slice(&snapshot),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        });

        let simulation_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Simulation Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniforms.simulation.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: uniforms.static_simulation.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: buffer.as_entire_binding(),
                },
            ],
        });

        Self {
            buffer,
            simulation_bind_group,
            len: snapshot.len(),
        }
    }
}
