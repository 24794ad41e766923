//! GPU buffers for the four uniform records.
//!
//! Each `write_*` call replaces the whole record; there is no field-level
//! update path.

use wgpu::util::DeviceExt;

use crate::uniforms::{
    GlobalUniforms, RenderUniforms, SimulationUniforms, StaticSimulationUniforms,
};

fn uniform_buffer<T: bytemuck::Pod>(device: &wgpu::Device, label: &str, value: &T) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::bytes_of(value),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

pub struct UniformManager {
    pub global: wgpu::Buffer,
    pub simulation: wgpu::Buffer,
    pub static_simulation: wgpu::Buffer,
    pub render: wgpu::Buffer,
    /// Bind group 0, shared by every pipeline.
    pub common_bind_group: wgpu::BindGroup,
    global_value: GlobalUniforms,
}

impl UniformManager {
    pub fn new(
        device: &wgpu::Device,
        common_layout: &wgpu::BindGroupLayout,
        global: GlobalUniforms,
        static_simulation: StaticSimulationUniforms,
        render: RenderUniforms,
    ) -> Self {
        let global_buffer = uniform_buffer(device, "Global Uniforms", &global);
        let simulation = uniform_buffer(device, "Simulation Uniforms", &SimulationUniforms::default());
        let static_simulation = uniform_buffer(device, "Static Simulation Uniforms", &static_simulation);
        let render = uniform_buffer(device, "Render Uniforms", &render);

        let common_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Common Bind Group"),
            layout: common_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: global_buffer.as_entire_binding(),
            }],
        });

        Self {
            global: global_buffer,
            simulation,
            static_simulation,
            render,
            common_bind_group,
            global_value: global,
        }
    }

    /// Last global record written.
    pub fn global(&self) -> &GlobalUniforms {
        &self.global_value
    }

    pub fn write_global(&mut self, queue: &wgpu::Queue, value: GlobalUniforms) {
        log::debug!("global uniforms: {:?}", value);
        queue.write_buffer(&self.global, 0, bytemuck::bytes_of(&value));
        self.global_value = value;
    }

    pub fn write_simulation(&self, queue: &wgpu::Queue, value: SimulationUniforms) {
        queue.write_buffer(&self.simulation, 0, bytemuck::bytes_of(&value));
    }

    pub fn write_static(&self, queue: &wgpu::Queue, value: StaticSimulationUniforms) {
        log::debug!("static simulation uniforms: {:?}", value);
        queue.write_buffer(&self.static_simulation, 0, bytemuck::bytes_of(&value));
    }

    pub fn write_render(&self, queue: &wgpu::Queue, value: RenderUniforms) {
        log::debug!("render uniforms: {:?}", value);
        queue.write_buffer(&self.render, 0, bytemuck::bytes_of(&value));
    }
}
