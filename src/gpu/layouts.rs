//! Bind group layouts shared by the compute and render pipelines.
//!
//! | group | compute                         | render                          |
//! |-------|---------------------------------|---------------------------------|
//! | 0     | global uniforms                 | global uniforms                 |
//! | 1     | particles, heads, lists (rw)    | particles (read-only)           |
//! | 2     | sim, static sim, attractors     | sampler, sprite, render uniforms|

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn storage_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
    read_only: bool,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

pub struct BindGroupLayouts {
    /// Group 0 in every pipeline.
    pub common: wgpu::BindGroupLayout,
    /// Group 1 of the compute stages.
    pub compute: wgpu::BindGroupLayout,
    /// Group 2 of the compute stages.
    pub simulation: wgpu::BindGroupLayout,
    /// Group 1 of the render pipeline.
    pub particle: wgpu::BindGroupLayout,
    /// Group 2 of the render pipeline.
    pub render: wgpu::BindGroupLayout,
}

impl BindGroupLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let compute = wgpu::ShaderStages::COMPUTE;

        let common = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Common Bind Group Layout"),
            entries: &[uniform_entry(
                0,
                wgpu::ShaderStages::COMPUTE | wgpu::ShaderStages::VERTEX,
            )],
        });

        let compute_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Compute Bind Group Layout"),
            entries: &[
                storage_entry(0, compute, false),
                storage_entry(1, compute, false),
                storage_entry(2, compute, false),
            ],
        });

        let simulation = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Simulation Bind Group Layout"),
            entries: &[
                uniform_entry(0, compute),
                uniform_entry(1, compute),
                storage_entry(2, compute, true),
            ],
        });

        let particle = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Particle Bind Group Layout"),
            entries: &[storage_entry(0, wgpu::ShaderStages::VERTEX, true)],
        });

        let render = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Render Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                uniform_entry(2, wgpu::ShaderStages::VERTEX),
            ],
        });

        Self {
            common,
            compute: compute_layout,
            simulation,
            particle,
            render,
        }
    }
}
