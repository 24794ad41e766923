//! The three compute pipelines and the sprite render pipeline.

use super::layouts::BindGroupLayouts;
use crate::shaders::{
    compute_shader_source, render_shader_source, BUILD_GRID_ENTRY, FRAGMENT_ENTRY,
    INTEGRATE_ENTRY, RESET_ENTRY, VERTEX_ENTRY,
};

/// Additive color and alpha, so overlapping sprites brighten.
pub const ADDITIVE_BLENDING: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
};

pub struct Pipelines {
    pub reset: wgpu::ComputePipeline,
    pub build_grid: wgpu::ComputePipeline,
    pub integrate: wgpu::ComputePipeline,
    pub render: wgpu::RenderPipeline,
}

impl Pipelines {
    pub fn new(
        device: &wgpu::Device,
        layouts: &BindGroupLayouts,
        target_format: wgpu::TextureFormat,
    ) -> Self {
        let compute_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Particle Compute Shader"),
            source: wgpu::ShaderSource::Wgsl(compute_shader_source().into()),
        });

        let compute_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Compute Pipeline Layout"),
            bind_group_layouts: &[&layouts.common, &layouts.compute, &layouts.simulation],
            push_constant_ranges: &[],
        });

        let compute_pipeline = |entry_point: &str| {
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(entry_point),
                layout: Some(&compute_layout),
                module: &compute_shader,
                entry_point: Some(entry_point),
                compilation_options: Default::default(),
                cache: None,
            })
        };

        let reset = compute_pipeline(RESET_ENTRY);
        let build_grid = compute_pipeline(BUILD_GRID_ENTRY);
        let integrate = compute_pipeline(INTEGRATE_ENTRY);

        let render_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Sprite Render Shader"),
            source: wgpu::ShaderSource::Wgsl(render_shader_source().into()),
        });

        let render_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Render Pipeline Layout"),
            bind_group_layouts: &[&layouts.common, &layouts.particle, &layouts.render],
            push_constant_ranges: &[],
        });

        let render = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Render Pipeline"),
            layout: Some(&render_layout),
            vertex: wgpu::VertexState {
                module: &render_shader,
                entry_point: Some(VERTEX_ENTRY),
                // Particles are read from storage, not vertex buffers.
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &render_shader,
                entry_point: Some(FRAGMENT_ENTRY),
                targets: &[Some(wgpu::ColorTargetState {
                    format: target_format,
                    blend: Some(ADDITIVE_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            reset,
            build_grid,
            integrate,
            render,
        }
    }
}
