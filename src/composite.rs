use std::borrow::Cow;

use crate::surfaces::{Layer, SurfaceManager};

/// Blits the offscreen layer surfaces onto the swapchain, back behind the
/// page content (the overlay UI), front above it.
pub struct CompositeModule {
    sampler: wgpu::Sampler,
    bind_group_layout: wgpu::BindGroupLayout,
    back_bind_group: wgpu::BindGroup,
    front_bind_group: wgpu::BindGroup,
    pipeline: wgpu::RenderPipeline,
}

/// Page background behind everything.
pub const BACKGROUND: wgpu::Color = wgpu::Color {
    r: 0.012,
    g: 0.022,
    b: 0.045,
    a: 1.0,
};

impl CompositeModule {
    pub fn new(
        device: &wgpu::Device,
        swapchain_format: wgpu::TextureFormat,
        surfaces: &SurfaceManager,
    ) -> Self {
        let shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: None,
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!("composite.wgsl"))),
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("layer sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: None,
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("composite"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: None,
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader_module,
                entry_point: "vertex",
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader_module,
                entry_point: "fragment",
                targets: &[Some(wgpu::ColorTargetState {
                    format: swapchain_format,
                    // The layer targets end up premultiplied after rendering
                    // onto their transparent clear.
                    blend: Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        let (back_bind_group, front_bind_group) =
            create_bind_groups(device, &bind_group_layout, &sampler, surfaces);

        Self {
            sampler,
            bind_group_layout,
            back_bind_group,
            front_bind_group,
            pipeline,
        }
    }

    /// The layer texture views change on resize; the bind groups follow.
    pub fn rebuild(&mut self, device: &wgpu::Device, surfaces: &SurfaceManager) {
        let (back, front) =
            create_bind_groups(device, &self.bind_group_layout, &self.sampler, surfaces);
        self.back_bind_group = back;
        self.front_bind_group = front;
    }

    /// Starts the swapchain pass, cleared to the page background.
    pub fn begin_pass<'a>(
        &self,
        encoder: &'a mut wgpu::CommandEncoder,
        view: &'a wgpu::TextureView,
    ) -> wgpu::RenderPass<'a> {
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: None,
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(BACKGROUND),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        })
    }

    pub fn blit<'a>(&'a self, rpass: &mut wgpu::RenderPass<'a>, layer: Layer) {
        let bind_group = match layer {
            Layer::Back => &self.back_bind_group,
            Layer::Front => &self.front_bind_group,
        };

        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, bind_group, &[]);
        rpass.draw(0..3, 0..1);
    }
}

fn create_bind_groups(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    surfaces: &SurfaceManager,
) -> (wgpu::BindGroup, wgpu::BindGroup) {
    let make = |layer: Layer| {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: None,
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&surfaces.target(layer).view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    };

    (make(Layer::Back), make(Layer::Front))
}
