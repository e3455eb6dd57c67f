use std::borrow::Cow;

use wgpu::{util::DeviceExt, BindGroupLayoutEntry};

use crate::particle::StarInstance;
use crate::surfaces::{Layer, LAYER_FORMAT};

/// Fixed palette: hue 200, saturation 80%. Front stars are brighter and carry
/// a glow in a near-white shade; back stars are flat and slightly dimmer.
const HUE: f32 = 200.0;
const SATURATION: f32 = 0.8;
const FRONT_LIGHTNESS: f32 = 0.85;
const BACK_LIGHTNESS: f32 = 0.75;
const GLOW_LIGHTNESS: f32 = 0.95;

/// Glow radius in pixels at full opacity.
const GLOW_RADIUS: f32 = 10.0;

/// Per-layer shader style, std140-friendly.
#[repr(C)]
#[derive(bytemuck::Pod, bytemuck::Zeroable, Clone, Copy)]
struct LayerStyle {
    color: [f32; 4],
    glow_color: [f32; 4],
    glow: f32,
    _pad: [f32; 3],
}

struct LayerPipe {
    instance_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// Draws one layer's stars into its offscreen target as instanced quads; the
/// fragment shader traces the 5-point star outline and the front layer's halo.
pub struct RenderModule {
    screen_size_buffer: wgpu::Buffer,
    back: LayerPipe,
    front: LayerPipe,
    pipeline: wgpu::RenderPipeline,
}

impl RenderModule {
    pub fn new(device: &wgpu::Device, max_instances: usize) -> Self {
        let shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: None,
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!("render.wgsl"))),
        });

        let screen_size_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("screen size"),
            size: 2 * 4,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: None,
            entries: &[
                BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let back = Self::layer_pipe(
            device,
            &bind_group_layout,
            &screen_size_buffer,
            max_instances,
            LayerStyle {
                color: hsl_to_rgba(HUE, SATURATION, BACK_LIGHTNESS),
                glow_color: [0.0; 4],
                glow: 0.0,
                _pad: [0.0; 3],
            },
        );
        let front = Self::layer_pipe(
            device,
            &bind_group_layout,
            &screen_size_buffer,
            max_instances,
            LayerStyle {
                color: hsl_to_rgba(HUE, SATURATION, FRONT_LIGHTNESS),
                glow_color: hsl_to_rgba(HUE, SATURATION, GLOW_LIGHTNESS),
                glow: GLOW_RADIUS,
                _pad: [0.0; 3],
            },
        );

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("stars"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: None,
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader_module,
                entry_point: "vertex",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<StarInstance>() as u64,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x2,
                        1 => Float32,
                        2 => Float32,
                        3 => Float32,
                        4 => Float32,
                    ],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader_module,
                entry_point: "fragment",
                targets: &[Some(wgpu::ColorTargetState {
                    format: LAYER_FORMAT,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        Self {
            screen_size_buffer,
            back,
            front,
            pipeline,
        }
    }

    fn layer_pipe(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        screen_size_buffer: &wgpu::Buffer,
        max_instances: usize,
        style: LayerStyle,
    ) -> LayerPipe {
        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("star instances"),
            size: (std::mem::size_of::<StarInstance>() * max_instances) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let style_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("layer style"),
            contents: bytemuck::bytes_of(&style),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: None,
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: screen_size_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: style_buffer.as_entire_binding(),
                },
            ],
        });

        LayerPipe {
            instance_buffer,
            bind_group,
        }
    }

    fn pipe(&self, layer: Layer) -> &LayerPipe {
        match layer {
            Layer::Back => &self.back,
            Layer::Front => &self.front,
        }
    }

    pub fn upload(&self, queue: &wgpu::Queue, layer: Layer, instances: &[StarInstance]) {
        if instances.is_empty() {
            return;
        }

        queue.write_buffer(
            &self.pipe(layer).instance_buffer,
            0,
            bytemuck::cast_slice(instances),
        );
    }

    /// Clears the layer's surface in full and draws its stars.
    pub fn layer_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        layer: Layer,
        count: u32,
    ) {
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: None,
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        if count == 0 {
            return;
        }

        let pipe = self.pipe(layer);
        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &pipe.bind_group, &[]);
        rpass.set_vertex_buffer(0, pipe.instance_buffer.slice(..));
        rpass.draw(0..4, 0..count);
    }

    pub fn update_size(&self, queue: &wgpu::Queue, width: u32, height: u32) {
        queue.write_buffer(
            &self.screen_size_buffer,
            0,
            bytemuck::bytes_of(&[width as f32, height as f32]),
        );
    }
}

/// HSL to straight-alpha RGBA, hue in degrees, saturation/lightness in [0, 1].
fn hsl_to_rgba(hue: f32, saturation: f32, lightness: f32) -> [f32; 4] {
    let c = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let h = hue / 60.0;
    let x = c * (1.0 - (h.rem_euclid(2.0) - 1.0).abs());
    let m = lightness - c / 2.0;

    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    [r + m, g + m, b + m, 1.0]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn palette_hue_200_is_a_light_blue() {
        let [r, g, b, a] = hsl_to_rgba(HUE, SATURATION, FRONT_LIGHTNESS);
        assert!(close(r, 0.73) && close(g, 0.89) && close(b, 0.97));
        assert_eq!(a, 1.0);

        // Back layer is the same hue, just dimmer.
        let [br, bg, bb, _] = hsl_to_rgba(HUE, SATURATION, BACK_LIGHTNESS);
        assert!(br < r && bg < g && bb < b);
    }

    #[test]
    fn hsl_primaries() {
        assert_eq!(hsl_to_rgba(0.0, 1.0, 0.5), [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(hsl_to_rgba(120.0, 1.0, 0.5), [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(hsl_to_rgba(240.0, 1.0, 0.5), [0.0, 0.0, 1.0, 1.0]);
    }
}
