//! wgpu renderer for the windowed host.
//!
//! [`GpuRenderer`] is the scene's backend: it implements the instance, uniform
//! and light sinks on CPU staging copies and uploads them in [`render`],
//! instance data only when it has been flushed since the last upload.
//!
//! [`render`]: GpuRenderer::render

mod pipeline;

use std::sync::Arc;

use glam::Vec3;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::config::{Rgb, SceneConfig};
use crate::error::GpuError;
use crate::instances::{InstanceBuffer, InstanceSink, InstanceTransform};
use crate::light::LightSink;
use crate::mesh;
use crate::scene::SceneComposer;
use crate::shaders::{self, BODIES_SOURCE, CLOUD_SOURCE, DISPLACEMENT_SOURCE};
use crate::uniforms::{names, UniformBlock, UniformSink, UniformValue};

use pipeline::{create_depth_texture, create_pipeline, PipelineSpec};

/// Radius of the instanced icosahedron before per-body scaling.
const BODY_RADIUS: f32 = 1.0;

/// Counters for uploads actually issued to the queue.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UploadStats {
    pub instance_uploads: u64,
    pub uniform_uploads: u64,
}

pub struct GpuRenderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    depth_texture: wgpu::TextureView,
    clear_color: wgpu::Color,

    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    uniforms: UniformBlock,

    body_pipeline: wgpu::RenderPipeline,
    body_vertex_buffer: wgpu::Buffer,
    body_vertex_count: u32,
    instance_buffer: wgpu::Buffer,
    staging: InstanceBuffer,

    sphere_pipeline: wgpu::RenderPipeline,
    sphere_vertex_buffer: wgpu::Buffer,
    sphere_index_buffer: wgpu::Buffer,
    sphere_index_count: u32,

    cloud_pipeline: wgpu::RenderPipeline,
    cloud_vertex_buffer: wgpu::Buffer,
    cloud_point_count: u32,

    stats: UploadStats,
}

impl GpuRenderer {
    /// Create the device, buffers and pipelines for `scene`.
    pub async fn new(window: Arc<Window>, config: &SceneConfig, scene: &SceneComposer) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;
        log::info!("using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(GpuError::NoSurfaceFormat)?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let depth_texture = create_depth_texture(&device, &surface_config);

        // Frame uniforms shared by all three pipelines
        let uniforms = shaders::frame_uniform_layout(config);
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Frame Uniform Buffer"),
            contents: &uniforms.to_bytes(),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame Uniform Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Uniform Bind Group"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&uniform_bind_group_layout],
            push_constant_ranges: &[],
        });

        // Bodies: flat-shaded icosahedra, one instance per body
        let body_vertices = mesh::flat_icosahedron(BODY_RADIUS);
        let body_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Body Vertex Buffer"),
            contents: bytemuck::cast_slice(&body_vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let capacity = scene.field().len() as u32;
        let staging = InstanceBuffer::new(capacity);
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Body Instance Buffer"),
            contents: staging.as_bytes(),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        let body_pipeline = create_pipeline(
            &device,
            &pipeline_layout,
            surface_config.format,
            PipelineSpec {
                label: "Body Pipeline",
                source: &shaders::compose(&uniforms, BODIES_SOURCE),
                buffers: &[pipeline::mesh_layout(), pipeline::instance_layout()],
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                blend: wgpu::BlendState::ALPHA_BLENDING,
                depth_write: false,
            },
        );

        // Displaced sphere, drawn as a wireframe
        let sphere = mesh::icosphere(config.displacement.radius, config.displacement.detail);
        let sphere_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sphere Vertex Buffer"),
            contents: bytemuck::cast_slice(&sphere.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let sphere_index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sphere Line Index Buffer"),
            contents: bytemuck::cast_slice(&sphere.line_indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let sphere_pipeline = create_pipeline(
            &device,
            &pipeline_layout,
            surface_config.format,
            PipelineSpec {
                label: "Sphere Pipeline",
                source: &shaders::compose(&uniforms, DISPLACEMENT_SOURCE),
                buffers: &[pipeline::mesh_layout()],
                topology: wgpu::PrimitiveTopology::LineList,
                cull_mode: None,
                blend: wgpu::BlendState::REPLACE,
                depth_write: true,
            },
        );

        // Background cloud
        let cloud_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Cloud Vertex Buffer"),
            contents: bytemuck::cast_slice(scene.cloud().points()),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let cloud_pipeline = create_pipeline(
            &device,
            &pipeline_layout,
            surface_config.format,
            PipelineSpec {
                label: "Cloud Pipeline",
                source: &shaders::compose(&uniforms, CLOUD_SOURCE),
                buffers: &[pipeline::cloud_layout()],
                topology: wgpu::PrimitiveTopology::PointList,
                cull_mode: None,
                blend: wgpu::BlendState::ALPHA_BLENDING,
                depth_write: false,
            },
        );

        log::info!(
            "renderer ready: {}x{} {:?}, {} sphere vertices",
            surface_config.width,
            surface_config.height,
            surface_config.format,
            sphere.vertices.len()
        );

        Ok(Self {
            surface,
            device,
            queue,
            config: surface_config,
            depth_texture,
            clear_color: clear_color(config.clear_color),
            uniform_buffer,
            uniform_bind_group,
            uniforms,
            body_pipeline,
            body_vertex_buffer,
            body_vertex_count: body_vertices.len() as u32,
            instance_buffer,
            staging,
            sphere_pipeline,
            sphere_vertex_buffer,
            sphere_index_buffer,
            sphere_index_count: sphere.line_indices.len() as u32,
            cloud_pipeline,
            cloud_vertex_buffer,
            cloud_point_count: scene.cloud().len() as u32,
            stats: UploadStats::default(),
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_texture = create_depth_texture(&self.device, &self.config);
        }
    }

    pub fn stats(&self) -> UploadStats {
        self.stats
    }

    fn upload(&mut self) {
        if self.staging.take_dirty() {
            self.queue.write_buffer(&self.instance_buffer, 0, self.staging.as_bytes());
            self.stats.instance_uploads += 1;
        }
        self.queue.write_buffer(&self.uniform_buffer, 0, &self.uniforms.to_bytes());
        self.stats.uniform_uploads += 1;
    }

    /// Upload pending data and draw cloud, sphere and bodies.
    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        self.upload();

        let output = self.surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);

            render_pass.set_pipeline(&self.cloud_pipeline);
            render_pass.set_vertex_buffer(0, self.cloud_vertex_buffer.slice(..));
            render_pass.draw(0..self.cloud_point_count, 0..1);

            render_pass.set_pipeline(&self.sphere_pipeline);
            render_pass.set_vertex_buffer(0, self.sphere_vertex_buffer.slice(..));
            render_pass.set_index_buffer(self.sphere_index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..self.sphere_index_count, 0, 0..1);

            // Translucent bodies last so they blend over the sphere
            render_pass.set_pipeline(&self.body_pipeline);
            render_pass.set_vertex_buffer(0, self.body_vertex_buffer.slice(..));
            render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
            render_pass.draw(0..self.body_vertex_count, 0..self.staging.capacity());
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

impl InstanceSink for GpuRenderer {
    fn write_instance(&mut self, index: u32, transform: &InstanceTransform) {
        self.staging.write_instance(index, transform);
    }

    fn mark_instances_dirty(&mut self) {
        self.staging.mark_instances_dirty();
    }
}

impl UniformSink for GpuRenderer {
    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        if !self.uniforms.update(name, value) {
            log::warn!("ignoring uniform '{name}': not in the frame layout or wrong type");
        }
    }
}

impl LightSink for GpuRenderer {
    fn set_light_position(&mut self, position: Vec3) {
        self.set_uniform(names::LIGHT_POSITION, UniformValue::Vec3(position));
    }
}

/// Clear values are linear; config colors are sRGB.
fn clear_color(rgb: Rgb) -> wgpu::Color {
    let linear = |c: f32| -> f64 {
        let c = c as f64;
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    wgpu::Color {
        r: linear(rgb.r),
        g: linear(rgb.g),
        b: linear(rgb.b),
        a: 1.0,
    }
}
