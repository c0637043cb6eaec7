mod texture;
mod tiles;

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use globus_geo::{FrameCounter, GlobeMesh, PreloadStats, ScrollMailbox, TextureCache, ZoomTransition};
use winit::window::Window;

use crate::assets::AssetSource;
use texture::{GpuTextureLoader, Texture};
use tiles::{TileSlot, TileUploader};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.5,
    g: 0.5,
    b: 0.5,
    a: 1.0,
};

/// What happened during one call to [`Renderer::render`].
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub zoom: Option<ZoomTransition>,
    /// A one-second window closed; [`Renderer::fps`] holds the new count.
    pub fps_updated: bool,
}

pub struct Renderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth_view: wgpu::TextureView,
    pipeline: wgpu::RenderPipeline,
    tile_layout: wgpu::BindGroupLayout,
    blank: Texture,
    textures: TextureCache<GpuTextureLoader>,
    slots: Vec<TileSlot>,
    frames: FrameCounter,
    frame_index: u64,
    last_frame: Instant,
}

impl Renderer {
    pub async fn new(window: Arc<Window>, source: AssetSource) -> anyhow::Result<Self> {
        let size = window.inner_size();
        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(window)
            .context("create window surface")?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no compatible graphics adapter")?;
        let info = adapter.get_info();
        tracing::info!(adapter = %info.name, backend = ?info.backend, "graphics adapter selected");

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("globus device"),
                ..Default::default()
            })
            .await
            .context("request graphics device")?;

        let caps = surface.get_capabilities(&adapter);
        let surface_format = caps
            .formats
            .iter()
            .copied()
            .find(|format| format.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .context("surface reports no texture formats")?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            desired_maximum_frame_latency: 2,
            alpha_mode,
            view_formats: vec![],
        };
        surface.configure(&device, &config);
        let depth_view = create_depth_view(&device, config.width, config.height);

        let tile_layout = tiles::bind_group_layout(&device);
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = create_pipeline(&device, &tile_layout, surface_format);
        if let Some(error) = device.pop_error_scope().await {
            anyhow::bail!("globe pipeline rejected: {error}");
        }

        let blank = Texture::solid_rgba(&device, &queue, [0, 0, 0, 0])?;
        let loader = GpuTextureLoader::new(source, device.clone(), queue.clone());

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth_view,
            pipeline,
            tile_layout,
            blank,
            textures: TextureCache::new(loader),
            slots: Vec::new(),
            frames: FrameCounter::new(),
            frame_index: 0,
            last_frame: Instant::now(),
        })
    }

    pub fn fps(&self) -> u32 {
        self.frames.fps()
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.reconfigure();
    }

    fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
        self.depth_view = create_depth_view(&self.device, self.config.width, self.config.height);
    }

    /// Resolves every key up front, so frames never block on asset IO. Keys
    /// not reached within `budget` draw transparent.
    pub fn preload(&mut self, keys: &[String], budget: Duration) -> PreloadStats {
        let deadline = Instant::now() + budget;
        self.textures
            .preload_until(keys.iter().map(String::as_str), Some(deadline))
    }

    pub fn render(
        &mut self,
        globe: &mut GlobeMesh,
        scroll: &mut ScrollMailbox,
    ) -> anyhow::Result<FrameReport> {
        let now = Instant::now();
        self.frame_index += 1;
        let mut report = FrameReport {
            fps_updated: self
                .frames
                .tick(now.saturating_duration_since(self.last_frame))
                .is_some(),
            ..FrameReport::default()
        };
        self.last_frame = now;

        if let Some(delta) = scroll.take(now) {
            report.zoom = globe.apply_scroll(delta);
        }
        globe.advance_frame();
        globe.update_tiles();

        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost) => {
                tracing::debug!(frame = self.frame_index, "surface outdated; reconfiguring");
                self.reconfigure();
                return Ok(report);
            }
            Err(wgpu::SurfaceError::Timeout) => {
                tracing::debug!(frame = self.frame_index, "surface timeout; skipping frame");
                return Ok(report);
            }
            Err(err) => return Err(err).context("acquire surface texture"),
        };

        globe.draw(&mut TileUploader {
            device: &self.device,
            queue: &self.queue,
            layout: &self.tile_layout,
            blank: &self.blank,
            textures: &mut self.textures,
            slots: &mut self.slots,
        });
        self.slots.truncate(globe.tiles().len());

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("globus frame encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("globe pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            pass.set_pipeline(&self.pipeline);
            for slot in &self.slots {
                slot.draw(&mut pass);
            }
        }

        self.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(report)
    }

    /// Tiles in the current arena drawn with the transparent fallback.
    pub fn untextured_tiles(&self) -> usize {
        self.slots.iter().filter(|slot| !slot.textured()).count()
    }
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let depth = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("globus depth"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    depth.create_view(&wgpu::TextureViewDescriptor::default())
}

fn create_pipeline(
    device: &wgpu::Device,
    tile_layout: &wgpu::BindGroupLayout,
    surface_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("globe shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("shaders/globe.wgsl").into()),
    });
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("globe pipeline layout"),
        bind_group_layouts: &[tile_layout],
        ..Default::default()
    });
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("globe pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            buffers: &[tiles::vertex_layout()],
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
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
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
        cache: None,
    })
}
