use std::sync::Arc;
use std::time::Duration;

use globus_config::{GlobeConfig, NativeConfig};
use globus_geo::{GlobeMesh, GlobeOptions, ScrollMailbox, SegmentsInfo};
use globus_observability::{ObservabilityConfig, StartupSummary};
use winit::application::ApplicationHandler;
use winit::event::{MouseScrollDelta, StartCause, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::assets::AssetSource;
use crate::renderer::{FrameReport, Renderer};

const WINDOW_TITLE: &str = "Globus";
const PIXELS_PER_LINE: f64 = 20.0;

pub fn run() -> anyhow::Result<()> {
    let config = NativeConfig::from_env("globus-native");
    let observability = globus_observability::init(&ObservabilityConfig {
        service_name: config.service.service_name.clone(),
        environment: config.service.environment.clone(),
        log_level: config.service.log_level.clone(),
        metrics_addr: config.service.metrics_addr.clone(),
    });

    let globe = build_globe(&config.globe)?;
    let source = AssetSource::from_config(&config.assets)?;
    globus_observability::log_startup(
        &observability,
        &StartupSummary {
            environment: &config.service.environment,
            u_parts: config.globe.u_parts,
            v_parts: config.globe.v_parts,
            tile_zoom: config.globe.tile_zoom,
            tiles: globe.tiles().len(),
            asset_source: &source.describe(),
        },
    );

    let event_loop = EventLoop::new()?;
    let mut app = App {
        globe,
        scroll: ScrollMailbox::new(Duration::from_millis(config.globe.scroll_throttle_ms)),
        scroll_sensitivity: config.globe.scroll_sensitivity,
        source: Some(source),
        preload_budget: Duration::from_secs(config.assets.preload_budget_secs),
        view: None,
    };
    event_loop.run_app(&mut app)?;
    Ok(())
}

fn build_globe(config: &GlobeConfig) -> anyhow::Result<GlobeMesh> {
    let segments = SegmentsInfo::new(config.u_parts, config.v_parts)?;
    let options = GlobeOptions {
        base_radius: config.base_radius,
        tile_zoom: config.tile_zoom,
        initial_scale: config.initial_scale,
        min_radius: config.min_radius,
        max_radius: config.max_radius,
        rotation_step_degrees: config.rotation_step_degrees,
    };
    Ok(GlobeMesh::new(segments, options)?)
}

fn scroll_delta(delta: MouseScrollDelta, sensitivity: f64) -> f64 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => f64::from(y) * sensitivity,
        MouseScrollDelta::PixelDelta(position) => position.y * sensitivity / PIXELS_PER_LINE,
    }
}

fn window_title(fps: u32) -> String {
    format!("{WINDOW_TITLE} · {fps} fps")
}

struct View {
    window: Arc<Window>,
    renderer: Renderer,
}

struct App {
    globe: GlobeMesh,
    scroll: ScrollMailbox,
    scroll_sensitivity: f64,
    source: Option<AssetSource>,
    preload_budget: Duration,
    view: Option<View>,
}

impl App {
    fn publish(&mut self, report: FrameReport) {
        if let Some(transition) = report.zoom {
            globus_observability::record_zoom_transition(transition.from, transition.to);
        }
        let Some(view) = self.view.as_ref().filter(|_| report.fps_updated) else {
            return;
        };
        let fps = view.renderer.fps();
        view.window.set_title(&window_title(fps));
        globus_observability::record_frame_rate(fps);
        tracing::debug!(
            fps,
            frame = view.renderer.frame_index(),
            untextured = view.renderer.untextured_tiles(),
            radius = self.globe.radius(),
            scale = self.globe.scale(),
            "frame rate"
        );
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.view.is_some() {
            return;
        }
        let Some(source) = self.source.take() else {
            return;
        };

        let attributes = WindowAttributes::default().with_title(WINDOW_TITLE);
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                tracing::error!(error = %err, "failed to create window");
                event_loop.exit();
                return;
            }
        };

        let mut renderer = match pollster::block_on(Renderer::new(window.clone(), source)) {
            Ok(renderer) => renderer,
            Err(err) => {
                tracing::error!(error = ?err, "failed to create renderer");
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        self.globe.set_viewport(size.width, size.height);
        let keys = self.globe.texture_keys();
        tracing::info!(
            textures = keys.len(),
            budget_secs = self.preload_budget.as_secs(),
            "preloading tile textures"
        );
        let stats = renderer.preload(&keys, self.preload_budget);
        tracing::info!(
            loaded = stats.loaded,
            missing = stats.missing,
            skipped = stats.skipped,
            "tile textures preloaded"
        );
        globus_observability::record_missing_textures(stats.missing + stats.skipped);

        window.request_redraw();
        self.view = Some(View { window, renderer });
    }

    fn new_events(&mut self, event_loop: &ActiveEventLoop, _cause: StartCause) {
        event_loop.set_control_flow(ControlFlow::Poll);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(view) = self.view.as_mut() else {
            return;
        };
        if view.window.id() != window_id {
            return;
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                view.renderer.resize(size.width, size.height);
                self.globe.set_viewport(size.width, size.height);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.scroll.post(scroll_delta(delta, self.scroll_sensitivity));
            }
            WindowEvent::RedrawRequested => {
                match view.renderer.render(&mut self.globe, &mut self.scroll) {
                    Ok(report) => self.publish(report),
                    Err(err) => {
                        tracing::error!(error = ?err, "frame failed");
                        event_loop.exit();
                    }
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(view) = self.view.as_ref() {
            view.window.request_redraw();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;

    #[test]
    fn line_and_pixel_scrolls_share_a_scale() {
        let line = scroll_delta(MouseScrollDelta::LineDelta(0.0, 2.0), 0.05);
        let pixels = scroll_delta(
            MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, 40.0)),
            0.05,
        );
        assert!((line - 0.1).abs() < 1e-9);
        assert!((pixels - 0.1).abs() < 1e-9);
        assert!(scroll_delta(MouseScrollDelta::LineDelta(3.0, -1.0), 0.05) < 0.0);
    }

    #[test]
    fn title_carries_the_frame_rate() {
        assert_eq!(window_title(60), "Globus · 60 fps");
    }

    #[test]
    fn globe_follows_config() {
        let config = GlobeConfig {
            u_parts: 4,
            v_parts: 8,
            ..GlobeConfig::default()
        };
        let globe = build_globe(&config).unwrap();
        assert_eq!(globe.tiles().len(), 32);
        assert_eq!(globe.texture_keys()[0], "4-0-0_rect.png");
    }

    #[test]
    fn invalid_geometry_is_fatal() {
        let zero_parts = GlobeConfig {
            u_parts: 0,
            ..GlobeConfig::default()
        };
        assert!(build_globe(&zero_parts).is_err());

        let zero_radius = GlobeConfig {
            base_radius: 0.0,
            ..GlobeConfig::default()
        };
        assert!(build_globe(&zero_radius).is_err());
    }
}
