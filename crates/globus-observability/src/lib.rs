use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

pub const FRAMES_PER_SECOND: &str = "globus_frames_per_second";
pub const ZOOM_TRANSITIONS: &str = "globus_zoom_transitions_total";
pub const MISSING_TEXTURES: &str = "globus_missing_textures";

#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub service_name: String,
    pub environment: String,
    pub log_level: String,
    pub metrics_addr: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ObservabilityHandle {
    pub service_name: String,
    pub metrics_enabled: bool,
}

pub fn init(config: &ObservabilityConfig) -> ObservabilityHandle {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);

    let metrics_enabled = init_metrics(config);
    if metrics_enabled {
        describe_metrics();
    }

    ObservabilityHandle {
        service_name: config.service_name.clone(),
        metrics_enabled,
    }
}

/// Globe setup reported once the service is configured.
#[derive(Debug, Clone)]
pub struct StartupSummary<'a> {
    pub environment: &'a str,
    pub u_parts: u32,
    pub v_parts: u32,
    pub tile_zoom: u8,
    pub tiles: usize,
    pub asset_source: &'a str,
}

pub fn log_startup(handle: &ObservabilityHandle, summary: &StartupSummary<'_>) {
    tracing::info!(
        service = %handle.service_name,
        environment = %summary.environment,
        metrics_enabled = handle.metrics_enabled,
        u_parts = summary.u_parts,
        v_parts = summary.v_parts,
        tile_zoom = summary.tile_zoom,
        tiles = summary.tiles,
        assets = %summary.asset_source,
        "globus starting"
    );
}

/// No-op until a recorder is installed.
pub fn record_frame_rate(fps: u32) {
    metrics::gauge!(FRAMES_PER_SECOND).set(f64::from(fps));
}

pub fn record_zoom_transition(from_radius: f64, to_radius: f64) {
    metrics::counter!(ZOOM_TRANSITIONS, "direction" => direction(from_radius, to_radius))
        .increment(1);
}

pub fn record_missing_textures(count: usize) {
    metrics::gauge!(MISSING_TEXTURES).set(count as f64);
}

fn direction(from_radius: f64, to_radius: f64) -> &'static str {
    if to_radius > from_radius { "in" } else { "out" }
}

fn describe_metrics() {
    metrics::describe_gauge!(FRAMES_PER_SECOND, "Frames rendered during the last second");
    metrics::describe_counter!(ZOOM_TRANSITIONS, "Discrete zoom level changes");
    metrics::describe_gauge!(MISSING_TEXTURES, "Tile textures that failed to load");
}

fn init_metrics(config: &ObservabilityConfig) -> bool {
    let Some(addr) = config.metrics_addr.as_ref() else {
        return false;
    };
    let addr: SocketAddr = match addr.parse() {
        Ok(parsed) => parsed,
        Err(err) => {
            tracing::warn!(
                service = %config.service_name,
                error = %err,
                "Invalid GLOBUS_METRICS_ADDR value"
            );
            return false;
        }
    };

    let builder = PrometheusBuilder::new()
        .with_http_listener(addr)
        .add_global_label("service", config.service_name.clone())
        .add_global_label("environment", config.environment.clone());

    match builder.install() {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(
                service = %config.service_name,
                error = %err,
                "Failed to initialize Prometheus exporter"
            );
            false
        }
    }
}
