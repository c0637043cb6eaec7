use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub service_name: String,
    pub environment: String,
    pub log_level: String,
    pub metrics_addr: Option<String>,
}

impl ServiceConfig {
    pub fn from_lookup(default_service_name: &str, lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            service_name: lookup("GLOBUS_SERVICE_NAME")
                .unwrap_or_else(|| default_service_name.to_string()),
            environment: lookup("GLOBUS_ENV").unwrap_or_else(|| "local".to_string()),
            log_level: lookup("GLOBUS_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            metrics_addr: lookup("GLOBUS_METRICS_ADDR").filter(|value| !value.trim().is_empty()),
        }
    }
}

/// Tessellation, camera and input tuning for the globe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobeConfig {
    pub u_parts: u32,
    pub v_parts: u32,
    pub tile_zoom: u8,
    pub base_radius: f64,
    pub initial_scale: f64,
    pub min_radius: f64,
    pub max_radius: f64,
    pub rotation_step_degrees: f64,
    pub scroll_sensitivity: f64,
    pub scroll_throttle_ms: u64,
}

impl Default for GlobeConfig {
    fn default() -> Self {
        Self {
            u_parts: 16,
            v_parts: 16,
            tile_zoom: 4,
            base_radius: 0.5,
            initial_scale: 1.0,
            min_radius: 1.0,
            max_radius: 2.0,
            rotation_step_degrees: 1.0,
            scroll_sensitivity: 0.05,
            scroll_throttle_ms: 1,
        }
    }
}

impl GlobeConfig {
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            u_parts: parsed(&lookup, "GLOBUS_U_PARTS", defaults.u_parts),
            v_parts: parsed(&lookup, "GLOBUS_V_PARTS", defaults.v_parts),
            tile_zoom: parsed(&lookup, "GLOBUS_TILE_ZOOM", defaults.tile_zoom),
            base_radius: parsed(&lookup, "GLOBUS_BASE_RADIUS", defaults.base_radius),
            initial_scale: parsed(&lookup, "GLOBUS_INITIAL_SCALE", defaults.initial_scale),
            min_radius: parsed(&lookup, "GLOBUS_MIN_RADIUS", defaults.min_radius),
            max_radius: parsed(&lookup, "GLOBUS_MAX_RADIUS", defaults.max_radius),
            rotation_step_degrees: parsed(
                &lookup,
                "GLOBUS_ROTATION_STEP_DEG",
                defaults.rotation_step_degrees,
            ),
            scroll_sensitivity: parsed(
                &lookup,
                "GLOBUS_SCROLL_SENSITIVITY",
                defaults.scroll_sensitivity,
            ),
            scroll_throttle_ms: parsed(
                &lookup,
                "GLOBUS_SCROLL_THROTTLE_MS",
                defaults.scroll_throttle_ms,
            ),
        }
    }
}

/// Where tile imagery comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetConfig {
    pub asset_dir: String,
    pub tile_base_url: Option<String>,
    pub allow_insecure: bool,
    pub request_timeout_secs: u64,
    /// Wall-clock cap on the startup texture preload.
    pub preload_budget_secs: u64,
}

impl AssetConfig {
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let tile_base_url = lookup("GLOBUS_TILE_BASE")
            .map(|value| value.trim().trim_end_matches('/').to_string())
            .filter(|value| !value.is_empty());
        let allow_insecure = flag(&lookup, "GLOBUS_TILE_INSECURE").unwrap_or_else(|| {
            tile_base_url
                .as_deref()
                .is_some_and(|url| url.contains(".local"))
        });

        Self {
            asset_dir: lookup("GLOBUS_ASSET_DIR").unwrap_or_else(|| "assets/tiles".to_string()),
            tile_base_url,
            allow_insecure,
            request_timeout_secs: parsed(&lookup, "GLOBUS_TILE_TIMEOUT_SECS", 12),
            preload_budget_secs: parsed(&lookup, "GLOBUS_PRELOAD_BUDGET_SECS", 30),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeConfig {
    pub service: ServiceConfig,
    pub globe: GlobeConfig,
    pub assets: AssetConfig,
}

impl NativeConfig {
    pub fn from_env(default_service_name: &str) -> Self {
        Self::from_lookup(default_service_name, |key| env::var(key).ok())
    }

    pub fn from_lookup(default_service_name: &str, lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            service: ServiceConfig::from_lookup(default_service_name, &lookup),
            globe: GlobeConfig::from_lookup(&lookup),
            assets: AssetConfig::from_lookup(&lookup),
        }
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    lookup(key)
        .and_then(|value| value.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn flag(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<bool> {
    lookup(key).and_then(|value| match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = NativeConfig::from_lookup("globus-native", |_| None);
        assert_eq!(config.service.service_name, "globus-native");
        assert_eq!(config.service.log_level, "info");
        assert_eq!(config.service.metrics_addr, None);
        assert_eq!(config.globe, GlobeConfig::default());
        assert_eq!(config.assets.asset_dir, "assets/tiles");
        assert_eq!(config.assets.tile_base_url, None);
        assert!(!config.assets.allow_insecure);
        assert_eq!(config.assets.request_timeout_secs, 12);
        assert_eq!(config.assets.preload_budget_secs, 30);
    }

    #[test]
    fn parses_overrides_and_ignores_garbage() {
        let lookup = lookup_from(&[
            ("GLOBUS_U_PARTS", " 8 "),
            ("GLOBUS_V_PARTS", "eight"),
            ("GLOBUS_MAX_RADIUS", "4.0"),
            ("GLOBUS_SCROLL_THROTTLE_MS", "5"),
            ("GLOBUS_METRICS_ADDR", "  "),
        ]);
        let globe = GlobeConfig::from_lookup(&lookup);
        assert_eq!(globe.u_parts, 8);
        assert_eq!(globe.v_parts, 16);
        assert_eq!(globe.max_radius, 4.0);
        assert_eq!(globe.scroll_throttle_ms, 5);
        assert_eq!(ServiceConfig::from_lookup("x", &lookup).metrics_addr, None);
    }

    #[test]
    fn local_tile_hosts_allow_insecure_unless_overridden() {
        let assets = AssetConfig::from_lookup(lookup_from(&[(
            "GLOBUS_TILE_BASE",
            "https://tiles.local/globe/",
        )]));
        assert_eq!(assets.tile_base_url.as_deref(), Some("https://tiles.local/globe"));
        assert!(assets.allow_insecure);

        let assets = AssetConfig::from_lookup(lookup_from(&[
            ("GLOBUS_TILE_BASE", "https://tiles.local"),
            ("GLOBUS_TILE_INSECURE", "off"),
        ]));
        assert!(!assets.allow_insecure);
    }
}
