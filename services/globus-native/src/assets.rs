use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use globus_config::AssetConfig;

/// Backing store for tile images, addressed by texture key.
pub enum AssetSource {
    Directory(PathBuf),
    Http {
        base_url: String,
        client: reqwest::blocking::Client,
    },
}

impl AssetSource {
    pub fn from_config(config: &AssetConfig) -> anyhow::Result<Self> {
        let Some(base_url) = config.tile_base_url.clone() else {
            return Ok(Self::Directory(PathBuf::from(&config.asset_dir)));
        };
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .danger_accept_invalid_certs(config.allow_insecure)
            .build()
            .context("build tile http client")?;
        Ok(Self::Http { base_url, client })
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Directory(path) => path.display().to_string(),
            Self::Http { base_url, .. } => base_url.clone(),
        }
    }

    pub fn fetch(&self, name: &str) -> anyhow::Result<Vec<u8>> {
        match self {
            Self::Directory(root) => {
                let path = root.join(name);
                std::fs::read(&path).with_context(|| format!("read {}", path.display()))
            }
            Self::Http { base_url, client } => {
                let url = asset_url(base_url, name);
                let response = client
                    .get(&url)
                    .send()
                    .and_then(|response| response.error_for_status())
                    .with_context(|| format!("fetch {url}"))?;
                let bytes = response.bytes().with_context(|| format!("read body of {url}"))?;
                Ok(bytes.to_vec())
            }
        }
    }
}

fn asset_url(base_url: &str, name: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), name.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_join_without_double_slashes() {
        assert_eq!(
            asset_url("https://tiles.local/globe/", "3-2-5_rect.png"),
            "https://tiles.local/globe/3-2-5_rect.png"
        );
        assert_eq!(asset_url("http://h", "/a.png"), "http://h/a.png");
    }

    #[test]
    fn directory_source_without_base_url() {
        let config = AssetConfig {
            asset_dir: "does/not/exist".to_string(),
            tile_base_url: None,
            allow_insecure: false,
            request_timeout_secs: 1,
            preload_budget_secs: 1,
        };
        let source = AssetSource::from_config(&config).unwrap();
        assert_eq!(source.describe(), "does/not/exist");
        assert!(source.fetch("0-0-0_rect.png").is_err());
    }
}
