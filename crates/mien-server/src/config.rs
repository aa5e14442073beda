//! Server configuration
//!
//! A small TOML file; every field has a default so the server runs with no
//! configuration at all.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use mien_core::{MienError, MienResult};

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Address the HTTP server binds
    pub bind: SocketAddr,

    /// Target stream rate per client, frames per second
    pub target_fps: f64,

    /// Side length of the square source image the poser expects
    pub image_size: u32,

    /// Character image loaded at startup (placeholder when absent)
    pub character: Option<PathBuf>,

    /// Directory of `<name>.json` emotion presets layered over the
    /// built-ins
    pub emotions_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind: "127.0.0.1:8008".parse().expect("static default address"),
            target_fps: 25.0,
            image_size: 512,
            character: None,
            emotions_dir: None,
        }
    }
}

impl Config {
    /// Load from `path`, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> MienResult<Config> {
        let Some(path) = path else {
            return Ok(Config::default());
        };
        let text = std::fs::read_to_string(path)
            .map_err(|e| MienError::Config(format!("{}: {e}", path.display())))?;
        let config: Config = toml::from_str(&text)
            .map_err(|e| MienError::Config(format!("{}: {e}", path.display())))?;
        if config.target_fps <= 0.0 {
            return Err(MienError::Config("target_fps must be positive".into()));
        }
        Ok(config)
    }
}
