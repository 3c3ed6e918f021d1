//! Typed application configuration.
//!
//! Every recognized option has a default, so an empty (or missing) TOML file
//! is a valid configuration. The basemap API key is normally supplied through
//! the environment rather than the file.

use std::{fs, path::Path};

use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;
use crate::map_view::FitBounds;
use crate::settings::Settings;

pub const API_KEY_VAR: &str = "HERE_API_KEY";
pub const SCHEME_VAR: &str = "HERE_MAP_SCHEME";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Initial settings placed in the store.
    pub settings: Settings,
    pub basemap: BasemapConfig,
    pub isoline: IsolineConfig,
    pub map: MapConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BasemapConfig {
    pub api_key: Option<String>,
    pub scheme: String,
    pub url_template: String,
    pub subdomains: Vec<String>,
}

impl Default for BasemapConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            scheme: "normal.day".into(),
            url_template: "https://{s}.base.maps.ls.hereapi.com/maptile/2.1/maptile/newest/{scheme}/{z}/{x}/{y}/256/png8?apiKey={apiKey}".into(),
            subdomains: vec!["1".into(), "2".into(), "3".into(), "4".into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct IsolineConfig {
    pub endpoint: String,
    /// Number of responses kept in the client's LRU cache.
    pub cache_size: usize,
}

impl Default for IsolineConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://isoline.route.ls.hereapi.com/routing/7.2/calculateisoline.json"
                .into(),
            cache_size: 64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Initial view center as `[lat, lng]`.
    pub center: [f64; 2],
    pub zoom: f64,
    /// Container size in pixels, used when fitting the view to bounds.
    pub width: u32,
    pub height: u32,
    pub fit_bounds: FitBounds,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center: [25.95681, -35.729687],
            zoom: 2.0,
            width: 1024,
            height: 768,
            fit_bounds: FitBounds::default(),
        }
    }
}

impl Config {
    pub fn from_toml_str(raw: &str) -> Result<Config, ConfigError> {
        let config: Config = toml::from_str(raw)?;
        config.validate()
    }

    /// Applies overrides from `lookup`, normally [`std::env::var`].
    pub fn apply_env_overrides<F>(mut self, lookup: F) -> Config
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(API_KEY_VAR).filter(|key| !key.is_empty()) {
            self.basemap.api_key = Some(key);
        }
        if let Some(scheme) = lookup(SCHEME_VAR).filter(|scheme| !scheme.is_empty()) {
            self.basemap.scheme = scheme;
        }
        self
    }

    /// Rejects unusable range bounds and pulls the initial value inside them.
    pub fn validate(mut self) -> Result<Config, ConfigError> {
        let range = self.settings.range;
        if !range.is_ordered() || !(range.step > 0.0) {
            return Err(ConfigError::InvalidRange {
                min: range.min,
                max: range.max,
                step: range.step,
            });
        }
        if !range.contains(range.value) {
            debug!(value = range.value, "initial range value outside bounds, clamping");
        }
        self.settings.range = range.with_value(range.value);
        Ok(self)
    }
}

/// Loads `path` if it exists (defaults otherwise), then applies environment
/// overrides.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let config = match path {
        Some(path) if path.exists() => {
            debug!(path = %path.display(), "loading config");
            Config::from_toml_str(&fs::read_to_string(path)?)?
        }
        _ => Config::default(),
    };

    Ok(config.apply_env_overrides(|name| std::env::var(name).ok()))
}
