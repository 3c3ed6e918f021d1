use thiserror::Error;

/// Errors raised while requesting isochrones from the isoline service.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no HERE API key configured")]
    MissingApiKey,
    #[error("isochrone center is not defined")]
    UndefinedCenter,
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("failed to decode isoline response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Errors raised while turning service shapes into map geometry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShapeError {
    #[error("malformed coordinate `{0}`")]
    MalformedCoordinate(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid range bounds (min {min}, max {max}, step {step})")]
    InvalidRange { min: f64, max: f64, step: f64 },
}
