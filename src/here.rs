use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use lru::LruCache;
use serde::Deserialize;
use tracing::debug;

use crate::config::IsolineConfig;
use crate::error::FetchError;
use crate::isochrone::Isochrone;
use crate::settings::{RangeType, Settings};

// Reuse a single reqwest::Client for multiple requests
lazy_static::lazy_static! {
    static ref CLIENT: reqwest::Client = reqwest::Client::new();
}

/// Anything able to turn a request into isochrones.
#[async_trait]
pub trait IsochroneService: Send + Sync {
    async fn fetch(&self, request: &IsolineRequest) -> Result<Vec<Isochrone>, FetchError>;
}

/// Parameters of one isoline calculation, in service units.
#[derive(Debug, Clone, PartialEq)]
pub struct IsolineRequest {
    pub mode: String,
    pub start: (f64, f64),
    /// Seconds for time ranges, meters for distance ranges.
    pub range: f64,
    pub rangetype: RangeType,
}

impl IsolineRequest {
    /// Builds the request for `settings`; `None` until the center is defined.
    pub fn from_settings(settings: &Settings) -> Option<IsolineRequest> {
        let start = settings.isochrones_center.coordinate()?;

        Some(IsolineRequest {
            mode: routing_mode(settings),
            start,
            range: service_range(settings.rangetype, settings.range.value),
            rangetype: settings.rangetype,
        })
    }

    pub fn query_params(&self, api_key: &str) -> Vec<(&'static str, String)> {
        vec![
            ("apiKey", api_key.to_string()),
            ("mode", self.mode.clone()),
            ("start", format!("geo!{},{}", self.start.0, self.start.1)),
            ("range", self.range.to_string()),
            ("rangetype", self.rangetype.as_str().to_string()),
        ]
    }

    // Identifies the request independently of credentials
    pub fn cache_key(&self) -> String {
        format!(
            "{}|{},{}|{}|{}",
            self.mode,
            self.start.0,
            self.start.1,
            self.range,
            self.rangetype.as_str()
        )
    }
}

// Function to build the routing mode string, e.g. "fastest;car;traffic:enabled"
pub fn routing_mode(settings: &Settings) -> String {
    match settings.effective_traffic() {
        Some(traffic) => format!(
            "fastest;{};traffic:{}",
            settings.mode.as_str(),
            traffic.as_str()
        ),
        None => format!("fastest;{}", settings.mode.as_str()),
    }
}

// Minutes to seconds, kilometers to meters
pub fn service_range(rangetype: RangeType, value: f64) -> f64 {
    match rangetype {
        RangeType::Time => value * 60.0,
        RangeType::Distance => value * 1000.0,
    }
}

#[derive(Debug, Deserialize)]
struct IsolineResponse {
    response: IsolineBody,
}

#[derive(Debug, Deserialize)]
struct IsolineBody {
    #[serde(default)]
    isoline: Vec<Isochrone>,
}

pub fn parse_response(body: &str) -> Result<Vec<Isochrone>, serde_json::Error> {
    let parsed: IsolineResponse = serde_json::from_str(body)?;
    Ok(parsed.response.isoline)
}

/// Client for the HERE isoline routing API with an LRU response cache.
pub struct HereClient {
    endpoint: String,
    api_key: Option<String>,
    cache: Mutex<LruCache<String, Vec<Isochrone>>>,
}

impl HereClient {
    pub fn new(config: &IsolineConfig, api_key: Option<String>) -> Self {
        let cache_size = NonZeroUsize::new(config.cache_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            endpoint: config.endpoint.clone(),
            api_key,
            cache: Mutex::new(LruCache::new(cache_size)),
        }
    }

    fn cache(&self) -> MutexGuard<'_, LruCache<String, Vec<Isochrone>>> {
        self.cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn check_cache(&self, request: &IsolineRequest) -> Option<Vec<Isochrone>> {
        self.cache().get(&request.cache_key()).cloned()
    }

    pub fn insert_into_cache(&self, request: &IsolineRequest, isochrones: Vec<Isochrone>) {
        self.cache().put(request.cache_key(), isochrones);
    }

    async fn make_request(&self, request: &IsolineRequest) -> Result<Vec<Isochrone>, FetchError> {
        let api_key = self.api_key.as_deref().ok_or(FetchError::MissingApiKey)?;

        let response = CLIENT
            .get(&self.endpoint)
            .query(&request.query_params(api_key))
            .send()
            .await?
            .error_for_status()?;

        let body = response.text().await?;
        Ok(parse_response(&body)?)
    }
}

#[async_trait]
impl IsochroneService for HereClient {
    async fn fetch(&self, request: &IsolineRequest) -> Result<Vec<Isochrone>, FetchError> {
        if let Some(isochrones) = self.check_cache(request) {
            debug!(key = %request.cache_key(), "isoline cache hit");
            return Ok(isochrones);
        }

        debug!(mode = %request.mode, range = request.range, "requesting isolines");
        let isochrones = self.make_request(request).await?;
        self.insert_into_cache(request, isochrones.clone());

        Ok(isochrones)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isochrone::IsochroneComponent;
    use crate::settings::{IsochronesCenter, Mode, Traffic};

    fn centered() -> Settings {
        Settings::default().with_center(IsochronesCenter::new(52.5, 13.4))
    }

    #[test]
    fn no_request_without_center() {
        assert!(IsolineRequest::from_settings(&Settings::default()).is_none());
    }

    #[test]
    fn car_mode_carries_traffic() {
        let settings = centered().with_traffic(Traffic::Enabled);
        let request = IsolineRequest::from_settings(&settings).unwrap();
        assert_eq!(request.mode, "fastest;car;traffic:enabled");
    }

    #[test]
    fn pedestrian_mode_ignores_traffic() {
        let settings = centered()
            .with_traffic(Traffic::Enabled)
            .with_mode(Mode::Pedestrian);
        let request = IsolineRequest::from_settings(&settings).unwrap();
        assert_eq!(request.mode, "fastest;pedestrian");
    }

    #[test]
    fn ranges_are_converted_to_service_units() {
        let time = IsolineRequest::from_settings(&centered().with_range_value(15.0)).unwrap();
        assert_eq!(time.range, 900.0);

        let distance = IsolineRequest::from_settings(
            &centered()
                .with_rangetype(RangeType::Distance)
                .with_range_value(3.0),
        )
        .unwrap();
        assert_eq!(distance.range, 3000.0);
        assert_eq!(distance.rangetype, RangeType::Distance);
    }

    #[test]
    fn query_params_match_service_format() {
        let request = IsolineRequest::from_settings(&centered()).unwrap();
        let params = request.query_params("key");

        assert!(params.contains(&("apiKey", "key".to_string())));
        assert!(params.contains(&("start", "geo!52.5,13.4".to_string())));
        assert!(params.contains(&("range", "600".to_string())));
        assert!(params.contains(&("rangetype", "time".to_string())));
    }

    #[test]
    fn parses_isoline_response() {
        let body = r#"{
            "response": {
                "metaInfo": {"timestamp": "2019-01-01T00:00:00Z"},
                "center": {"latitude": 52.5, "longitude": 13.4},
                "isoline": [
                    {"range": 600, "component": [
                        {"id": 0, "shape": ["52.1,13.1", "52.2,13.2", "52.3,13.1"]},
                        {"id": 1, "shape": ["52.6,13.6", "52.7,13.7", "52.8,13.6"]}
                    ]}
                ]
            }
        }"#;

        let isochrones = parse_response(body).unwrap();
        assert_eq!(isochrones.len(), 1);
        assert_eq!(isochrones[0].range, 600.0);
        assert_eq!(isochrones[0].component.len(), 2);
        assert_eq!(isochrones[0].component[1].shape[0], "52.6,13.6");
    }

    #[test]
    fn undecodable_body_is_a_decode_error() {
        let err = FetchError::from(parse_response(r#"{"error": "Unauthorized"}"#).unwrap_err());
        assert!(matches!(err, FetchError::Decode(_)));
        assert!(err.to_string().starts_with("failed to decode isoline response"));
    }

    #[test]
    fn missing_isoline_list_is_empty() {
        assert!(parse_response(r#"{"response": {}}"#).unwrap().is_empty());
    }

    #[tokio::test]
    async fn cached_responses_skip_the_network() {
        let config = IsolineConfig {
            endpoint: "http://127.0.0.1:9/unreachable".into(),
            cache_size: 2,
        };
        let client = HereClient::new(&config, None);
        let request = IsolineRequest::from_settings(&centered()).unwrap();
        let cached = vec![Isochrone {
            range: 600.0,
            component: vec![IsochroneComponent {
                id: 0,
                shape: vec!["52.1,13.1".into()],
            }],
        }];
        client.insert_into_cache(&request, cached.clone());

        assert_eq!(client.fetch(&request).await.unwrap(), cached);
    }

    #[tokio::test]
    async fn missing_api_key_fails_before_requesting() {
        let client = HereClient::new(&IsolineConfig::default(), None);
        let request = IsolineRequest::from_settings(&centered()).unwrap();

        let err = client.fetch(&request).await.unwrap_err();
        assert!(matches!(err, FetchError::MissingApiKey));
    }
}
