use crate::error::ShapeError;
use crate::utils;

use geo::{Coord, LineString, Polygon};
use serde::{Deserialize, Serialize};

/// One isoline returned by the service for a single range.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Isochrone {
    #[serde(default)]
    pub range: f64,
    #[serde(default)]
    pub component: Vec<IsochroneComponent>,
}

/// A connected part of an isoline. `shape` holds `"lat,lng"` strings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IsochroneComponent {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub shape: Vec<String>,
}

impl IsochroneComponent {
    pub fn coords(&self) -> Result<Vec<Coord<f64>>, ShapeError> {
        self.shape
            .iter()
            .map(|entry| utils::parse_coordinate(entry))
            .collect()
    }

    /// Outline of this component as a polygon (x = lng, y = lat).
    pub fn to_polygon(&self) -> Result<Polygon<f64>, ShapeError> {
        Ok(Polygon::new(LineString::from(self.coords()?), vec![]))
    }
}

/// Total number of components across all results.
pub fn component_count(results: &[Isochrone]) -> usize {
    results.iter().map(|isochrone| isochrone.component.len()).sum()
}
