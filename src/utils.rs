use crate::error::ShapeError;

use geo::{Coord, Point, Polygon, Rect};
use geojson::{Geometry, Value};

pub const MIN_ZOOM: f64 = 0.0;
pub const MAX_ZOOM: f64 = 18.0;
const TILE_SIZE: f64 = 256.0;

// Parse a "lat,lng" string, ignoring any trailing elevation
pub fn parse_coordinate(entry: &str) -> Result<Coord<f64>, ShapeError> {
    let malformed = || ShapeError::MalformedCoordinate(entry.to_string());

    let mut parts = entry.split(',').map(str::trim);
    let lat = parts
        .next()
        .and_then(|part| part.parse::<f64>().ok())
        .ok_or_else(malformed)?;
    let lng = parts
        .next()
        .and_then(|part| part.parse::<f64>().ok())
        .ok_or_else(malformed)?;

    Ok(Coord { x: lng, y: lat })
}

pub fn polygon_to_geojson(polygon: &Polygon<f64>) -> Geometry {
    let exterior_coords = polygon
        .exterior()
        .0
        .iter()
        .map(|coord| vec![coord.x, coord.y])
        .collect::<Vec<_>>();

    Geometry::new(Value::Polygon(vec![exterior_coords]))
}

pub fn point_to_geojson(point: &Point<f64>) -> Geometry {
    Geometry::new(Value::Point(vec![point.x(), point.y()]))
}

pub fn union_rect(a: Rect<f64>, b: Rect<f64>) -> Rect<f64> {
    Rect::new(
        Coord {
            x: a.min().x.min(b.min().x),
            y: a.min().y.min(b.min().y),
        },
        Coord {
            x: a.max().x.max(b.max().x),
            y: a.max().y.max(b.max().y),
        },
    )
}

// Web mercator y in [0, 1], top of the world at 0
fn mercator_y(lat: f64) -> f64 {
    let sin = lat.clamp(-85.0511, 85.0511).to_radians().sin();
    0.5 - ((1.0 + sin) / (1.0 - sin)).ln() / (4.0 * std::f64::consts::PI)
}

/// Largest integer zoom at which `bounds` fits a `width` x `height` pixel
/// container.
pub fn bounds_zoom(bounds: Rect<f64>, width: u32, height: u32) -> f64 {
    let span_x = (bounds.max().x - bounds.min().x) / 360.0;
    let span_y = (mercator_y(bounds.min().y) - mercator_y(bounds.max().y)).abs();

    let zoom_x = (width as f64 / (TILE_SIZE * span_x)).log2();
    let zoom_y = (height as f64 / (TILE_SIZE * span_y)).log2();

    let zoom = zoom_x.min(zoom_y).floor();
    if zoom.is_nan() {
        return MAX_ZOOM;
    }
    zoom.clamp(MIN_ZOOM, MAX_ZOOM)
}

/// Moves `point` inside `bounds`.
pub fn clamp_to_rect(point: Coord<f64>, bounds: Rect<f64>) -> Coord<f64> {
    Coord {
        x: point.x.clamp(bounds.min().x, bounds.max().x),
        y: point.y.clamp(bounds.min().y, bounds.max().y),
    }
}
