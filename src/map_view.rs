//! Map view: a base layer, two overlays, and the viewport.
//!
//! Overlays are rebuilt from scratch on every update. [`render`] is the pure
//! half of that work and can be tested without a [`MapView`].

use geo::{BoundingRect, Coord, Point, Polygon, Rect};
use geojson::{Feature, FeatureCollection, JsonObject, JsonValue};
use serde::Deserialize;
use tracing::debug;

use crate::config::{BasemapConfig, MapConfig};
use crate::error::ShapeError;
use crate::isochrone;
use crate::store::ControlsState;
use crate::utils;

pub const ISOCHRONES_PANE: &str = "isochronesPane";
const ISOCHRONES_PANE_OPACITY: f64 = 0.9;

/// Which polygons the viewport is fitted to after a redraw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitBounds {
    /// Only the last polygon drawn.
    LastPolygon,
    /// All polygons drawn.
    #[default]
    AllPolygons,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolygonStyle {
    pub fill_color: &'static str,
    pub weight: f64,
    pub opacity: f64,
    pub color: &'static str,
    pub pane: &'static str,
}

pub const ISOCHRONE_STYLE: PolygonStyle = PolygonStyle {
    fill_color: "#f44242",
    weight: 2.0,
    opacity: 1.0,
    color: "white",
    pane: ISOCHRONES_PANE,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub text: String,
    pub permanent: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    /// x = lng, y = lat
    pub position: Point<f64>,
    pub tooltip: Tooltip,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub polygon: Polygon<f64>,
    pub style: PolygonStyle,
}

/// Result of rendering a state snapshot.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Layers {
    pub markers: Vec<Marker>,
    pub polygons: Vec<Shape>,
    pub fit: Option<Rect<f64>>,
}

/// A named, independently clearable group of shapes.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayLayer<T> {
    name: &'static str,
    items: Vec<T>,
}

impl<T> OverlayLayer<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            items: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn add(&mut self, item: T) {
        self.items.push(item);
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pane {
    pub name: &'static str,
    pub opacity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TileLayer {
    pub name: String,
    pub url_template: String,
    pub subdomains: Vec<String>,
}

impl TileLayer {
    /// HERE raster basemap for the configured scheme.
    pub fn here(config: &BasemapConfig) -> Self {
        let url_template = config
            .url_template
            .replace("{scheme}", &config.scheme)
            .replace("{apiKey}", config.api_key.as_deref().unwrap_or_default());

        Self {
            name: format!("HERE {}", config.scheme),
            url_template,
            subdomains: config.subdomains.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MapControl {
    /// Lists the selectable base layers by name.
    Layers { base_layers: Vec<String> },
    Zoom { position: ControlPosition },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// x = lng, y = lat
    pub center: Coord<f64>,
    pub zoom: f64,
    pub max_bounds: Rect<f64>,
}

impl Viewport {
    pub fn fit_bounds(&mut self, bounds: Rect<f64>, width: u32, height: u32) {
        self.center = utils::clamp_to_rect(bounds.center(), self.max_bounds);
        self.zoom = utils::bounds_zoom(bounds, width, height);
    }
}

fn world_bounds() -> Rect<f64> {
    Rect::new(Coord { x: -180.0, y: -90.0 }, Coord { x: 180.0, y: 90.0 })
}

fn center_marker(state: &ControlsState) -> Option<Marker> {
    let (lat, lng) = state.settings.isochrones_center.coordinate()?;

    Some(Marker {
        position: Point::new(lng, lat),
        tooltip: Tooltip {
            text: format!("latitude: {}, longitude: {}", lat, lng),
            permanent: false,
        },
    })
}

/// Builds the overlays for `state`.
pub fn render(state: &ControlsState, fit_bounds: FitBounds) -> Result<Layers, ShapeError> {
    let markers = center_marker(state).into_iter().collect();

    let mut polygons = Vec::new();
    let mut fit: Option<Rect<f64>> = None;

    for isochrone in &state.isochrones.results {
        for component in &isochrone.component {
            let polygon = component.to_polygon()?;

            if let Some(rect) = polygon.bounding_rect() {
                fit = match (fit_bounds, fit) {
                    (FitBounds::AllPolygons, Some(acc)) => Some(utils::union_rect(acc, rect)),
                    _ => Some(rect),
                };
            }

            polygons.push(Shape {
                polygon,
                style: ISOCHRONE_STYLE,
            });
        }
    }

    Ok(Layers {
        markers,
        polygons,
        fit,
    })
}

pub struct MapView {
    viewport: Viewport,
    size: (u32, u32),
    fit_bounds: FitBounds,
    panes: Vec<Pane>,
    base_layer: TileLayer,
    controls: Vec<MapControl>,
    markers: OverlayLayer<Marker>,
    isochrones: OverlayLayer<Shape>,
}

impl MapView {
    pub fn mount(map: &MapConfig, basemap: &BasemapConfig) -> Self {
        let base_layer = TileLayer::here(basemap);
        let controls = vec![
            MapControl::Layers {
                base_layers: vec![base_layer.name.clone()],
            },
            MapControl::Zoom {
                position: ControlPosition::TopRight,
            },
        ];

        Self {
            viewport: Viewport {
                center: Coord {
                    x: map.center[1],
                    y: map.center[0],
                },
                zoom: map.zoom,
                max_bounds: world_bounds(),
            },
            size: (map.width, map.height),
            fit_bounds: map.fit_bounds,
            panes: vec![Pane {
                name: ISOCHRONES_PANE,
                opacity: ISOCHRONES_PANE_OPACITY,
            }],
            base_layer,
            controls,
            markers: OverlayLayer::new("markers"),
            isochrones: OverlayLayer::new("isochrones"),
        }
    }

    /// Clears both overlays and redraws them from `state`. On a shape error
    /// the polygon overlay is left empty.
    pub fn update(&mut self, state: &ControlsState) -> Result<(), ShapeError> {
        self.markers.clear();
        self.isochrones.clear();

        if let Some(marker) = center_marker(state) {
            self.markers.add(marker);
        }

        let layers = render(state, self.fit_bounds)?;
        for shape in layers.polygons {
            self.isochrones.add(shape);
        }

        if let Some(bounds) = layers.fit {
            self.viewport.fit_bounds(bounds, self.size.0, self.size.1);
        }

        debug!(
            markers = self.markers.len(),
            polygons = self.isochrones.len(),
            components = isochrone::component_count(&state.isochrones.results),
            "map redrawn"
        );
        Ok(())
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn panes(&self) -> &[Pane] {
        &self.panes
    }

    pub fn base_layer(&self) -> &TileLayer {
        &self.base_layer
    }

    pub fn controls(&self) -> &[MapControl] {
        &self.controls
    }

    pub fn markers(&self) -> &OverlayLayer<Marker> {
        &self.markers
    }

    pub fn isochrones(&self) -> &OverlayLayer<Shape> {
        &self.isochrones
    }

    /// Both overlays as a GeoJSON feature collection, markers first.
    pub fn to_geojson(&self) -> FeatureCollection {
        let markers = self.markers.items().iter().map(|marker| {
            let mut properties = JsonObject::new();
            properties.insert("layer".into(), JsonValue::from(self.markers.name()));
            properties.insert("tooltip".into(), JsonValue::from(marker.tooltip.text.clone()));
            feature(utils::point_to_geojson(&marker.position), properties)
        });

        let polygons = self.isochrones.items().iter().map(|shape| {
            let mut properties = JsonObject::new();
            properties.insert("layer".into(), JsonValue::from(self.isochrones.name()));
            properties.insert("fillColor".into(), JsonValue::from(shape.style.fill_color));
            properties.insert("color".into(), JsonValue::from(shape.style.color));
            properties.insert("weight".into(), JsonValue::from(shape.style.weight));
            properties.insert("opacity".into(), JsonValue::from(shape.style.opacity));
            properties.insert("pane".into(), JsonValue::from(shape.style.pane));
            feature(utils::polygon_to_geojson(&shape.polygon), properties)
        });

        FeatureCollection {
            bbox: None,
            features: markers.chain(polygons).collect(),
            foreign_members: None,
        }
    }
}

fn feature(geometry: geojson::Geometry, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(geometry),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isochrone::{Isochrone, IsochroneComponent};
    use crate::settings::{IsochronesCenter, Settings};

    fn square(lat: f64, lng: f64, size: f64) -> IsochroneComponent {
        IsochroneComponent {
            id: 0,
            shape: vec![
                format!("{},{}", lat, lng),
                format!("{},{}", lat + size, lng),
                format!("{},{}", lat + size, lng + size),
                format!("{},{}", lat, lng + size),
            ],
        }
    }

    fn state_with(results: Vec<Isochrone>) -> ControlsState {
        let mut state = ControlsState::default();
        state.isochrones.results = results;
        state
    }

    fn grid(n: usize, m: usize) -> Vec<Isochrone> {
        (0..n)
            .map(|i| Isochrone {
                range: 600.0 * (i + 1) as f64,
                component: (0..m).map(|j| square(i as f64, j as f64, 0.5)).collect(),
            })
            .collect()
    }

    fn mounted() -> MapView {
        MapView::mount(&MapConfig::default(), &BasemapConfig::default())
    }

    #[test]
    fn empty_results_draw_nothing() {
        let layers = render(&ControlsState::default(), FitBounds::AllPolygons).unwrap();
        assert!(layers.polygons.is_empty());
        assert!(layers.markers.is_empty());
        assert_eq!(layers.fit, None);
    }

    #[test]
    fn one_polygon_per_component() {
        let layers = render(&state_with(grid(3, 2)), FitBounds::AllPolygons).unwrap();
        assert_eq!(layers.polygons.len(), 6);
        assert!(layers.polygons.iter().all(|shape| shape.style == ISOCHRONE_STYLE));
    }

    #[test]
    fn center_marker_has_coordinate_tooltip() {
        let mut state = ControlsState::default();
        state.settings = Settings::default().with_center(IsochronesCenter::new(10.0, 20.0));

        let layers = render(&state, FitBounds::AllPolygons).unwrap();

        assert_eq!(layers.markers.len(), 1);
        assert_eq!(layers.markers[0].position, Point::new(20.0, 10.0));
        assert_eq!(layers.markers[0].tooltip.text, "latitude: 10, longitude: 20");
        assert!(!layers.markers[0].tooltip.permanent);
    }

    #[test]
    fn fit_to_last_polygon_only() {
        let results = vec![Isochrone {
            range: 600.0,
            component: vec![square(0.0, 0.0, 1.0), square(5.0, 5.0, 1.0)],
        }];
        let layers = render(&state_with(results), FitBounds::LastPolygon).unwrap();
        let fit = layers.fit.unwrap();

        assert_eq!(fit.min(), Coord { x: 5.0, y: 5.0 });
        assert_eq!(fit.max(), Coord { x: 6.0, y: 6.0 });
    }

    #[test]
    fn fit_to_all_polygons() {
        let results = vec![Isochrone {
            range: 600.0,
            component: vec![square(0.0, 0.0, 1.0), square(5.0, 5.0, 1.0)],
        }];
        let layers = render(&state_with(results), FitBounds::AllPolygons).unwrap();
        let fit = layers.fit.unwrap();

        assert_eq!(fit.min(), Coord { x: 0.0, y: 0.0 });
        assert_eq!(fit.max(), Coord { x: 6.0, y: 6.0 });
    }

    #[test]
    fn mount_sets_up_map() {
        let map = mounted();

        assert_eq!(map.viewport().zoom, 2.0);
        assert_eq!(map.viewport().center, Coord { x: -35.729687, y: 25.95681 });
        assert_eq!(map.panes(), [Pane { name: ISOCHRONES_PANE, opacity: 0.9 }]);
        assert!(map.controls().contains(&MapControl::Zoom {
            position: ControlPosition::TopRight
        }));
        assert!(map.markers().is_empty());
        assert!(map.isochrones().is_empty());
    }

    #[test]
    fn base_layer_uses_scheme_and_key() {
        let basemap = BasemapConfig {
            api_key: Some("abc".into()),
            ..BasemapConfig::default()
        };
        let tiles = TileLayer::here(&basemap);

        assert_eq!(tiles.name, "HERE normal.day");
        assert_eq!(
            tiles.url_template,
            "https://{s}.base.maps.ls.hereapi.com/maptile/2.1/maptile/newest/normal.day/{z}/{x}/{y}/256/png8?apiKey=abc"
        );
        assert_eq!(tiles.subdomains, ["1", "2", "3", "4"]);
    }

    #[test]
    fn redraw_does_not_accumulate() {
        let mut map = mounted();

        map.update(&state_with(grid(2, 2))).unwrap();
        assert_eq!(map.isochrones().len(), 4);

        map.update(&state_with(grid(1, 3))).unwrap();
        assert_eq!(map.isochrones().len(), 3);

        map.update(&state_with(Vec::new())).unwrap();
        assert!(map.isochrones().is_empty());
    }

    #[test]
    fn redraw_is_idempotent() {
        let mut state = state_with(grid(2, 3));
        state.settings = Settings::default().with_center(IsochronesCenter::new(1.0, 1.0));

        let mut once = mounted();
        once.update(&state).unwrap();

        let mut twice = mounted();
        twice.update(&state).unwrap();
        twice.update(&state).unwrap();

        assert_eq!(once.isochrones(), twice.isochrones());
        assert_eq!(once.markers(), twice.markers());
        assert_eq!(once.viewport(), twice.viewport());
    }

    #[test]
    fn marker_is_removed_when_center_is_cleared() {
        let mut map = mounted();
        let mut state = ControlsState::default();
        state.settings = Settings::default().with_center(IsochronesCenter::new(10.0, 20.0));
        map.update(&state).unwrap();
        assert_eq!(map.markers().len(), 1);

        state.settings = Settings::default();
        map.update(&state).unwrap();
        assert!(map.markers().is_empty());
    }

    #[test]
    fn viewport_moves_to_results() {
        let mut map = mounted();
        map.update(&state_with(vec![Isochrone {
            range: 600.0,
            component: vec![square(52.0, 13.0, 0.2)],
        }]))
        .unwrap();

        let viewport = map.viewport();
        assert!((viewport.center.y - 52.1).abs() < 1e-9);
        assert!((viewport.center.x - 13.1).abs() < 1e-9);
        assert!(viewport.zoom > 2.0);
    }

    #[test]
    fn malformed_shape_leaves_polygons_empty() {
        let mut map = mounted();
        map.update(&state_with(grid(1, 1))).unwrap();

        let broken = state_with(vec![Isochrone {
            range: 600.0,
            component: vec![IsochroneComponent {
                id: 0,
                shape: vec!["52.0;13.0".into()],
            }],
        }]);

        assert!(map.update(&broken).is_err());
        assert!(map.isochrones().is_empty());
    }

    #[test]
    fn geojson_lists_markers_then_polygons() {
        let mut state = state_with(grid(1, 2));
        state.settings = Settings::default().with_center(IsochronesCenter::new(10.0, 20.0));
        let mut map = mounted();
        map.update(&state).unwrap();

        let collection = map.to_geojson();
        assert_eq!(collection.features.len(), 3);

        let marker = &collection.features[0];
        assert_eq!(
            marker.property("tooltip"),
            Some(&JsonValue::from("latitude: 10, longitude: 20"))
        );
        assert_eq!(
            collection.features[1].property("fillColor"),
            Some(&JsonValue::from("#f44242"))
        );
    }
}
