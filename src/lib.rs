//! Isochrone map viewer model.
//!
//! A settings panel and a map view share one [`store::Store`]. Settings
//! changes are dispatched to the store, which requests isochrones from the
//! HERE isoline service; the map view redraws a center marker and the
//! isochrone polygons whenever the store changes.

pub mod config;
pub mod error;
pub mod here;
pub mod isochrone;
pub mod map_view;
pub mod settings;
pub mod settings_view;
pub mod store;
pub mod utils;

pub use config::{load_config, Config};
pub use error::{ConfigError, FetchError, ShapeError};
pub use here::{HereClient, IsochroneService, IsolineRequest};
pub use isochrone::{Isochrone, IsochroneComponent};
pub use map_view::{render, FitBounds, Layers, MapView};
pub use settings::{IsochronesCenter, Mode, Range, RangeType, Settings, Traffic};
pub use store::{Action, ControlsState, Dispatch, Store};
