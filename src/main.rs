use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{bail, Context};
use geojson::GeoJson;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use isochrone_map::settings_view::{self, Interaction};
use isochrone_map::{load_config, Action, Dispatch, HereClient, IsochronesCenter, MapView, Store};

// Usage: isochrone-map [config.toml] [lat lng]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (config_path, coords) = match args.len() {
        0 | 2 => (None, args.as_slice()),
        _ => (Some(PathBuf::from(&args[0])), &args[1..]),
    };

    let config = load_config(config_path.as_deref()).context("loading configuration")?;
    if config.basemap.api_key.is_none() {
        warn!("HERE_API_KEY is not set; isochrone requests will fail");
    }

    let mut settings = config.settings;
    if let [lat, lng] = coords {
        let lat: f64 = lat.parse().context("parsing latitude")?;
        let lng: f64 = lng.parse().context("parsing longitude")?;
        settings = settings.with_center(IsochronesCenter::new(lat, lng));
    } else if !coords.is_empty() {
        bail!("expected both a latitude and a longitude");
    }

    let client = HereClient::new(&config.isoline, config.basemap.api_key.clone());
    let map = Rc::new(RefCell::new(MapView::mount(&config.map, &config.basemap)));

    let mut store = Store::new(config.settings);
    let subscriber = Rc::clone(&map);
    store.subscribe(move |state| {
        if let Err(err) = subscriber.borrow_mut().update(state) {
            warn!(error = %err, "failed to draw isochrones");
        }
    });

    store.dispatch(Action::UpdateSettings { settings });

    // Re-submitting the current range triggers the same dispatch sequence as
    // moving the slider.
    let current = store.state().settings;
    settings_view::handle(&current, Interaction::Range(current.range.value), &mut store);

    let fetched = store.process_pending(&client).await;
    info!(
        fetched,
        polygons = map.borrow().isochrones().len(),
        "isochrones drawn"
    );

    if let Some(err) = &store.state().isochrones.last_error {
        bail!("isochrone request failed: {err}");
    }

    println!("{}", GeoJson::from(map.borrow().to_geojson()));
    Ok(())
}
