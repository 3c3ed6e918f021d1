//! Settings panel: one control cluster per settings field.
//!
//! The panel holds no state of its own. [`render`] describes the controls
//! for a settings snapshot and [`handle`] turns an interaction into store
//! actions.

use crate::settings::{Mode, RangeType, Settings, Traffic};
use crate::store::{Action, Dispatch};

// The slider never starts below 1 and moves in whole units
const SLIDER_MIN: f64 = 1.0;
const SLIDER_STEP: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Interaction {
    Mode(Mode),
    Traffic(Traffic),
    RangeType(RangeType),
    Range(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Button {
    pub label: &'static str,
    pub active: bool,
    pub interaction: Interaction,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Control {
    ButtonGroup(Vec<Button>),
    Slider {
        value: f64,
        min: f64,
        max: f64,
        step: f64,
        caption: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ControlCluster {
    pub label: &'static str,
    pub control: Control,
}

/// `"<value> minutes"` for time ranges, `"<value> kilometers"` otherwise.
pub fn range_label(settings: &Settings) -> String {
    format!("{} {}", settings.range.value, settings.rangetype.unit())
}

fn button_group<T, F>(options: &[T], selected: T, label: F, interaction: fn(T) -> Interaction) -> Control
where
    T: Copy + PartialEq,
    F: Fn(&T) -> &'static str,
{
    Control::ButtonGroup(
        options
            .iter()
            .map(|option| Button {
                label: label(option),
                active: *option == selected,
                interaction: interaction(*option),
            })
            .collect(),
    )
}

pub fn render(settings: &Settings) -> Vec<ControlCluster> {
    let mut clusters = vec![ControlCluster {
        label: "Mode of transport",
        control: button_group(&Mode::ALL, settings.mode, Mode::as_str, Interaction::Mode),
    }];

    if settings.mode == Mode::Car {
        clusters.push(ControlCluster {
            label: "Traffic",
            control: button_group(
                &Traffic::ALL,
                settings.traffic,
                Traffic::as_str,
                Interaction::Traffic,
            ),
        });
    }

    clusters.push(ControlCluster {
        label: "Range type",
        control: button_group(
            &RangeType::ALL,
            settings.rangetype,
            RangeType::as_str,
            Interaction::RangeType,
        ),
    });

    clusters.push(ControlCluster {
        label: "Range",
        control: Control::Slider {
            value: settings.range.value,
            min: settings.range.min.max(SLIDER_MIN),
            max: settings.range.max,
            step: SLIDER_STEP,
            caption: range_label(settings),
        },
    });

    clusters
}

/// Applies `interaction` to a copy of `settings`, dispatches the full
/// updated record, and requests isochrones when the center is defined.
pub fn handle<D>(settings: &Settings, interaction: Interaction, dispatcher: &mut D) -> Settings
where
    D: Dispatch + ?Sized,
{
    let updated = match interaction {
        Interaction::Mode(mode) => settings.with_mode(mode),
        Interaction::Traffic(traffic) => settings.with_traffic(traffic),
        Interaction::RangeType(rangetype) => settings.with_rangetype(rangetype),
        Interaction::Range(value) => settings.with_range_value(value),
    };

    dispatcher.dispatch(Action::UpdateSettings { settings: updated });

    if updated.isochrones_center.is_defined() {
        dispatcher.dispatch(Action::FetchHereIsochrones { settings: updated });
    }

    updated
}
