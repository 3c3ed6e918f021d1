//! Application store: the single owner of settings and isochrone results.
//!
//! Views never mutate state. They send [`Action`]s through [`Dispatch`];
//! the store reduces them, notifies subscribers, and queues fetch requests
//! until [`Store::process_pending`] resolves them.

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::error::FetchError;
use crate::here::{IsochroneService, IsolineRequest};
use crate::isochrone::Isochrone;
use crate::settings::Settings;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct IsochronesState {
    pub results: Vec<Isochrone>,
    pub is_fetching: bool,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ControlsState {
    pub settings: Settings,
    pub isochrones: IsochronesState,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Replaces the stored settings.
    UpdateSettings { settings: Settings },
    /// Requests isochrones for `settings`.
    FetchHereIsochrones { settings: Settings },
    ReceiveIsochrones { results: Vec<Isochrone> },
    FetchFailed { message: String },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::UpdateSettings { .. } => "update_settings",
            Action::FetchHereIsochrones { .. } => "fetch_here_isochrones",
            Action::ReceiveIsochrones { .. } => "receive_isochrones",
            Action::FetchFailed { .. } => "fetch_failed",
        }
    }
}

pub trait Dispatch {
    fn dispatch(&mut self, action: Action);
}

/// Pure state transition.
pub fn reduce(state: &ControlsState, action: &Action) -> ControlsState {
    let mut next = state.clone();
    match action {
        Action::UpdateSettings { settings } => {
            next.settings = *settings;
        }
        Action::FetchHereIsochrones { .. } => {
            next.isochrones.is_fetching = true;
        }
        Action::ReceiveIsochrones { results } => {
            next.isochrones.results = results.clone();
            next.isochrones.is_fetching = false;
            next.isochrones.last_error = None;
        }
        Action::FetchFailed { message } => {
            next.isochrones.is_fetching = false;
            next.isochrones.last_error = Some(message.clone());
        }
    }
    next
}

type Listener = Box<dyn FnMut(&ControlsState)>;

pub struct Store {
    state: ControlsState,
    listeners: Vec<Listener>,
    pending: VecDeque<Settings>,
}

impl Store {
    pub fn new(settings: Settings) -> Self {
        Self {
            state: ControlsState {
                settings,
                isochrones: IsochronesState::default(),
            },
            listeners: Vec::new(),
            pending: VecDeque::new(),
        }
    }

    pub fn state(&self) -> &ControlsState {
        &self.state
    }

    /// Registers a callback run after every reduced action.
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&ControlsState) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn pending_fetches(&self) -> usize {
        self.pending.len()
    }

    /// Resolves queued fetches in request order, dispatching each result as
    /// it arrives. Returns the number of requests processed.
    pub async fn process_pending(&mut self, service: &dyn IsochroneService) -> usize {
        let mut processed = 0;
        debug!(pending = self.pending_fetches(), "resolving queued fetches");

        while let Some(settings) = self.pending.pop_front() {
            processed += 1;

            let Some(request) = IsolineRequest::from_settings(&settings) else {
                let err = FetchError::UndefinedCenter;
                warn!(error = %err, "skipping isochrone fetch");
                self.dispatch(Action::FetchFailed {
                    message: err.to_string(),
                });
                continue;
            };

            match service.fetch(&request).await {
                Ok(results) => self.dispatch(Action::ReceiveIsochrones { results }),
                Err(err) => {
                    warn!(error = %err, "isochrone fetch failed");
                    self.dispatch(Action::FetchFailed {
                        message: err.to_string(),
                    });
                }
            }
        }

        processed
    }
}

impl Dispatch for Store {
    fn dispatch(&mut self, action: Action) {
        debug!(action = action.name(), "dispatch");

        self.state = reduce(&self.state, &action);
        if let Action::FetchHereIsochrones { settings } = action {
            self.pending.push_back(settings);
        }
        // Still fetching while anything is queued
        if !self.pending.is_empty() {
            self.state.isochrones.is_fetching = true;
        }

        for listener in self.listeners.iter_mut() {
            listener(&self.state);
        }
    }
}
