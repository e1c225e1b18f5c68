//! Request lifecycle for the Loaded Data panel.
//!
//! The panel never talks to the network itself: [`LoaderPanel::begin_load`]
//! hands out a [`LoadTicket`] that the caller executes, and the result comes
//! back through [`LoaderPanel::finish_load`]. Only one ticket is out at a time.

use crate::client::{ClientError, LOAD_FAILURE_FALLBACK};
use crate::integration::IntegrationRegistry;
use crate::store::IntegrationStore;
use serde_json::Value;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Dismissible message that expires on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    message: String,
    raised_at: Instant,
    ttl: Duration,
}

impl Notification {
    pub fn new(message: impl Into<String>, raised_at: Instant, ttl: Duration) -> Self {
        Self {
            message: message.into(),
            raised_at,
            ttl,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.raised_at) >= self.ttl
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestState {
    Idle,
    Loading,
    Error(Notification),
}

/// One load request, tagged with the selection it was issued for.
#[derive(Debug, Clone)]
pub struct LoadTicket {
    pub id: Uuid,
    pub integration: String,
    pub endpoint_id: String,
    pub credentials: Value,
    pub epoch: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    Failed(String),
    /// The selection changed while the request was in flight.
    Discarded,
}

#[derive(Debug)]
pub struct LoaderPanel {
    state: RequestState,
    notification_ttl: Duration,
    discard_stale: bool,
}

impl LoaderPanel {
    pub fn new(notification_ttl: Duration, discard_stale: bool) -> Self {
        Self {
            state: RequestState::Idle,
            notification_ttl,
            discard_stale,
        }
    }

    pub fn state(&self) -> &RequestState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, RequestState::Loading)
    }

    /// Load and Clear are both disabled while a request is in flight.
    pub fn can_trigger(&self) -> bool {
        !self.is_loading()
    }

    pub fn notification(&self) -> Option<&Notification> {
        match &self.state {
            RequestState::Error(notification) => Some(notification),
            _ => None,
        }
    }

    /// Enters `Loading` and returns the request to run, or `None` when a load
    /// is already running or the selection has no credentials yet.
    pub fn begin_load(&mut self, store: &IntegrationStore, registry: &IntegrationRegistry) -> Option<LoadTicket> {
        if self.is_loading() {
            return None;
        }

        let credentials = store.credentials()?.clone();
        let integration = store.params_type().or(store.current_type())?.to_string();
        let Some(endpoint_id) = registry.endpoint_id(&integration) else {
            tracing::warn!(%integration, "no endpoint registered for integration");
            return None;
        };

        let ticket = LoadTicket {
            id: Uuid::new_v4(),
            endpoint_id: endpoint_id.to_string(),
            integration,
            credentials,
            epoch: store.selection_epoch(),
        };

        tracing::info!(request_id = %ticket.id, endpoint = %ticket.endpoint_id, "loading data");
        self.state = RequestState::Loading;
        Some(ticket)
    }

    pub fn finish_load(
        &mut self,
        store: &mut IntegrationStore,
        ticket: LoadTicket,
        result: Result<Value, ClientError>,
        now: Instant,
    ) -> LoadOutcome {
        self.state = RequestState::Idle;

        if self.discard_stale && ticket.epoch != store.selection_epoch() {
            tracing::warn!(
                request_id = %ticket.id,
                issued_epoch = ticket.epoch,
                current_epoch = store.selection_epoch(),
                "discarding response for a previous selection"
            );
            return LoadOutcome::Discarded;
        }

        match result {
            Ok(data) => {
                tracing::info!(request_id = %ticket.id, "data loaded");
                store.set_loaded_data(data);
                LoadOutcome::Applied
            }
            Err(err) => {
                tracing::error!(request_id = %ticket.id, error = %err, "load failed");
                let message = err.user_message(LOAD_FAILURE_FALLBACK);
                self.state = RequestState::Error(Notification::new(
                    message.clone(),
                    now,
                    self.notification_ttl,
                ));
                LoadOutcome::Failed(message)
            }
        }
    }

    /// Wipes the loaded data. Request state is left alone.
    pub fn clear(&self, store: &mut IntegrationStore) -> bool {
        if !self.can_trigger() {
            return false;
        }
        store.clear_loaded_data();
        true
    }

    pub fn dismiss(&mut self) {
        if self.notification().is_some() {
            self.state = RequestState::Idle;
        }
    }

    pub fn expire(&mut self, now: Instant) {
        if self.notification().is_some_and(|n| n.is_expired(now)) {
            self.state = RequestState::Idle;
        }
    }
}
