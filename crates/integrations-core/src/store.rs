//! Shared state for one console session.
//!
//! The store owns the session identity, the selected integration, the
//! parameters its setup flow has produced so far and the last loaded payload.
//! Changing the integration type or replacing its credentials always wipes the
//! loaded payload, so data from one selection is never shown under another.

use serde_json::{Map, Value};

pub const CREDENTIALS_KEY: &str = "credentials";
pub const TYPE_KEY: &str = "type";

#[derive(Debug, Clone, Default)]
pub struct IntegrationStore {
    user: String,
    org: String,
    current_type: Option<String>,
    integration_params: Map<String, Value>,
    loaded_data: Option<Value>,
    selection_epoch: u64,
}

impl IntegrationStore {
    pub fn new(user: impl Into<String>, org: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            org: org.into(),
            ..Self::default()
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn org(&self) -> &str {
        &self.org
    }

    pub fn current_type(&self) -> Option<&str> {
        self.current_type.as_deref()
    }

    pub fn integration_params(&self) -> &Map<String, Value> {
        &self.integration_params
    }

    /// Credentials written by the selected integration's setup flow, if it has completed.
    pub fn credentials(&self) -> Option<&Value> {
        self.integration_params
            .get(CREDENTIALS_KEY)
            .filter(|value| !value.is_null())
    }

    /// The `type` recorded alongside the credentials.
    pub fn params_type(&self) -> Option<&str> {
        self.integration_params.get(TYPE_KEY).and_then(Value::as_str)
    }

    pub fn loaded_data(&self) -> Option<&Value> {
        self.loaded_data.as_ref()
    }

    /// Bumped every time the selection (type or credentials) changes.
    pub fn selection_epoch(&self) -> u64 {
        self.selection_epoch
    }

    pub fn has_selection(&self) -> bool {
        self.current_type.is_some()
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials().is_some()
    }

    pub fn set_user(&mut self, user: impl Into<String>) {
        self.user = user.into();
    }

    pub fn set_org(&mut self, org: impl Into<String>) {
        self.org = org.into();
    }

    pub fn set_current_type(&mut self, current_type: Option<String>) {
        tracing::debug!(?current_type, "integration type changed");
        self.current_type = current_type;
        self.integration_params.clear();
        self.loaded_data = None;
        self.selection_epoch += 1;
    }

    /// Overlays `partial` onto the existing parameters. Writing `credentials`
    /// counts as a credential replacement even when the value is unchanged.
    pub fn set_integration_params(&mut self, partial: Map<String, Value>) {
        let replaces_credentials = partial.contains_key(CREDENTIALS_KEY);
        self.integration_params.extend(partial);

        if replaces_credentials {
            tracing::debug!("credentials replaced, clearing loaded data");
            self.loaded_data = None;
            self.selection_epoch += 1;
        }
    }

    pub fn set_loaded_data(&mut self, data: Value) {
        self.loaded_data = match data {
            Value::Null => None,
            data => Some(data),
        };
    }

    pub fn clear_loaded_data(&mut self) {
        self.loaded_data = None;
    }
}
