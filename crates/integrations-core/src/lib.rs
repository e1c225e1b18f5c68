//! # Integrations Core Library
//!
//! This crate provides the state and request logic behind the integrations
//! console, independent of any specific user interface.
//!
//! ## Modules
//!
//! - `store`: session identity, selected integration, parameters and loaded data
//! - `integration`: integration registry and credential setup flows
//! - `client`: HTTP client for the integrations server
//! - `loader`: load request lifecycle and notifications
//! - `view`: table vs. text presentation of loaded data
//! - `settings`: application configuration management
//! - `theme`: UI theming system

pub mod client;
pub mod integration;
pub mod loader;
pub mod settings;
pub mod store;
pub mod theme;
pub mod view;

#[cfg(test)]
mod tests {
    use crate::client::{ClientError, IntegrationClient, LOAD_FAILURE_FALLBACK};
    use crate::integration::{
        IntegrationConfig, IntegrationRegistry, SetupContext, SetupError, SetupKind, SetupStep,
        TokenSetup,
    };
    use crate::integration::CredentialSetup;
    use crate::loader::{LoadOutcome, LoaderPanel, RequestState};
    use crate::settings::Settings;
    use crate::store::IntegrationStore;
    use crate::theme::ThemeVariant;
    use crate::view::{DataView, TableView};
    use figment::Jail;
    use serde_json::{json, Map, Value};
    use std::path::Path;
    use std::time::{Duration, Instant};

    fn params(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected an object, got {other}"),
        }
    }

    fn connected_store() -> IntegrationStore {
        let mut store = IntegrationStore::new("TestUser", "TestOrg");
        store.set_current_type(Some("Notion".to_string()));
        store.set_integration_params(params(json!({
            "credentials": { "access_token": "secret" },
            "type": "Notion",
        })));
        store
    }

    fn panel() -> LoaderPanel {
        LoaderPanel::new(Duration::from_secs(5), true)
    }

    #[test]
    fn test_settings_default() {
        let settings = Settings::default();
        assert_eq!(settings.theme, ThemeVariant::EverforestDark);
        assert_eq!(settings.base_url, "http://localhost:8000");
        assert_eq!(settings.default_user, "TestUser");
        assert_eq!(settings.default_org, "TestOrg");
        assert!(settings.discard_stale_responses);
        assert!(settings.integrations.is_empty());
    }

    #[test]
    fn test_settings_file_overrides() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
base_url = "http://integrations.internal:9000"
notification_ttl_secs = 2

[[integrations]]
name = "Linear"
endpoint = "linear"
setup = "token"
"#,
            )?;

            let settings = Settings::load_from(Path::new("config.toml")).map_err(|e| e.to_string())?;

            assert_eq!(settings.base_url, "http://integrations.internal:9000");
            assert_eq!(settings.notification_ttl(), Duration::from_secs(2));
            assert_eq!(settings.default_user, "TestUser");
            assert_eq!(
                settings.integrations,
                vec![IntegrationConfig {
                    name: "Linear".to_string(),
                    endpoint: "linear".to_string(),
                    setup: SetupKind::Token,
                }]
            );
            Ok(())
        });
    }

    #[test]
    fn test_settings_env_beats_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
base_url = "http://from-file:9000"
default_org = "FileOrg"
"#,
            )?;
            jail.set_env("INTEGRATIONS_BASE_URL", "http://from-env:7000");
            jail.set_env("INTEGRATIONS_DISCARD_STALE_RESPONSES", "false");

            let settings = Settings::load_from(Path::new("config.toml")).map_err(|e| e.to_string())?;

            assert_eq!(settings.base_url, "http://from-env:7000");
            assert!(!settings.discard_stale_responses);
            assert_eq!(settings.default_org, "FileOrg");
            Ok(())
        });
    }

    #[test]
    fn test_settings_save_round_trip() {
        Jail::expect_with(|_jail| {
            let path = Path::new("nested/config.toml");
            let mut settings = Settings::default();
            settings.default_org = "Acme".to_string();
            settings.theme = ThemeVariant::EverforestLight;
            settings.save_to(path).map_err(|e| e.to_string())?;

            let loaded = Settings::load_from(path).map_err(|e| e.to_string())?;
            assert_eq!(loaded.default_org, "Acme");
            assert_eq!(loaded.theme, ThemeVariant::EverforestLight);
            Ok(())
        });
    }

    #[test]
    fn test_type_change_always_clears_loaded_data() {
        let mut store = connected_store();
        for next in [Some("Airtable"), Some("Airtable"), None, Some("HubSpot")] {
            store.set_loaded_data(json!([{ "id": 1 }]));
            store.set_current_type(next.map(str::to_string));
            assert!(store.loaded_data().is_none());
            assert!(store.integration_params().is_empty());
            assert_eq!(store.current_type(), next);
        }
    }

    #[test]
    fn test_credential_replacement_clears_loaded_data() {
        let mut store = connected_store();
        store.set_loaded_data(json!({ "foo": "bar" }));
        let epoch = store.selection_epoch();

        // Same type, same token: still a re-authentication.
        store.set_integration_params(params(json!({
            "credentials": { "access_token": "secret" },
        })));

        assert!(store.loaded_data().is_none());
        assert!(store.selection_epoch() > epoch);
        assert_eq!(store.current_type(), Some("Notion"));
    }

    #[test]
    fn test_identity_edits_keep_loaded_data() {
        let mut store = connected_store();
        store.set_loaded_data(json!([1, 2, 3]));
        let epoch = store.selection_epoch();

        store.set_user("someone");
        store.set_org("elsewhere");
        store.set_integration_params(params(json!({ "workspace": "main" })));

        assert_eq!(store.loaded_data(), Some(&json!([1, 2, 3])));
        assert_eq!(store.selection_epoch(), epoch);
        assert_eq!(store.user(), "someone");
        assert_eq!(store.org(), "elsewhere");
    }

    #[test]
    fn test_integration_params_merge() {
        let mut store = IntegrationStore::default();
        store.set_integration_params(params(json!({ "a": 1 })));
        store.set_integration_params(params(json!({ "b": 2 })));
        assert_eq!(Value::Object(store.integration_params().clone()), json!({ "a": 1, "b": 2 }));

        store.set_integration_params(params(json!({ "a": 3 })));
        assert_eq!(Value::Object(store.integration_params().clone()), json!({ "a": 3, "b": 2 }));
    }

    #[test]
    fn test_presence_gates() {
        let mut store = IntegrationStore::default();
        assert!(!store.has_selection());
        assert!(!store.has_credentials());

        store.set_current_type(Some("HubSpot".to_string()));
        assert!(store.has_selection());
        assert!(!store.has_credentials());

        store.set_integration_params(params(json!({ "credentials": null })));
        assert!(!store.has_credentials());

        store.set_integration_params(params(json!({ "credentials": "token", "type": "HubSpot" })));
        assert!(store.has_credentials());
        assert_eq!(store.params_type(), Some("HubSpot"));
    }

    #[test]
    fn test_null_payload_is_absent() {
        let mut store = IntegrationStore::default();
        store.set_loaded_data(Value::Null);
        assert!(store.loaded_data().is_none());
    }

    #[test]
    fn test_table_view_for_record_arrays() {
        let data = json!([{ "id": 1, "name": "x" }, { "id": 2, "name": "y" }]);
        let view = DataView::from_state(false, Some(&data));
        assert_eq!(
            view,
            DataView::Table(TableView {
                columns: vec!["id".to_string(), "name".to_string()],
                rows: vec![
                    vec!["1".to_string(), "x".to_string()],
                    vec!["2".to_string(), "y".to_string()],
                ],
            })
        );
    }

    #[test]
    fn test_table_columns_follow_first_record() {
        let data = json!([
            { "zeta": true, "alpha": null },
            { "alpha": [1, null, "b"], "extra": 1 },
            { "zeta": { "nested": 1 } },
        ]);
        let DataView::Table(table) = DataView::from_state(false, Some(&data)) else {
            panic!("expected a table");
        };
        assert_eq!(table.columns, vec!["zeta", "alpha"]);
        assert_eq!(table.rows[0], vec!["true", "null"]);
        assert_eq!(table.rows[1], vec!["undefined", "1,,b"]);
        assert_eq!(table.rows[2], vec!["[object Object]", "undefined"]);
    }

    #[test]
    fn test_text_fallback() {
        let data = json!({ "foo": "bar" });
        assert_eq!(
            DataView::from_state(false, Some(&data)),
            DataView::Text("{\n  \"foo\": \"bar\"\n}".to_string())
        );
        assert_eq!(DataView::from_state(false, None), DataView::Text(String::new()));
        assert_eq!(
            DataView::from_state(false, Some(&json!([]))),
            DataView::Text("[]".to_string())
        );
        assert_eq!(
            DataView::from_state(false, Some(&json!("plain"))),
            DataView::Text("\"plain\"".to_string())
        );
    }

    #[test]
    fn test_numbers_render_like_the_browser() {
        let records = json!([{ "id": 1.0, "ratio": 0.25, "big": 1e21, "tiny": 1.5e-7, "neg": -0.0 }]);
        let DataView::Table(table) = DataView::from_state(false, Some(&records)) else {
            panic!("expected a table");
        };
        assert_eq!(table.rows[0], vec!["1", "0.25", "1e+21", "1.5e-7", "0"]);

        let data: Value = serde_json::from_str(r#"{"n": 1.0, "b": 1e21, "i": 42}"#).unwrap();
        assert_eq!(
            DataView::from_state(false, Some(&data)),
            DataView::Text("{\n  \"n\": 1,\n  \"b\": 1e+21,\n  \"i\": 42\n}".to_string())
        );
    }

    #[test]
    fn test_loading_hides_data() {
        let data = json!([{ "id": 1 }]);
        assert_eq!(DataView::from_state(true, Some(&data)), DataView::Loading);
    }

    #[test]
    fn test_load_success_stores_raw_payload() {
        let registry = IntegrationRegistry::default();
        let mut store = connected_store();
        let mut panel = panel();

        let ticket = panel.begin_load(&store, &registry).expect("ticket");
        assert_eq!(ticket.endpoint_id, "notion");
        assert_eq!(ticket.credentials, json!({ "access_token": "secret" }));
        assert!(panel.is_loading());

        let payload = json!([{ "id": "page-1", "name": "Roadmap" }]);
        let outcome = panel.finish_load(&mut store, ticket, Ok(payload.clone()), Instant::now());
        assert_eq!(outcome, LoadOutcome::Applied);
        assert_eq!(panel.state(), &RequestState::Idle);
        assert_eq!(store.loaded_data(), Some(&payload));
    }

    #[test]
    fn test_failed_load_uses_server_detail() {
        let registry = IntegrationRegistry::default();
        let mut store = connected_store();
        store.set_loaded_data(json!({ "kept": true }));
        let mut panel = panel();

        let ticket = panel.begin_load(&store, &registry).unwrap();
        let err = ClientError::Server {
            status: 400,
            detail: Some("bad credentials".to_string()),
        };
        let outcome = panel.finish_load(&mut store, ticket, Err(err), Instant::now());

        assert_eq!(outcome, LoadOutcome::Failed("bad credentials".to_string()));
        assert_eq!(panel.notification().unwrap().message(), "bad credentials");
        assert_eq!(store.loaded_data(), Some(&json!({ "kept": true })));
        assert!(panel.can_trigger());
    }

    #[test]
    fn test_failed_load_without_detail_uses_fallback() {
        let registry = IntegrationRegistry::default();
        let mut store = connected_store();
        let mut panel = panel();

        let ticket = panel.begin_load(&store, &registry).unwrap();
        let err = ClientError::Server { status: 500, detail: None };
        panel.finish_load(&mut store, ticket, Err(err), Instant::now());

        assert_eq!(panel.notification().unwrap().message(), LOAD_FAILURE_FALLBACK);
        assert_eq!(LOAD_FAILURE_FALLBACK, "Failed to load data");
    }

    #[test]
    fn test_triggers_disabled_while_loading() {
        let registry = IntegrationRegistry::default();
        let mut store = connected_store();
        store.set_loaded_data(json!([1]));
        let mut panel = panel();

        let ticket = panel.begin_load(&store, &registry).unwrap();
        assert!(!panel.can_trigger());
        assert!(panel.begin_load(&store, &registry).is_none());
        assert!(!panel.clear(&mut store));
        assert_eq!(store.loaded_data(), Some(&json!([1])));

        panel.finish_load(&mut store, ticket, Ok(json!([2])), Instant::now());
        assert!(panel.can_trigger());
    }

    #[test]
    fn test_new_load_clears_previous_error() {
        let registry = IntegrationRegistry::default();
        let mut store = connected_store();
        let mut panel = panel();

        let ticket = panel.begin_load(&store, &registry).unwrap();
        panel.finish_load(
            &mut store,
            ticket,
            Err(ClientError::Server { status: 401, detail: None }),
            Instant::now(),
        );
        assert!(panel.notification().is_some());

        panel.begin_load(&store, &registry).unwrap();
        assert!(panel.notification().is_none());
        assert_eq!(panel.state(), &RequestState::Loading);
    }

    #[test]
    fn test_clear_always_resets_loaded_data() {
        let mut panel = panel();
        let mut store = connected_store();

        assert!(panel.clear(&mut store));
        assert!(store.loaded_data().is_none());

        store.set_loaded_data(json!({ "a": 1 }));
        assert!(panel.clear(&mut store));
        assert!(store.loaded_data().is_none());

        // An error notification survives a clear.
        let registry = IntegrationRegistry::default();
        let ticket = panel.begin_load(&store, &registry).unwrap();
        panel.finish_load(
            &mut store,
            ticket,
            Err(ClientError::Server { status: 500, detail: None }),
            Instant::now(),
        );
        store.set_loaded_data(json!([1]));
        assert!(panel.clear(&mut store));
        assert!(panel.notification().is_some());
    }

    #[test]
    fn test_begin_load_requires_credentials() {
        let registry = IntegrationRegistry::default();
        let mut store = IntegrationStore::default();
        let mut panel = panel();
        assert!(panel.begin_load(&store, &registry).is_none());

        store.set_current_type(Some("Unknown".to_string()));
        store.set_integration_params(params(json!({ "credentials": "x", "type": "Unknown" })));
        assert!(panel.begin_load(&store, &registry).is_none());
        assert!(!panel.is_loading());
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let registry = IntegrationRegistry::default();
        let mut store = connected_store();
        let mut panel = panel();

        let ticket = panel.begin_load(&store, &registry).unwrap();
        store.set_current_type(Some("Airtable".to_string()));

        let outcome = panel.finish_load(&mut store, ticket, Ok(json!([{ "id": 1 }])), Instant::now());
        assert_eq!(outcome, LoadOutcome::Discarded);
        assert!(store.loaded_data().is_none());
        assert!(panel.can_trigger());
    }

    #[test]
    fn test_stale_response_applied_when_discarding_disabled() {
        let registry = IntegrationRegistry::default();
        let mut store = connected_store();
        let mut panel = LoaderPanel::new(Duration::from_secs(5), false);

        let ticket = panel.begin_load(&store, &registry).unwrap();
        store.set_current_type(Some("Airtable".to_string()));

        let outcome = panel.finish_load(&mut store, ticket, Ok(json!([{ "id": 1 }])), Instant::now());
        assert_eq!(outcome, LoadOutcome::Applied);
        assert_eq!(store.loaded_data(), Some(&json!([{ "id": 1 }])));
    }

    #[test]
    fn test_notification_expiry_and_dismiss() {
        let registry = IntegrationRegistry::default();
        let mut store = connected_store();
        let mut panel = LoaderPanel::new(Duration::from_secs(2), true);
        let raised = Instant::now();

        let ticket = panel.begin_load(&store, &registry).unwrap();
        panel.finish_load(
            &mut store,
            ticket,
            Err(ClientError::Server { status: 500, detail: None }),
            raised,
        );

        panel.expire(raised + Duration::from_secs(1));
        assert!(panel.notification().is_some());
        panel.expire(raised + Duration::from_secs(2));
        assert_eq!(panel.state(), &RequestState::Idle);

        let ticket = panel.begin_load(&store, &registry).unwrap();
        panel.finish_load(
            &mut store,
            ticket,
            Err(ClientError::Server { status: 500, detail: None }),
            raised,
        );
        panel.dismiss();
        assert!(panel.notification().is_none());
    }

    #[test]
    fn test_default_registry() {
        let registry = IntegrationRegistry::default();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["Notion", "Airtable", "HubSpot"]);
        assert_eq!(registry.endpoint_id("Notion"), Some("notion"));
        assert_eq!(registry.endpoint_id("Airtable"), Some("airtable"));
        assert_eq!(registry.endpoint_id("HubSpot"), Some("hubspot"));
        assert_eq!(registry.endpoint_id("Slack"), None);
        assert_eq!(registry.get("Notion").unwrap().setup.kind(), SetupKind::Oauth);
    }

    #[test]
    fn test_configured_integrations_extend_registry() {
        let registry = IntegrationRegistry::with_configured(&[
            IntegrationConfig {
                name: "Linear".to_string(),
                endpoint: "linear".to_string(),
                setup: SetupKind::Token,
            },
            IntegrationConfig {
                name: "Notion".to_string(),
                endpoint: "notion-v2".to_string(),
                setup: SetupKind::Oauth,
            },
        ]);
        assert_eq!(registry.len(), 4);
        assert_eq!(registry.endpoint_id("Linear"), Some("linear"));
        assert_eq!(registry.endpoint_id("Notion"), Some("notion-v2"));
        assert_eq!(registry.get("Linear").unwrap().setup.kind(), SetupKind::Token);
    }

    #[test]
    fn test_registry_cycling() {
        let registry = IntegrationRegistry::default();
        assert_eq!(registry.next_name(None).as_deref(), Some("Notion"));
        assert_eq!(registry.next_name(Some("Notion")).as_deref(), Some("Airtable"));
        assert_eq!(registry.next_name(Some("HubSpot")), None);
        assert_eq!(registry.previous_name(None).as_deref(), Some("HubSpot"));
        assert_eq!(registry.previous_name(Some("Notion")), None);
        assert_eq!(registry.previous_name(Some("Airtable")).as_deref(), Some("Notion"));
    }

    #[tokio::test]
    async fn test_token_setup() {
        let client = IntegrationClient::new("localhost:1", Duration::from_secs(1));
        let mut ctx = SetupContext {
            user: "TestUser".to_string(),
            org: "TestOrg".to_string(),
            endpoint_id: "linear".to_string(),
            params: Map::new(),
            input: "   ".to_string(),
        };

        let err = TokenSetup.begin(&client, &ctx).await.unwrap_err();
        assert!(matches!(err, SetupError::MissingInput));
        assert_eq!(err.user_message(), "an access token is required");

        ctx.input = " lin_api_123 ".to_string();
        assert_eq!(
            TokenSetup.begin(&client, &ctx).await.unwrap(),
            SetupStep::Credentials(json!({ "access_token": "lin_api_123" }))
        );
    }
}
