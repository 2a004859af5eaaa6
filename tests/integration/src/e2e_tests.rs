//! End-to-end tests: configuration file on disk to orchestrated response

use crate::{request, MockVendor, TestRelay, OPENAI_KEY_REF, REST_KEY_REF};
use relay_config::{load_with_overrides, RelayConfig};
use relay_core::AttemptOutcome;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

fn write_config(extension: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(extension)
        .tempfile()
        .expect("temp file");
    file.write_all(content.as_bytes()).expect("write config");
    file
}

async fn load(file: &NamedTempFile, overrides: &[(&str, &str)]) -> RelayConfig {
    load_with_overrides(file.path(), |key| {
        overrides
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| (*v).to_string())
    })
    .await
    .expect("config loads")
}

#[tokio::test]
async fn test_yaml_config_drives_fallback() {
    let primary = MockVendor::rest().await;
    let secondary = MockVendor::openai().await;
    primary.mock_error(503, "maintenance").await;
    secondary.mock_success("from config").await;

    let yaml = format!(
        r#"
providers:
  - id: internal
    protocol: rest
    endpoint: "{rest}"
    credential_ref: {rest_ref}
    model: internal-7b
    capabilities: [general]
    priority: 1
    timeout_ms: 2000
    rest:
      path: /generate
      response_pointer: /output/text
  - id: openai
    protocol: openai
    endpoint: "{openai}"
    credential_ref: {openai_ref}
    model: gpt-4o-mini
    capabilities: [general, summarization]
    priority: 2
cache:
  enabled: true
  default_ttl: 10m
  max_entries: 100
"#,
        rest = primary.endpoint(),
        rest_ref = REST_KEY_REF,
        openai = secondary.endpoint(),
        openai_ref = OPENAI_KEY_REF,
    );
    let file = write_config(".yaml", &yaml);
    let config = load(&file, &[]).await;
    assert_eq!(config.cache.default_ttl, Duration::from_secs(600));

    let relay = TestRelay::from_config(config);
    let result = relay.run(&request("Summarize")).await;

    assert_eq!(result.response.as_deref(), Some("from config"));
    assert_eq!(
        result.outcomes(),
        vec![
            ("internal", AttemptOutcome::Failure),
            ("openai", AttemptOutcome::Success),
        ]
    );

    let cached = relay.run(&request("Summarize")).await;
    assert!(cached.is_cache_hit());
    assert_eq!(primary.calls().await, 1);
    assert_eq!(secondary.calls().await, 1);
}

#[tokio::test]
async fn test_toml_config_with_env_override() {
    let vendor = MockVendor::cohere().await;
    vendor.mock_success("toml").await;

    let toml = format!(
        r#"
[[providers]]
id = "cohere"
protocol = "cohere"
endpoint = "{endpoint}"
credential_ref = "COHERE_API_KEY"
model = "command-r"
capabilities = ["general"]

[cache]
enabled = true
"#,
        endpoint = vendor.endpoint(),
    );
    let file = write_config(".toml", &toml);
    let config = load(&file, &[("RELAY_CACHE_ENABLED", "false")]).await;
    assert!(!config.cache.enabled);

    let relay = TestRelay::from_config(config);
    relay.run(&request("Hello")).await;
    relay.run(&request("Hello")).await;

    assert!(relay.orchestrator.cache().is_none());
    assert_eq!(vendor.calls().await, 2);
}

#[tokio::test]
async fn test_unresolved_credential_excludes_provider() {
    let vendor = MockVendor::openai().await;
    vendor.mock_success("reachable").await;

    let json = format!(
        r#"{{
  "providers": [
    {{
      "id": "ghost",
      "protocol": "google",
      "endpoint": "http://127.0.0.1:9",
      "credential_ref": "NOT_A_KNOWN_KEY",
      "model": "gemini-1.5-flash",
      "capabilities": ["general"],
      "priority": 0
    }},
    {{
      "id": "openai",
      "protocol": "openai",
      "endpoint": "{endpoint}",
      "credential_ref": "OPENAI_API_KEY",
      "model": "gpt-4o-mini",
      "capabilities": ["general"],
      "priority": 1
    }}
  ]
}}"#,
        endpoint = vendor.endpoint(),
    );
    let file = write_config(".json", &json);
    let relay = TestRelay::from_config(load(&file, &[]).await);

    let excluded = relay.orchestrator.registry().excluded();
    assert_eq!(excluded.len(), 1);
    assert_eq!(excluded[0].id, "ghost");
    assert_eq!(relay.orchestrator.chain_for("general"), vec!["openai"]);

    let result = relay.run(&request("Hello")).await;
    assert_eq!(result.outcomes(), vec![("openai", AttemptOutcome::Success)]);
}

#[tokio::test]
async fn test_invalid_config_file_is_rejected() {
    let file = write_config(
        ".yaml",
        r#"
providers:
  - id: broken
    protocol: rest
    endpoint: "http://localhost:8080"
    credential_ref: TOKEN
    model: m
    capabilities: [general]
"#,
    );

    let err = load_with_overrides(file.path(), |_| None)
        .await
        .expect_err("rest provider without a shape");
    assert!(err.to_string().contains("broken"), "{err}");
}

#[tokio::test]
async fn test_provider_status_reflects_calls() {
    let vendor = MockVendor::google().await;
    vendor.mock_error(500, "down").await;

    let relay = TestRelay::uncached(vec![vendor
        .provider("gemini")
        .with_rate_limit_per_minute(10)
        .with_circuit(1, 60_000)]);
    relay.run(&request("Hello")).await;

    let status = relay.orchestrator.provider_status();
    assert_eq!(status.len(), 1);
    assert_eq!(status[0].id, "gemini");
    assert_eq!(status[0].consecutive_failures, 1);
    assert_eq!(status[0].rate_remaining, Some(9));
    assert!(status[0].is_cooling_down());

    let json = serde_json::to_value(&status[0]).expect("serializable");
    assert_eq!(json["state"], "OPEN");
}
