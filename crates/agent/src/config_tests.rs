// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use tempfile::TempDir;
use yare::parameterized;

const MINIMAL: &str = r#"
[identity]
email = "rider@example.com"
organization_id = "org1"

[directory]
url = "https://transit.example.com/api/organizations/{organization_id}/vehicles"

[position]
latitude = 37.5665
longitude = 126.978
"#;

#[test]
fn minimal_config_uses_session_defaults() {
    let config = AgentConfig::from_toml_str(MINIMAL).unwrap();

    assert_eq!(config.session, SessionConfig::default());
    assert_eq!(config.identity.email, "rider@example.com");
    assert_eq!(config.directory.timeout_ms, 10_000);
    assert_eq!(
        config.directory.url_for("org1"),
        "https://transit.example.com/api/organizations/org1/vehicles"
    );
    assert_eq!(config.directory.timeout(), Duration::from_secs(10));
}

#[test]
fn session_table_is_embedded() {
    let content = format!(
        "{}\n[session]\nendpoint = \"wss://transit.example.com/ws/{{organization_id}}\"\n\n[session.reconnect]\nmax_attempts = 2\n",
        MINIMAL
    );
    let config = AgentConfig::from_toml_str(&content).unwrap();

    assert_eq!(
        config.session.endpoint_for("org1"),
        "wss://transit.example.com/ws/org1"
    );
    assert_eq!(config.session.reconnect.max_attempts, 2);
}

#[test]
fn load_reads_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("busline.toml");
    fs::write(&path, MINIMAL).unwrap();

    let config = AgentConfig::load(&path).unwrap();
    assert_eq!(config.identity.organization_id, "org1");
}

#[test]
fn load_missing_file_names_path() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("missing.toml");

    let err = AgentConfig::load(&path).unwrap_err();
    assert!(matches!(err, AgentError::ReadConfig { .. }));
    assert!(err.to_string().contains("missing.toml"));
}

#[test]
fn missing_identity_is_a_parse_error() {
    let err = AgentConfig::from_toml_str("[position]\nlatitude = 1.0\nlongitude = 1.0\n").unwrap_err();
    assert!(matches!(err, AgentError::ParseConfig(_)));
}

#[parameterized(
    ftp = { "ftp://transit.example.com/vehicles" },
    websocket = { "ws://transit.example.com/vehicles" },
    bare_host = { "transit.example.com/vehicles" },
)]
fn rejects_non_http_directory(url: &str) {
    let content = MINIMAL.replace(
        "https://transit.example.com/api/organizations/{organization_id}/vehicles",
        url,
    );
    let err = AgentConfig::from_toml_str(&content).unwrap_err();
    assert!(matches!(err, AgentError::InvalidDirectoryUrl(_)));
}

#[parameterized(
    origin = { 0.0, 0.0 },
    near_origin = { 0.05, -0.09 },
    latitude_out_of_range = { 91.0, 126.0 },
    longitude_out_of_range = { 37.0, 181.0 },
)]
fn rejects_placeholder_positions(latitude: f64, longitude: f64) {
    let content = MINIMAL
        .replace("latitude = 37.5665", &format!("latitude = {:?}", latitude))
        .replace("longitude = 126.978", &format!("longitude = {:?}", longitude));
    let err = AgentConfig::from_toml_str(&content).unwrap_err();
    assert!(matches!(err, AgentError::InvalidPosition { .. }));
}

#[test]
fn invalid_session_is_rejected() {
    let content = format!("{}\n[session]\nheartbeat_interval_ms = 0\n", MINIMAL);
    let err = AgentConfig::from_toml_str(&content).unwrap_err();
    assert!(matches!(err, AgentError::Session(_)));
}
