//! Integration tests for configuration loading and endpoint resolution

use ridelink::config::RealtimeConfig;
use ridelink::session::Namespace;
use tokio::time::Duration;

#[test]
fn test_missing_file_yields_defaults() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let config = RealtimeConfig::load_from(&dir.path().join("config.toml"))?;

    assert_eq!(config.api_base_url, "");
    assert_eq!(config.connect_timeout(), Duration::from_secs(15));

    Ok(())
}

#[test]
fn test_load_from_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
api_base_url = "api.example.com:7440/api/v1"
connect_timeout_secs = 5

[tracking]
endpoint = "tracking.example.com:7441"
"#,
    )?;

    let config = RealtimeConfig::load_from(&path)?;
    assert_eq!(config.connect_timeout(), Duration::from_secs(5));
    assert_eq!(config.endpoint_for(Namespace::Chat), "api.example.com:7440");
    assert_eq!(
        config.endpoint_for(Namespace::Tracking),
        "tracking.example.com:7441"
    );

    Ok(())
}

#[test]
fn test_socket_base_url_strips_api_suffix() {
    let mut config = RealtimeConfig::default();

    config.api_base_url = "api.example.com:7440/api/v1".to_string();
    assert_eq!(config.socket_base_url(), "api.example.com:7440");

    config.api_base_url = "api.example.com:7440/api/v1/".to_string();
    assert_eq!(config.socket_base_url(), "api.example.com:7440");

    // No suffix, nothing stripped
    config.api_base_url = "api.example.com:7440".to_string();
    assert_eq!(config.socket_base_url(), "api.example.com:7440");

    // The suffix only counts at the end
    config.api_base_url = "api.example.com/api/v1/extra".to_string();
    assert_eq!(config.socket_base_url(), "api.example.com/api/v1/extra");

    config.api_base_url = String::new();
    assert_eq!(config.socket_base_url(), "");
}
