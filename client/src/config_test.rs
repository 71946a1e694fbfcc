use super::*;

#[test]
fn live_url_follows_page_scheme() {
    let config = ClientConfig::default();
    assert_eq!(config.live_url("http:", "localhost:8080"), "ws://localhost:8080/ws/live");
    assert_eq!(config.live_url("https:", "hub.example"), "wss://hub.example/ws/live");
}

#[test]
fn defaults_match_published_constants() {
    let config = ClientConfig::default();
    assert_eq!(config.api_base, "/api/v1");
    assert_eq!(config.reconnect_base_ms, 1000);
    assert_eq!(config.reconnect_cap_ms, 30_000);
    assert_eq!(config.max_reconnect_attempts, 10);
    assert_eq!(config.pose_debounce_ms, 300);
    assert_eq!(config.form_debounce_ms, 500);
}
