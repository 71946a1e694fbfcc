use super::*;
use crate::watch::render_status;
use client::util::stats::StatusLine;

// =============================================================================
// live_url / api_url
// =============================================================================

#[test]
fn live_url_follows_base_scheme() {
    let config = ClientConfig::default();
    assert_eq!(live_url("http://127.0.0.1:8080", &config).ok().as_deref(), Some("ws://127.0.0.1:8080/ws/live"));
    assert_eq!(live_url("https://hub.local/", &config).ok().as_deref(), Some("wss://hub.local/ws/live"));
}

#[test]
fn live_url_rejects_other_schemes() {
    let err = live_url("ftp://hub", &ClientConfig::default()).unwrap_err();
    assert!(matches!(err, CliError::InvalidBaseUrl(ref url) if url == "ftp://hub"));
}

#[test]
fn api_url_joins_without_double_slash() {
    assert_eq!(api_url("http://hub:8080/", &rest::sinks_path()), "http://hub:8080/api/v1/sinks");
}

// =============================================================================
// argument helpers
// =============================================================================

#[test]
fn cli_parses_nested_subcommands() {
    let cli = Cli::try_parse_from(["lidar-hub", "--base-url", "http://h", "sensors", "add", "--mode", "md"]).expect("parse");
    assert_eq!(cli.base_url, "http://h");
    let Command::Sensors(SensorsCommand { command: SensorsSubcommand::Add { mode, port, host, .. } }) = cli.command else {
        panic!("expected sensors add");
    };
    assert_eq!(SensorMode::from(mode), SensorMode::MD);
    assert_eq!(port, rest::DEFAULT_SENSOR_PORT);
    assert_eq!(host, rest::DEFAULT_SENSOR_HOST);
}

#[test]
fn configs_save_defaults_to_default_name() {
    let cli = Cli::try_parse_from(["lidar-hub", "configs", "save"]).expect("parse");
    let Command::Configs(ConfigsCommand { command: ConfigsSubcommand::Save { name } }) = cli.command else {
        panic!("expected configs save");
    };
    assert_eq!(name, "default");
}

#[test]
fn enabled_patch_carries_only_the_flag() {
    let json = serde_json::to_value(enabled_patch(false)).expect("json");
    assert_eq!(json, serde_json::json!({ "enabled": false }));
}

#[test]
fn blank_sensor_id_is_rejected() {
    assert!(matches!(sensor_id("  "), Err(CliError::Invalid(_))));
    assert_eq!(sensor_id(" lidar-1 ").expect("id").as_str(), "lidar-1");
}

#[test]
fn sink_flags_override_the_template() {
    let sink = sink_from_args(true, Some("osc://10.0.0.5:9000".into()), None, Some(0)).expect("valid");
    assert_eq!(sink.type_name(), "osc");
    assert_eq!(sink.url, "osc://10.0.0.5:9000");
    assert_eq!(sink.topic, "clusters");
    assert_eq!(sink.rate_limit, 0);
}

#[test]
fn sink_flags_are_validated() {
    let err = sink_from_args(false, Some("osc://wrong".into()), None, None).unwrap_err();
    let CliError::Invalid(message) = err else {
        panic!("expected validation error");
    };
    assert!(message.starts_with("url:"), "{message}");
}

// =============================================================================
// output
// =============================================================================

#[test]
fn render_body_pretty_prints_json() {
    assert_eq!(render_body("").expect("empty"), "ok");
    assert_eq!(render_body(r#"{"a":1}"#).expect("json"), "{\n  \"a\": 1\n}");
    assert!(matches!(render_body("not json"), Err(CliError::InvalidJson(_))));
}

#[test]
fn render_status_flags_stale_frames() {
    let mut line = StatusLine {
        connection: "connected".into(),
        frame: "seq=4 clusters=2 points=10".into(),
        age: "age=0.2s".into(),
        age_class: "",
        fps: "fps=20".into(),
        counters: "conn=1 disc=0 err=0".into(),
    };
    assert_eq!(render_status(&line), "[connected] seq=4 clusters=2 points=10 age=0.2s fps=20 conn=1 disc=0 err=0");
    line.age = "age=4.0s".into();
    line.age_class = "error";
    assert!(render_status(&line).contains("age=4.0s (error)"));
}
