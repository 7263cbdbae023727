// tests/config_loading.rs

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use tempfile::NamedTempFile;

use spoolr::config::{Settings, load_and_validate, parse_duration, parse_str, validate_config};
use spoolr::errors::SpoolrError;
use spoolr::types::{MatchPolicy, ProcessSupport};
use spoolr_test_utils::builders::ConfigFileBuilder;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

fn expect_config_error(contents: &str) -> String {
    let file = write_config(contents);
    match load_and_validate(file.path()) {
        Err(SpoolrError::ConfigError(msg)) => msg,
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_empty_file_uses_defaults() {
    let file = write_config("");
    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.system.scripts_dir, Path::new("scripts"));
    assert_eq!(cfg.system.process_support, ProcessSupport::Auto);
    assert_eq!(cfg.connections.match_by, MatchPolicy::Instance);

    assert!(cfg.network.enabled);
    assert_eq!(cfg.network.connected_status, "Connected");
    let network = cfg.network.policy();
    assert_eq!(network.attempt_timeout, Duration::from_secs(180));
    assert_eq!(network.reconnect_delay, Some(Duration::from_secs(30)));
    assert_eq!(network.max_attempts, None);

    assert!(!cfg.devices.enabled);
    assert_eq!(cfg.devices.policy().max_attempts, Some(3));

    assert!(!cfg.update.beta);
    assert!(cfg.startup.clear_terminal);
    assert!(cfg.startup.check_for_update);
    assert!(!cfg.startup.start_vpn);
}

#[test]
fn test_full_config_is_parsed() {
    let file = write_config(
        r#"
[system]
scripts_dir = "/opt/machine/scripts"
process_support = "disabled"

[connections]
match_by = "kind"

[network]
apn = "internet"
username = "machine"
password = "secret"
connected_status = "Online"
attempt_timeout = "2m"
reconnect_delay = "500ms"
max_attempts = 4

[devices]
enabled = true
pattern = "(?i)coin (mech|acceptor)"
attempt_timeout = "0"

[update]
beta = true

[startup]
clear_terminal = false
start_vpn = true
"#,
    );
    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.system.scripts_dir, Path::new("/opt/machine/scripts"));
    assert_eq!(cfg.system.process_support, ProcessSupport::Disabled);
    assert_eq!(cfg.connections.match_by, MatchPolicy::Kind);

    assert_eq!(cfg.network.connected_status, "Online");
    let network = cfg.network.policy();
    assert_eq!(network.attempt_timeout, Duration::from_secs(120));
    assert_eq!(network.reconnect_delay, Some(Duration::from_millis(500)));
    assert_eq!(network.max_attempts, Some(4));

    assert!(cfg.devices.enabled);
    assert_eq!(cfg.devices.attempt_timeout, Duration::ZERO);

    assert!(cfg.update.beta);
    assert!(!cfg.startup.clear_terminal);
    assert!(cfg.startup.check_for_update);
    assert!(cfg.startup.start_vpn);
}

#[test]
fn test_settings_resolve_dotted_keys() {
    let raw = parse_str(
        r#"
[network]
apn = "internet"
password = 1234

[machine]
name = "spoolr-07"
tracking = "yes"
"#,
    )
    .unwrap();
    let cfg = spoolr::config::ConfigFile::try_from(raw).unwrap();
    let settings = cfg.settings();

    assert_eq!(settings.get_string("network.apn").as_deref(), Some("internet"));
    assert_eq!(settings.get_string("network.password").as_deref(), Some("1234"));
    assert_eq!(settings.string_or_empty("network.username"), "");
    assert_eq!(settings.get_string("machine.name").as_deref(), Some("spoolr-07"));
    assert_eq!(settings.get_bool("machine.tracking"), Some(true));
    assert_eq!(settings.get_string("machine"), None, "tables are not strings");
    assert_eq!(settings.get_string("network.apn.extra"), None);
}

#[test]
fn test_builder_settings_reach_the_settings_view() {
    let cfg = ConfigFileBuilder::new()
        .setting("network.apn", "telia")
        .setting("network.username", "vend")
        .build();

    let settings = cfg.settings();
    assert_eq!(settings.string_or_empty("network.apn"), "telia");
    assert_eq!(settings.string_or_empty("network.username"), "vend");
}

#[test]
fn test_bad_duration_is_a_toml_error() {
    let file = write_config(
        r#"
[network]
attempt_timeout = "soon"
"#,
    );

    match load_and_validate(file.path()) {
        Err(SpoolrError::TomlError(e)) => {
            assert!(e.to_string().contains("soon"), "unexpected message: {e}");
        }
        Err(e) => panic!("Expected TomlError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_unknown_process_support_is_rejected() {
    let file = write_config(
        r#"
[system]
process_support = "sometimes"
"#,
    );
    assert!(matches!(
        load_and_validate(file.path()),
        Err(SpoolrError::TomlError(_))
    ));
}

#[test]
fn test_empty_scripts_dir_is_rejected() {
    let msg = expect_config_error(
        r#"
[system]
scripts_dir = ""
"#,
    );
    assert!(msg.contains("scripts_dir"));
}

#[test]
fn test_zero_max_attempts_is_rejected() {
    let msg = expect_config_error(
        r#"
[devices]
max_attempts = 0
"#,
    );
    assert!(msg.contains("[devices].max_attempts"));
}

#[test]
fn test_invalid_device_pattern_is_rejected_only_when_enabled() {
    let msg = expect_config_error(
        r#"
[devices]
enabled = true
pattern = "(unclosed"
"#,
    );
    assert!(msg.contains("not a valid regex"));

    let file = write_config(
        r#"
[devices]
enabled = false
pattern = "(unclosed"
"#,
    );
    assert!(load_and_validate(file.path()).is_ok());
}

#[test]
fn test_validate_config_checks_raw_builder_output() {
    let mut raw = ConfigFileBuilder::new().raw();
    assert!(validate_config(&raw).is_ok());

    raw.network.max_attempts = Some(0);
    match validate_config(&raw) {
        Err(SpoolrError::ConfigError(msg)) => assert!(msg.contains("[network].max_attempts")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn test_missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = load_and_validate(dir.path().join("Spoolr.toml"));
    assert!(matches!(result, Err(SpoolrError::IoError(_))));
}

#[test]
fn test_parse_duration_units() {
    assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
    assert_eq!(parse_duration(" 3s "), Ok(Duration::from_secs(3)));
    assert_eq!(parse_duration("2m"), Ok(Duration::from_secs(120)));
    assert_eq!(parse_duration("1h"), Ok(Duration::from_secs(3600)));
    assert_eq!(parse_duration("0"), Ok(Duration::ZERO));
    assert!(parse_duration("").is_err());
    assert!(parse_duration("15").is_err());
    assert!(parse_duration("5d").is_err());
}

#[test]
fn test_parse_duration_rejects_overflowing_values() {
    assert_eq!(
        parse_duration("307445734561825861m"),
        Err("duration '307445734561825861m' is too large".to_string())
    );
    assert!(parse_duration("5124095576030432h").is_err());
    assert_eq!(
        parse_duration("18446744073709551615s"),
        Ok(Duration::from_secs(u64::MAX))
    );
}
