// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use rfenable_config::{BoardConfig, PaLevel, ScenarioAssertion, ScenarioScript, ScenarioStep};

#[test]
fn test_full_board_parses() {
    let yaml = r#"
schema_version: "1.0"
name: "robot-power"
ce_pin: 9
csn_pin: 10
enable_pin: 4
address: "00001"
pipe: 1
channel: 108
pa_level: high
payload_size: 2
state_width: i16
baud: 9600
"#;
    let board: BoardConfig = serde_yaml::from_str(yaml).unwrap();
    assert!(board.validate().is_ok());
    assert_eq!(board.name, "robot-power");
    assert_eq!(board.enable_pin, 4);
    assert_eq!(board.pa_level, PaLevel::High);
    assert_eq!(board.payload_size, 2);
    assert_eq!(board.baud, 9600);
}

#[test]
fn test_board_unknown_field_is_rejected() {
    let yaml = r#"
address: "00001"
power: max
"#;
    assert!(serde_yaml::from_str::<BoardConfig>(yaml).is_err());
}

#[test]
fn test_board_non_ascii_address_is_rejected() {
    let board = BoardConfig {
        address: "0é01".to_string(),
        ..BoardConfig::default()
    };
    let err = board.validate().unwrap_err();
    assert!(err.to_string().contains("ASCII"));
}

#[test]
fn test_script_steps_parse_in_order() {
    let yaml = r#"
schema_version: "1.0"
steps:
  - idle: 5
  - send_raw: [1, 0, 255]
  - send: 1
"#;
    let script: ScenarioScript = serde_yaml::from_str(yaml).unwrap();
    assert!(matches!(script.steps[0], ScenarioStep::Idle(_)));
    match &script.steps[1] {
        ScenarioStep::SendRaw(raw) => assert_eq!(raw.send_raw, vec![1, 0, 255]),
        other => panic!("unexpected step {:?}", other),
    }
    assert!(matches!(script.steps[2], ScenarioStep::Send(_)));
    assert_eq!(script.planned_iterations(), 7);
    assert_eq!(script.limits.max_iterations, 100_000);
}

#[test]
fn test_unknown_assertion_is_rejected() {
    let yaml = r#"
schema_version: "1.0"
assertions:
  - uart_contains: "ON"
"#;
    assert!(serde_yaml::from_str::<ScenarioScript>(yaml).is_err());
}

#[test]
fn test_log_lines_assertion_parses() {
    let yaml = r#"
schema_version: "1.0"
assertions:
  - log_lines: ["ON", "OFF", "OFF"]
"#;
    let script: ScenarioScript = serde_yaml::from_str(yaml).unwrap();
    match &script.assertions[0] {
        ScenarioAssertion::LogLines(a) => assert_eq!(a.log_lines.len(), 3),
        other => panic!("unexpected assertion {:?}", other),
    }
}

#[test]
fn test_oversized_raw_payload_is_rejected() {
    let yaml = format!(
        "schema_version: \"1.0\"\nsteps:\n  - send_raw: [{}]\n",
        vec!["0"; 33].join(", ")
    );
    let script: ScenarioScript = serde_yaml::from_str(&yaml).unwrap();
    let err = script.validate().unwrap_err();
    assert!(err.to_string().contains("exceeds 32"));
}
