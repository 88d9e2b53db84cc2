// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default schema version for YAML configs
fn default_schema_version() -> String {
    "1.0".to_string()
}

fn check_schema_version(version: &str) -> Result<()> {
    if version != "1.0" {
        anyhow::bail!(
            "Unsupported schema_version '{}'. Supported versions: '1.0'",
            version
        );
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaLevel {
    #[default]
    Min,
    Low,
    High,
    Max,
}

/// Width of the integer carried at the start of the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StateWidth {
    #[default]
    #[serde(alias = "int16", alias = "avr")]
    I16,
    #[serde(alias = "int32", alias = "arm")]
    I32,
}

/// Pin wiring and radio parameters of one receiver board.
///
/// Every field is optional in YAML; missing fields take the values the
/// firmware is built with.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct BoardConfig {
    pub schema_version: String,
    pub name: String,
    pub ce_pin: u8,
    pub csn_pin: u8,
    pub enable_pin: u8,
    pub address: String,
    pub pipe: u8,
    pub channel: u8,
    pub pa_level: PaLevel,
    pub payload_size: u8,
    pub state_width: StateWidth,
    pub baud: u32,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            name: "rf-enable".to_string(),
            ce_pin: 7,
            csn_pin: 8,
            enable_pin: 10,
            address: "00001".to_string(),
            pipe: 0,
            channel: 76,
            pa_level: PaLevel::Min,
            payload_size: 32,
            state_width: StateWidth::I16,
            baud: 115_200,
        }
    }
}

impl BoardConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = std::fs::File::open(&path)
            .with_context(|| format!("Failed to open board config at {:?}", path.as_ref()))?;
        let board: Self = serde_yaml::from_reader(f).context("Failed to parse Board Config")?;
        board.validate()?;
        Ok(board)
    }

    pub fn validate(&self) -> Result<()> {
        check_schema_version(&self.schema_version)?;

        if !self.address.is_ascii() {
            anyhow::bail!("Address '{}' must be ASCII", self.address);
        }
        if !(3..=5).contains(&self.address.len()) {
            anyhow::bail!(
                "Address '{}' must be 3 to 5 bytes, got {}",
                self.address,
                self.address.len()
            );
        }
        if self.pipe > 5 {
            anyhow::bail!("Pipe {} out of range (0..=5)", self.pipe);
        }
        if self.channel > 125 {
            anyhow::bail!("Channel {} out of range (0..=125)", self.channel);
        }
        if !(1..=32).contains(&self.payload_size) {
            anyhow::bail!("Payload size {} out of range (1..=32)", self.payload_size);
        }
        let width = match self.state_width {
            StateWidth::I16 => 2,
            StateWidth::I32 => 4,
        };
        if self.payload_size < width {
            anyhow::bail!(
                "Payload size {} is smaller than the {:?} state value",
                self.payload_size,
                self.state_width
            );
        }
        if self.baud == 0 {
            anyhow::bail!("Baud rate must be greater than zero");
        }

        let pins = [
            ("ce_pin", self.ce_pin),
            ("csn_pin", self.csn_pin),
            ("enable_pin", self.enable_pin),
        ];
        for (i, (name, pin)) in pins.iter().enumerate() {
            if let Some((other, _)) = pins[i + 1..].iter().find(|(_, p)| p == pin) {
                anyhow::bail!("Pin {} is assigned to both {} and {}", pin, name, other);
            }
        }

        Ok(())
    }

    pub fn address_bytes(&self) -> Vec<u8> {
        self.address.as_bytes().to_vec()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PinLevel {
    High,
    Low,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SendStep {
    pub send: i32,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub channel: Option<u8>,
}

/// Raw payload bytes, sent as-is without padding.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RawStep {
    pub send_raw: Vec<u8>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub channel: Option<u8>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct IdleStep {
    pub idle: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum ScenarioStep {
    Send(SendStep),
    SendRaw(RawStep),
    Idle(IdleStep),
}

impl ScenarioStep {
    /// Receiver iterations this step consumes. A transmit is followed by one.
    pub fn iterations(&self) -> u64 {
        match self {
            ScenarioStep::Send(_) | ScenarioStep::SendRaw(_) => 1,
            ScenarioStep::Idle(s) => s.idle,
        }
    }

    fn overrides(&self) -> (Option<&str>, Option<u8>) {
        match self {
            ScenarioStep::Send(s) => (s.address.as_deref(), s.channel),
            ScenarioStep::SendRaw(s) => (s.address.as_deref(), s.channel),
            ScenarioStep::Idle(_) => (None, None),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Runner failed before the bench started (e.g. script parse/validation error).
    ConfigError,
    Completed,
    MaxIterations,
    RuntimeError,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct EnableAssertion {
    pub enable: PinLevel,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct LogContainsAssertion {
    pub log_contains: String,
}

/// Exact serial transcript, line by line.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct LogLinesAssertion {
    pub log_lines: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct TransitionsAssertion {
    pub transitions: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct StopReasonAssertion {
    pub expected_stop_reason: StopReason,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(untagged)]
pub enum ScenarioAssertion {
    Enable(EnableAssertion),
    LogContains(LogContainsAssertion),
    LogLines(LogLinesAssertion),
    Transitions(TransitionsAssertion),
    ExpectedStopReason(StopReasonAssertion),
}

fn default_max_iterations() -> u64 {
    100_000
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct ScenarioLimits {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u64,
}

impl Default for ScenarioLimits {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct ScenarioScript {
    pub schema_version: String,
    #[serde(default)]
    pub board: Option<String>,
    #[serde(default)]
    pub limits: ScenarioLimits,
    #[serde(default)]
    pub steps: Vec<ScenarioStep>,
    #[serde(default)]
    pub assertions: Vec<ScenarioAssertion>,
}

impl ScenarioScript {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = std::fs::File::open(&path)
            .with_context(|| format!("Failed to open scenario script at {:?}", path.as_ref()))?;
        let script: Self =
            serde_yaml::from_reader(f).context("Failed to parse Scenario Script YAML")?;
        script.validate()?;
        Ok(script)
    }

    pub fn validate(&self) -> Result<()> {
        check_schema_version(&self.schema_version)?;

        if self.limits.max_iterations == 0 {
            anyhow::bail!("Limit 'max_iterations' must be greater than zero");
        }

        if let Some(board) = &self.board {
            if board.trim().is_empty() {
                anyhow::bail!("Input 'board' path cannot be empty");
            }
        }

        for (i, step) in self.steps.iter().enumerate() {
            let (address, channel) = step.overrides();
            if let Some(address) = address {
                if !(3..=5).contains(&address.len()) {
                    anyhow::bail!(
                        "Step {}: address '{}' must be 3 to 5 bytes",
                        i + 1,
                        address
                    );
                }
            }
            if let Some(channel) = channel {
                if channel > 125 {
                    anyhow::bail!("Step {}: channel {} out of range (0..=125)", i + 1, channel);
                }
            }
            if let ScenarioStep::SendRaw(raw) = step {
                if raw.send_raw.len() > 32 {
                    anyhow::bail!(
                        "Step {}: raw payload of {} bytes exceeds 32",
                        i + 1,
                        raw.send_raw.len()
                    );
                }
            }
        }

        Ok(())
    }

    pub fn planned_iterations(&self) -> u64 {
        self.steps
            .iter()
            .map(ScenarioStep::iterations)
            .fold(0u64, u64::saturating_add)
    }
}

/// A scenario together with the board it runs against.
#[derive(Debug, Clone)]
pub struct LoadedScenario {
    pub script: ScenarioScript,
    pub board: BoardConfig,
    pub board_path: Option<PathBuf>,
}

/// Resolve `target` against the directory holding `base`, unless absolute.
pub fn resolve_relative(base: &Path, target: &str) -> PathBuf {
    let target = Path::new(target);
    if target.is_absolute() {
        return target.to_path_buf();
    }
    base.parent()
        .map(|dir| dir.join(target))
        .unwrap_or_else(|| target.to_path_buf())
}

/// Load a scenario script and the board it names.
///
/// `board_override` wins over the script's own `board` entry. Without
/// either, the built-in board is used.
pub fn load_scenario<P: AsRef<Path>>(
    path: P,
    board_override: Option<&Path>,
) -> Result<LoadedScenario> {
    let path = path.as_ref();
    let script = ScenarioScript::from_file(path)?;

    let board_path = match (board_override, &script.board) {
        (Some(p), _) => Some(p.to_path_buf()),
        (None, Some(b)) => Some(resolve_relative(path, b)),
        (None, None) => None,
    };

    let board = match &board_path {
        Some(p) => BoardConfig::from_file(p)
            .with_context(|| format!("Failed to load board for scenario {:?}", path))?,
        None => {
            tracing::debug!("No board given, using built-in defaults");
            BoardConfig::default()
        }
    };

    Ok(LoadedScenario {
        script,
        board,
        board_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn test_valid_script() {
        let yaml = r#"
schema_version: "1.0"
limits:
  max_iterations: 1000
steps:
  - send: 1
  - idle: 10
  - send_raw: [0, 0]
  - send: -5
    address: "00002"
    channel: 90
assertions:
  - enable: low
  - log_contains: "ON"
  - log_lines: ["ON", "OFF"]
  - transitions: 2
  - expected_stop_reason: completed
"#;
        let script: ScenarioScript = serde_yaml::from_str(yaml).unwrap();
        assert!(script.validate().is_ok());
        assert_eq!(script.steps.len(), 4);
        assert_eq!(script.assertions.len(), 5);
        assert_eq!(script.planned_iterations(), 13);
        assert!(matches!(
            &script.steps[3],
            ScenarioStep::Send(SendStep {
                send: -5,
                channel: Some(90),
                ..
            })
        ));
        assert!(matches!(
            &script.assertions[0],
            ScenarioAssertion::Enable(EnableAssertion {
                enable: PinLevel::Low
            })
        ));
    }

    #[test]
    fn test_invalid_version() {
        let yaml = r#"
schema_version: "2.0"
steps: []
"#;
        let script: ScenarioScript = serde_yaml::from_str(yaml).unwrap();
        let err = script.validate().unwrap_err();
        assert!(err.to_string().contains("Unsupported schema_version"));
    }

    #[test]
    fn test_invalid_max_iterations() {
        let yaml = r#"
schema_version: "1.0"
limits:
  max_iterations: 0
"#;
        let script: ScenarioScript = serde_yaml::from_str(yaml).unwrap();
        let err = script.validate().unwrap_err();
        assert!(err.to_string().contains("max_iterations"));
    }

    #[test]
    fn test_unknown_step_is_rejected() {
        let yaml = r#"
schema_version: "1.0"
steps:
  - sned: 1
"#;
        assert!(serde_yaml::from_str::<ScenarioScript>(yaml).is_err());
    }

    #[test]
    fn test_step_override_is_checked() {
        let yaml = r#"
schema_version: "1.0"
steps:
  - send: 1
    channel: 200
"#;
        let script: ScenarioScript = serde_yaml::from_str(yaml).unwrap();
        let err = script.validate().unwrap_err();
        assert!(err.to_string().contains("channel 200"));
    }

    #[test]
    fn test_board_defaults_match_firmware() {
        let board: BoardConfig = serde_yaml::from_str("name: bench\n").unwrap();
        assert_eq!(board.address_bytes(), b"00001");
        assert_eq!(board.pipe, 0);
        assert_eq!(board.pa_level, PaLevel::Min);
        assert_eq!(board.baud, 115_200);
        assert_eq!(board.state_width, StateWidth::I16);
        assert!(board.validate().is_ok());
    }

    #[test]
    fn test_board_rejects_bad_values() {
        let cases = [
            (
                BoardConfig {
                    address: "1".to_string(),
                    ..BoardConfig::default()
                },
                "3 to 5 bytes",
            ),
            (
                BoardConfig {
                    pipe: 6,
                    ..BoardConfig::default()
                },
                "Pipe 6",
            ),
            (
                BoardConfig {
                    payload_size: 0,
                    ..BoardConfig::default()
                },
                "Payload size 0",
            ),
            (
                BoardConfig {
                    payload_size: 2,
                    state_width: StateWidth::I32,
                    ..BoardConfig::default()
                },
                "smaller than",
            ),
            (
                BoardConfig {
                    enable_pin: 7,
                    ..BoardConfig::default()
                },
                "both ce_pin and enable_pin",
            ),
        ];
        for (board, needle) in cases {
            let err = board.validate().unwrap_err();
            assert!(err.to_string().contains(needle), "{}", err);
        }
    }

    #[test]
    fn test_state_width_aliases() {
        let board: BoardConfig = serde_yaml::from_str("state_width: int32\n").unwrap();
        assert_eq!(board.state_width, StateWidth::I32);
    }

    fn write_temp_file(prefix: &str, contents: &str) -> PathBuf {
        let mut dir = std::env::temp_dir();
        dir.push("rfenable-config-tests");
        let _ = std::fs::create_dir_all(&dir);

        let nonce = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let path = dir.join(format!("{}-{}.yaml", prefix, nonce));
        std::fs::write(&path, contents).expect("Failed to write temp file");
        path
    }

    #[test]
    fn test_load_scenario_resolves_board_next_to_script() {
        let board_path = write_temp_file("board", "channel: 100\naddress: \"RX1\"\n");
        let board_name = board_path.file_name().unwrap().to_str().unwrap().to_string();
        let script_path = write_temp_file(
            "scenario",
            &format!(
                "schema_version: \"1.0\"\nboard: \"{}\"\nsteps:\n  - send: 1\n",
                board_name
            ),
        );

        let loaded = load_scenario(&script_path, None).unwrap();
        assert_eq!(loaded.board.channel, 100);
        assert_eq!(loaded.board.address, "RX1");
        assert_eq!(loaded.board_path.as_deref(), Some(board_path.as_path()));
    }

    #[test]
    fn test_load_scenario_without_board_uses_defaults() {
        let script_path = write_temp_file("scenario-noboard", "schema_version: \"1.0\"\n");
        let loaded = load_scenario(&script_path, None).unwrap();
        assert_eq!(loaded.board, BoardConfig::default());
        assert!(loaded.board_path.is_none());
    }
}
