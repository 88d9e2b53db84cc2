// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::runner::{assertion_short_name, AssertionResult};
use rfenable_config::{ScenarioAssertion, ScenarioLimits, StopReason};
use rfenable_core::metrics::LinkSummary;
use rfenable_core::signals::DigitalLevel;
use rfenable_core::snapshot::{BenchCounters, BenchSnapshot, BoardWiring};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::error;

pub const RESULT_SCHEMA_VERSION: &str = "1.0";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NamedU64 {
    pub name: String,
    pub value: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StopReasonDetails {
    pub triggered_stop_condition: StopReason,
    pub triggered_limit: Option<NamedU64>,
    pub observed: Option<NamedU64>,
}

impl StopReasonDetails {
    pub fn new(stop_reason: &StopReason, limits: &ScenarioLimits, iterations: u64) -> Self {
        let (triggered_limit, observed) = match stop_reason {
            StopReason::MaxIterations => (
                Some(NamedU64 {
                    name: "max_iterations".to_string(),
                    value: limits.max_iterations,
                }),
                Some(NamedU64 {
                    name: "iterations".to_string(),
                    value: iterations,
                }),
            ),
            StopReason::Completed | StopReason::RuntimeError | StopReason::ConfigError => {
                (None, None)
            }
        };

        Self {
            triggered_stop_condition: stop_reason.clone(),
            triggered_limit,
            observed,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TestConfig {
    pub script: PathBuf,
    pub board: Option<PathBuf>,
}

/// Final state of the receiver after a run.
#[derive(Debug, Serialize, Clone, Default)]
pub struct ReceiverOutcome {
    pub board: BoardWiring,
    pub enable: DigitalLevel,
    pub transitions: u64,
    pub state: Option<i32>,
    pub log: Vec<String>,
    pub counters: BenchCounters,
    pub link: LinkSummary,
}

#[derive(Debug, Serialize)]
pub struct TestResult {
    pub result_schema_version: String,
    pub status: String,
    pub iterations: u64,
    pub stop_reason: StopReason,
    pub stop_reason_details: StopReasonDetails,
    pub limits: ScenarioLimits,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub assertions: Vec<AssertionResult>,
    pub receiver: ReceiverOutcome,
    pub script_hash: String,
    pub config: TestConfig,
}

impl TestResult {
    pub fn config_error(
        config: TestConfig,
        limits: ScenarioLimits,
        script_bytes: Option<&[u8]>,
        message: String,
    ) -> Self {
        let stop_reason = StopReason::ConfigError;
        Self {
            result_schema_version: RESULT_SCHEMA_VERSION.to_string(),
            status: "error".to_string(),
            iterations: 0,
            stop_reason_details: StopReasonDetails::new(&stop_reason, &limits, 0),
            stop_reason,
            limits,
            message: Some(message),
            assertions: vec![],
            receiver: ReceiverOutcome::default(),
            script_hash: script_bytes.map(hash_bytes).unwrap_or_default(),
            config,
        }
    }
}

pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn write_json<T: Serialize>(path: &Path, value: &T) {
    match std::fs::File::create(path) {
        Ok(f) => {
            if let Err(e) = serde_json::to_writer_pretty(f, value) {
                error!("Failed to write {:?}: {}", path, e);
            }
        }
        Err(e) => error!("Failed to create {:?}: {}", path, e),
    }
}

pub fn write_snapshot(path: &Path, snapshot: &BenchSnapshot) {
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            error!("Failed to create snapshot parent dir {:?}: {}", parent, e);
            return;
        }
    }
    write_json(path, snapshot);
}

/// Writes `result.json`, `serial.log`, `junit.xml` and, when the bench ran,
/// `snapshot.json` into `output_dir`.
pub fn write_artifacts(
    output_dir: &Path,
    result: &TestResult,
    serial: &[u8],
    snapshot: Option<&BenchSnapshot>,
    duration: std::time::Duration,
) {
    if let Err(e) = std::fs::create_dir_all(output_dir) {
        error!("Failed to create output directory {:?}: {}", output_dir, e);
        return;
    }

    write_json(&output_dir.join("result.json"), result);

    if let Some(snapshot) = snapshot {
        write_json(&output_dir.join("snapshot.json"), snapshot);
    }

    let serial_path = output_dir.join("serial.log");
    if let Err(e) = std::fs::write(&serial_path, serial) {
        error!("Failed to write serial.log: {}", e);
    }

    if let Err(e) = write_junit_xml(&output_dir.join("junit.xml"), result, duration) {
        error!("Failed to write junit.xml: {}", e);
    }
}

pub fn write_junit_report(path: &Path, result: &TestResult, duration: std::time::Duration) {
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(e) = write_junit_xml(path, result, duration) {
        error!("Failed to write JUnit report {:?}: {}", path, e);
    }
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Whether the stop reason fails the run unless a matching
/// `expected_stop_reason` assertion passed.
pub fn stop_requires_assertion(stop_reason: &StopReason) -> bool {
    matches!(stop_reason, StopReason::MaxIterations)
}

fn details_text(result: &TestResult) -> String {
    let mut details = String::new();
    details.push_str(&format!(
        "result_schema_version={}\n",
        result.result_schema_version
    ));
    details.push_str(&format!("stop_reason={:?}\n", result.stop_reason));
    if let Some(msg) = &result.message {
        details.push_str(&format!("message={}\n", msg));
    }
    if let Some(t) = &result.stop_reason_details.triggered_limit {
        details.push_str(&format!(
            "stop_reason_details.triggered_limit.{}={}\n",
            t.name, t.value
        ));
    }
    if let Some(o) = &result.stop_reason_details.observed {
        details.push_str(&format!(
            "stop_reason_details.observed.{}={}\n",
            o.name, o.value
        ));
    }
    details.push_str(&format!("iterations={}\n", result.iterations));
    details.push_str(&format!(
        "limits.max_iterations={}\n",
        result.limits.max_iterations
    ));
    details.push_str(&format!("enable={:?}\n", result.receiver.enable));
    details.push_str(&format!("log={:?}\n", result.receiver.log));
    details.push_str(&format!("script_hash={}\n", result.script_hash));
    details.push_str(&format!("script={}\n", result.config.script.display()));
    if let Some(board) = &result.config.board {
        details.push_str(&format!("board={}\n", board.display()));
    }
    if !result.assertions.is_empty() {
        details.push_str("assertions:\n");
        for a in &result.assertions {
            details.push_str(&format!("  - {:?}: {}\n", a.assertion, a.passed));
        }
    }
    details
}

fn write_junit_xml(
    path: &Path,
    result: &TestResult,
    duration: std::time::Duration,
) -> std::io::Result<()> {
    let any_assertion_failed = result.assertions.iter().any(|a| !a.passed);
    let any_expected_stop_reason_matched = result.assertions.iter().any(|a| {
        matches!(a.assertion, ScenarioAssertion::ExpectedStopReason(_)) && a.passed
    });

    let details = details_text(result);
    let time_secs = duration.as_secs_f64();

    let mut tests: u64 = 0;
    let mut failures: u64 = 0;
    let mut errors: u64 = 0;
    let mut testcases = String::new();

    // "run" carries failures that are not tied to one assertion.
    tests += 1;
    testcases.push_str(&format!(
        "  <testcase classname=\"rfenable\" name=\"run\" time=\"{:.6}\">\n",
        time_secs
    ));
    if result.status == "error" {
        let err_type = if result.stop_reason == StopReason::ConfigError {
            "config error"
        } else {
            "runtime error"
        };
        errors += 1;
        testcases.push_str(&format!(
            "    <error message=\"{}\">{}</error>\n",
            xml_escape(err_type),
            xml_escape(&details)
        ));
    } else if result.status == "fail"
        && stop_requires_assertion(&result.stop_reason)
        && !any_expected_stop_reason_matched
    {
        failures += 1;
        testcases.push_str(&format!(
            "    <failure message=\"{}\">{}</failure>\n",
            xml_escape("stop condition requires expected_stop_reason assertion"),
            xml_escape(&details)
        ));
    } else if result.status == "fail" && !any_assertion_failed {
        failures += 1;
        testcases.push_str(&format!(
            "    <failure message=\"failure\">{}</failure>\n",
            xml_escape(&details)
        ));
    }
    testcases.push_str("  </testcase>\n");

    for (idx, a) in result.assertions.iter().enumerate() {
        tests += 1;
        let name = format!(
            "assertion {}: {}",
            idx + 1,
            assertion_short_name(&a.assertion)
        );
        testcases.push_str(&format!(
            "  <testcase classname=\"rfenable\" name=\"{}\" time=\"0.000000\">\n",
            xml_escape(&name)
        ));
        if !a.passed {
            failures += 1;
            testcases.push_str(&format!(
                "    <failure message=\"assertion failed\">{}</failure>\n",
                xml_escape(&format!("{}\n\n{}", name, details))
            ));
        }
        testcases.push_str("  </testcase>\n");
    }

    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push('\n');
    xml.push_str(&format!(
        r#"<testsuite name="rfenable" tests="{}" failures="{}" errors="{}" time="{:.6}">"#,
        tests, failures, errors, time_secs
    ));
    xml.push('\n');
    xml.push_str("  <properties>\n");
    xml.push_str(&format!(
        "    <property name=\"result_schema_version\" value=\"{}\"/>\n",
        xml_escape(&result.result_schema_version)
    ));
    xml.push_str(&format!(
        "    <property name=\"stop_reason\" value=\"{}\"/>\n",
        xml_escape(&format!("{:?}", result.stop_reason))
    ));
    xml.push_str(&format!(
        "    <property name=\"script_hash\" value=\"{}\"/>\n",
        xml_escape(&result.script_hash)
    ));
    xml.push_str("  </properties>\n");
    xml.push_str(&testcases);
    xml.push_str("</testsuite>\n");

    std::fs::write(path, xml)
}
