// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use rfenable_config::{PinLevel, ScenarioAssertion, ScenarioStep, StopReason};
use rfenable_core::peripherals::nrf24::AirFrame;
use rfenable_core::signals::DigitalLevel;
use rfenable_core::{Bench, BenchResult};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

#[derive(Debug)]
pub struct ScenarioOutcome {
    pub stop_reason: StopReason,
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AssertionResult {
    pub assertion: ScenarioAssertion,
    pub passed: bool,
}

/// Frame a scenario step puts on the air, with its overrides applied.
fn frame_for_step(bench: &Bench, step: &ScenarioStep) -> Option<AirFrame> {
    let (mut frame, address, channel) = match step {
        ScenarioStep::Send(s) => (bench.frame_for(s.send), &s.address, s.channel),
        ScenarioStep::SendRaw(s) => {
            let mut frame = bench.frame_for(0);
            frame.payload = s.send_raw.clone();
            (frame, &s.address, s.channel)
        }
        ScenarioStep::Idle(_) => return None,
    };
    if let Some(address) = address {
        frame.address = address.as_bytes().to_vec();
    }
    if let Some(channel) = channel {
        frame.channel = channel;
    }
    Some(frame)
}

fn transmit_and_poll(bench: &mut Bench, frame: &AirFrame) -> BenchResult<()> {
    let delivery = bench.transmit_frame(frame)?;
    tracing::debug!("Delivery: {:?}", delivery);
    bench.step();
    Ok(())
}

/// Plays the steps against the bench until they run out or the iteration
/// budget is spent.
pub fn execute_steps(
    bench: &mut Bench,
    steps: &[ScenarioStep],
    max_iterations: u64,
) -> ScenarioOutcome {
    for (idx, step) in steps.iter().enumerate() {
        let used = bench.counters().iterations;
        let remaining = max_iterations.saturating_sub(used);

        if let Some(frame) = frame_for_step(bench, step) {
            if remaining == 0 {
                info!("Iteration budget spent before step {}", idx + 1);
                return ScenarioOutcome {
                    stop_reason: StopReason::MaxIterations,
                    message: None,
                };
            }
            if let Err(e) = transmit_and_poll(bench, &frame) {
                let msg = format!("Step {}: {}", idx + 1, e);
                error!("{}", msg);
                return ScenarioOutcome {
                    stop_reason: StopReason::RuntimeError,
                    message: Some(msg),
                };
            }
            continue;
        }

        let wanted = step.iterations();
        bench.idle(wanted.min(remaining));
        if wanted > remaining {
            info!(
                "Iteration budget spent during step {} ({} of {} idle iterations)",
                idx + 1,
                remaining,
                wanted
            );
            return ScenarioOutcome {
                stop_reason: StopReason::MaxIterations,
                message: None,
            };
        }
    }

    ScenarioOutcome {
        stop_reason: StopReason::Completed,
        message: None,
    }
}

pub fn evaluate_assertion(
    bench: &Bench,
    stop_reason: &StopReason,
    assertion: &ScenarioAssertion,
) -> bool {
    match assertion {
        ScenarioAssertion::Enable(a) => {
            let expected = match a.enable {
                PinLevel::High => DigitalLevel::High,
                PinLevel::Low => DigitalLevel::Low,
            };
            bench.level() == expected
        }
        ScenarioAssertion::LogContains(a) => bench.log().contains(&a.log_contains),
        ScenarioAssertion::LogLines(a) => bench.log_lines() == a.log_lines.as_slice(),
        ScenarioAssertion::Transitions(a) => bench.transitions() == a.transitions,
        ScenarioAssertion::ExpectedStopReason(a) => a.expected_stop_reason == *stop_reason,
    }
}

pub fn evaluate_assertions(
    bench: &Bench,
    stop_reason: &StopReason,
    assertions: &[ScenarioAssertion],
) -> Vec<AssertionResult> {
    assertions
        .iter()
        .map(|assertion| {
            let passed = evaluate_assertion(bench, stop_reason, assertion);
            if !passed {
                error!(
                    "Assertion failed: {:?} (enable={:?}, log={:?})",
                    assertion,
                    bench.level(),
                    bench.log_lines()
                );
            }
            AssertionResult {
                assertion: assertion.clone(),
                passed,
            }
        })
        .collect()
}

pub fn assertion_short_name(assertion: &ScenarioAssertion) -> String {
    const MAX_LEN: usize = 120;
    let s = match assertion {
        ScenarioAssertion::Enable(a) => format!("enable: {:?}", a.enable),
        ScenarioAssertion::LogContains(a) => format!("log_contains: {}", a.log_contains),
        ScenarioAssertion::LogLines(a) => format!("log_lines: {}", a.log_lines.join(",")),
        ScenarioAssertion::Transitions(a) => format!("transitions: {}", a.transitions),
        ScenarioAssertion::ExpectedStopReason(a) => {
            format!("expected_stop_reason: {:?}", a.expected_stop_reason)
        }
    };

    if s.len() <= MAX_LEN {
        return s;
    }

    let mut truncated = s.chars().take(MAX_LEN - 1).collect::<String>();
    truncated.push('…');
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;
    use rfenable_config::{EnableAssertion, IdleStep, LogLinesAssertion, RawStep, SendStep};
    use rfenable_core::BenchConfig;

    fn send(value: i32) -> ScenarioStep {
        ScenarioStep::Send(SendStep {
            send: value,
            address: None,
            channel: None,
        })
    }

    fn idle(n: u64) -> ScenarioStep {
        ScenarioStep::Idle(IdleStep { idle: n })
    }

    #[test]
    fn test_steps_run_to_completion() {
        let mut bench = Bench::new(BenchConfig::default()).unwrap();
        let outcome = execute_steps(&mut bench, &[send(1), idle(3), send(0)], 100);
        assert_eq!(outcome.stop_reason, StopReason::Completed);
        assert_eq!(bench.counters().iterations, 5);
        assert_eq!(bench.log_lines(), &["ON".to_string(), "OFF".to_string()]);
    }

    #[test]
    fn test_budget_cuts_idle_short() {
        let mut bench = Bench::new(BenchConfig::default()).unwrap();
        let outcome = execute_steps(&mut bench, &[send(1), idle(10), send(0)], 4);
        assert_eq!(outcome.stop_reason, StopReason::MaxIterations);
        assert_eq!(bench.counters().iterations, 4);
        assert_eq!(bench.level(), DigitalLevel::High);
    }

    #[test]
    fn test_raw_step_is_sent_unpadded() {
        let mut bench = Bench::new(BenchConfig::default()).unwrap();
        let raw = ScenarioStep::SendRaw(RawStep {
            send_raw: vec![1, 0],
            address: None,
            channel: None,
        });
        execute_steps(&mut bench, &[raw], 10);
        // Short frames fail the static payload width check.
        assert_eq!(bench.counters().frames_dropped, 1);
        assert!(bench.log_lines().is_empty());
    }

    #[test]
    fn test_address_override_misses_receiver() {
        let mut bench = Bench::new(BenchConfig::default()).unwrap();
        let step = ScenarioStep::Send(SendStep {
            send: 1,
            address: Some("00002".to_string()),
            channel: None,
        });
        execute_steps(&mut bench, &[step], 10);
        assert_eq!(bench.level(), DigitalLevel::Low);
    }

    #[test]
    fn test_assertions_against_bench() {
        let mut bench = Bench::new(BenchConfig::default()).unwrap();
        execute_steps(&mut bench, &[send(1)], 10);
        let results = evaluate_assertions(
            &bench,
            &StopReason::Completed,
            &[
                ScenarioAssertion::Enable(EnableAssertion {
                    enable: PinLevel::High,
                }),
                ScenarioAssertion::LogLines(LogLinesAssertion {
                    log_lines: vec!["OFF".to_string()],
                }),
            ],
        );
        assert!(results[0].passed);
        assert!(!results[1].passed);
    }
}
