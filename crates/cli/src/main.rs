// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

mod report;
mod runner;

use clap::{Parser, Subcommand};
use rfenable_config::{load_scenario, BoardConfig, ScenarioLimits, StopReason};
use rfenable_core::metrics::LinkMetrics;
use rfenable_core::{Bench, BenchConfig, BenchError};
use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};

use report::{ReceiverOutcome, StopReasonDetails, TestConfig, TestResult, RESULT_SCHEMA_VERSION};

const EXIT_PASS: u8 = 0;
const EXIT_ASSERT_FAIL: u8 = 1;
const EXIT_CONFIG_ERROR: u8 = 2;
const EXIT_RUNTIME_ERROR: u8 = 3;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "RF enable receiver bench",
    long_about = None
)]
struct Cli {
    /// Path to the board config (YAML)
    #[arg(short, long)]
    board: Option<PathBuf>,

    /// Write a bench snapshot (JSON) when the interactive session ends.
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Enable debug-level tracing of radio and bench activity
    #[arg(short, long, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Deterministic, CI-friendly runner mode driven by a scenario script (YAML).
    Test(TestArgs),
}

#[derive(Parser, Debug)]
struct TestArgs {
    /// Path to the scenario script (YAML)
    #[arg(short = 'c', long)]
    script: PathBuf,

    /// Path to the board config (YAML); takes precedence over the script
    #[arg(short = 'b', long)]
    board: Option<PathBuf>,

    /// Override max iterations (takes precedence over script)
    #[arg(long)]
    max_iterations: Option<u64>,

    /// Disable serial stdout echo (still captured for assertions/artifacts)
    #[arg(long)]
    no_log_stdout: bool,

    /// Directory to write test artifacts (result.json, serial.log)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Optional path to write a JUnit XML report for CI systems
    #[arg(long)]
    junit: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .init();
    }

    match cli.command {
        Some(Commands::Test(args)) => run_test(args),
        None => run_interactive(cli),
    }
}

fn build_bench(board: &BoardConfig, echo_log: bool) -> Result<Bench, (u8, String)> {
    let config =
        BenchConfig::from_board(board).map_err(|e| (EXIT_CONFIG_ERROR, e.to_string()))?;
    Bench::new(BenchConfig { echo_log, ..config }).map_err(|e| match e {
        BenchError::InvalidConfig(_) => (EXIT_CONFIG_ERROR, e.to_string()),
        _ => (EXIT_RUNTIME_ERROR, e.to_string()),
    })
}

fn run_interactive(cli: Cli) -> ExitCode {
    info!("Starting RF enable bench");

    let board = match &cli.board {
        Some(path) => match BoardConfig::from_file(path) {
            Ok(b) => b,
            Err(e) => {
                error!("{:#}", e);
                return ExitCode::from(EXIT_CONFIG_ERROR);
            }
        },
        None => BoardConfig::default(),
    };

    let mut bench = match build_bench(&board, true) {
        Ok(b) => b,
        Err((code, msg)) => {
            error!("{}", msg);
            return ExitCode::from(code);
        }
    };

    let metrics = Arc::new(LinkMetrics::new());
    bench.add_observer(metrics.clone());

    info!("Type an integer to transmit it, or an empty line to idle one iteration.");
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                error!("Failed to read stdin: {}", e);
                return ExitCode::from(EXIT_RUNTIME_ERROR);
            }
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            bench.step();
            continue;
        }
        let value: i32 = match trimmed.parse() {
            Ok(v) => v,
            Err(_) => {
                warn!("Ignoring '{}': not an integer", trimmed);
                continue;
            }
        };
        match bench.transmit(value) {
            Ok(delivery) if !delivery.is_accepted() => warn!("Frame lost: {:?}", delivery),
            Ok(_) => {}
            Err(e) => {
                error!("{}", e);
                return ExitCode::from(EXIT_RUNTIME_ERROR);
            }
        }
        bench.step();
    }

    let summary = metrics.summary();
    info!("Session finished.");
    info!("Iterations: {}", summary.iterations);
    info!(
        "Frames accepted: {}, dropped: {}",
        summary.frames_accepted, summary.frames_dropped
    );
    info!("Final enable level: {:?}", bench.level());

    if let Some(path) = &cli.snapshot {
        report::write_snapshot(path, &bench.snapshot());
    }

    ExitCode::from(EXIT_PASS)
}

fn run_test(args: TestArgs) -> ExitCode {
    let start = std::time::Instant::now();
    let script_bytes = std::fs::read(&args.script).ok();

    let loaded = match load_scenario(&args.script, args.board.as_deref()) {
        Ok(l) => l,
        Err(e) => {
            let msg = format!("{:#}", e);
            return config_error(&args, None, ScenarioLimits::default(), script_bytes, msg);
        }
    };

    let limits = ScenarioLimits {
        max_iterations: args
            .max_iterations
            .unwrap_or(loaded.script.limits.max_iterations),
    };

    // Guard against accidentally huge runs from CI misconfiguration.
    const MAX_ALLOWED_ITERATIONS: u64 = 50_000_000;
    if limits.max_iterations > MAX_ALLOWED_ITERATIONS || limits.max_iterations == 0 {
        let msg = format!(
            "max_iterations {} must be in 1..={}",
            limits.max_iterations, MAX_ALLOWED_ITERATIONS
        );
        return config_error(&args, loaded.board_path, limits, script_bytes, msg);
    }

    let mut bench = match build_bench(&loaded.board, false) {
        Ok(b) => b,
        Err((EXIT_CONFIG_ERROR, msg)) => {
            return config_error(&args, loaded.board_path, limits, script_bytes, msg);
        }
        Err((code, msg)) => {
            error!("{}", msg);
            return ExitCode::from(code);
        }
    };

    let serial = Arc::new(Mutex::new(Vec::new()));
    bench
        .log_mut()
        .set_sink(Some(serial.clone()), !args.no_log_stdout);
    let metrics = Arc::new(LinkMetrics::new());
    bench.add_observer(metrics.clone());

    info!(
        "Running {} steps ({} planned iterations, limit {})",
        loaded.script.steps.len(),
        loaded.script.planned_iterations(),
        limits.max_iterations
    );
    let outcome = runner::execute_steps(&mut bench, &loaded.script.steps, limits.max_iterations);
    let assertions =
        runner::evaluate_assertions(&bench, &outcome.stop_reason, &loaded.script.assertions);

    let all_passed = assertions.iter().all(|a| a.passed);
    let expected_stop_reason_matched = assertions.iter().any(|a| {
        a.passed
            && matches!(
                a.assertion,
                rfenable_config::ScenarioAssertion::ExpectedStopReason(_)
            )
    });
    let runtime_error = outcome.stop_reason == StopReason::RuntimeError;
    let unexpected_stop =
        report::stop_requires_assertion(&outcome.stop_reason) && !expected_stop_reason_matched;

    let (status, code) = if !all_passed || unexpected_stop {
        ("fail", EXIT_ASSERT_FAIL)
    } else if runtime_error && !expected_stop_reason_matched {
        ("error", EXIT_RUNTIME_ERROR)
    } else {
        ("pass", EXIT_PASS)
    };

    let iterations = bench.counters().iterations;
    let result = TestResult {
        result_schema_version: RESULT_SCHEMA_VERSION.to_string(),
        status: status.to_string(),
        iterations,
        stop_reason_details: StopReasonDetails::new(&outcome.stop_reason, &limits, iterations),
        stop_reason: outcome.stop_reason,
        limits,
        message: outcome.message,
        assertions,
        receiver: ReceiverOutcome {
            board: bench.config().wiring.clone(),
            enable: bench.level(),
            transitions: bench.transitions(),
            state: bench.state(),
            log: bench.log_lines().to_vec(),
            counters: bench.counters().clone(),
            link: metrics.summary(),
        },
        script_hash: script_bytes
            .as_deref()
            .map(report::hash_bytes)
            .unwrap_or_default(),
        config: TestConfig {
            script: args.script.clone(),
            board: loaded.board_path,
        },
    };

    info!(
        "Scenario {} after {} iterations ({:?})",
        status, iterations, result.stop_reason
    );

    let duration = start.elapsed();
    if let Some(output_dir) = &args.output_dir {
        let bytes = serial.lock().map(|g| g.clone()).unwrap_or_default();
        report::write_artifacts(output_dir, &result, &bytes, Some(&bench.snapshot()), duration);
    }
    if let Some(junit) = &args.junit {
        report::write_junit_report(junit, &result, duration);
    }

    ExitCode::from(code)
}

fn config_error(
    args: &TestArgs,
    board: Option<PathBuf>,
    limits: ScenarioLimits,
    script_bytes: Option<Vec<u8>>,
    message: String,
) -> ExitCode {
    error!("{}", message);
    let result = TestResult::config_error(
        TestConfig {
            script: args.script.clone(),
            board: board.or_else(|| args.board.clone()),
        },
        limits,
        script_bytes.as_deref(),
        message,
    );

    // Best-effort: the caller requests artifacts, but writes may fail.
    let duration = std::time::Duration::from_secs(0);
    if let Some(output_dir) = &args.output_dir {
        report::write_artifacts(output_dir, &result, b"", None, duration);
    }
    if let Some(junit) = &args.junit {
        report::write_junit_report(junit, &result, duration);
    }
    ExitCode::from(EXIT_CONFIG_ERROR)
}
