// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

pub mod bench;
pub mod metrics;
pub mod peripherals;
pub mod signals;
pub mod snapshot;

use peripherals::nrf24::{AirFrame, Delivery, LineFault, SimLine, SimSpi};
use rfenable_radio::nrf24::Error as DriverError;
use rfenable_radio::EnableLevel;

pub use bench::{Bench, BenchConfig};

#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    #[error("Radio driver error: {0}")]
    Radio(String),
    #[error("Invalid board configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Line(#[from] LineFault),
}

pub type BenchResult<T> = Result<T, BenchError>;

impl From<DriverError<SimSpi, SimLine>> for BenchError {
    fn from(e: DriverError<SimSpi, SimLine>) -> Self {
        BenchError::Radio(format!("{:?}", e))
    }
}

/// Trait for observing bench events in a modular way.
pub trait BenchObserver: std::fmt::Debug + Send + Sync {
    fn on_frame(&self, _frame: &AirFrame, _delivery: &Delivery) {}
    fn on_iteration(&self) {}
    fn on_decision(&self, _value: i32, _level: EnableLevel) {}
}
