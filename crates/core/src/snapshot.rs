// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::signals::DigitalLevel;
use rfenable_config::BoardConfig;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct BenchCounters {
    pub iterations: u64,
    pub frames_sent: u64,
    pub frames_accepted: u64,
    pub frames_dropped: u64,
    pub decisions: u64,
}

/// Board identity and wiring as named in the board config.
///
/// Pins are Arduino digital pin numbers.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BoardWiring {
    pub name: String,
    pub ce_pin: u8,
    pub csn_pin: u8,
    pub enable_pin: u8,
    pub baud: u32,
}

impl BoardWiring {
    /// Label of the simulated enable pin, e.g. `D10`.
    pub fn enable_label(&self) -> String {
        format!("D{}", self.enable_pin)
    }
}

impl From<&BoardConfig> for BoardWiring {
    fn from(board: &BoardConfig) -> Self {
        Self {
            name: board.name.clone(),
            ce_pin: board.ce_pin,
            csn_pin: board.csn_pin,
            enable_pin: board.enable_pin,
            baud: board.baud,
        }
    }
}

impl Default for BoardWiring {
    fn default() -> Self {
        Self::from(&BoardConfig::default())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BenchSnapshot {
    pub board: BoardWiring,
    pub counters: BenchCounters,
    pub enable: DigitalLevel,
    pub transitions: u64,
    /// Last received value; absent until the first message.
    pub state: Option<i32>,
    pub log: Vec<String>,
    pub radio: serde_json::Value,
    pub pin: serde_json::Value,
}
