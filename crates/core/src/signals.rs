// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};

/// Represents a digital signal level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigitalLevel {
    #[default]
    Low,
    High,
}

impl From<bool> for DigitalLevel {
    fn from(b: bool) -> Self {
        if b {
            DigitalLevel::High
        } else {
            DigitalLevel::Low
        }
    }
}

impl From<DigitalLevel> for bool {
    fn from(level: DigitalLevel) -> Self {
        match level {
            DigitalLevel::High => true,
            DigitalLevel::Low => false,
        }
    }
}

/// A driven output line that remembers how often it was written and how
/// often the written level actually changed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DigitalSignal {
    level: DigitalLevel,
    writes: u64,
    transitions: u64,
}

impl DigitalSignal {
    pub fn new(level: DigitalLevel) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    pub fn set(&mut self, level: DigitalLevel) {
        self.writes += 1;
        if level != self.level {
            self.transitions += 1;
        }
        self.level = level;
    }

    pub fn get(&self) -> DigitalLevel {
        self.level
    }

    pub fn writes(&self) -> u64 {
        self.writes
    }

    pub fn transitions(&self) -> u64 {
        self.transitions
    }
}
