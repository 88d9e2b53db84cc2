// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::signals::{DigitalLevel, DigitalSignal};
use embedded_hal::digital::{ErrorType, OutputPin};
use std::convert::Infallible;

/// Push-pull output pin. Power-on level is low.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct SimPin {
    pub label: String,
    signal: DigitalSignal,
}

impl SimPin {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            signal: DigitalSignal::default(),
        }
    }

    pub fn level(&self) -> DigitalLevel {
        self.signal.get()
    }

    pub fn writes(&self) -> u64 {
        self.signal.writes()
    }

    pub fn transitions(&self) -> u64 {
        self.signal.transitions()
    }

    pub fn snapshot(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl ErrorType for SimPin {
    type Error = Infallible;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        tracing::trace!("{} -> low", self.label);
        self.signal.set(DigitalLevel::Low);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        tracing::trace!("{} -> high", self.label);
        self.signal.set(DigitalLevel::High);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_starts_low_and_tracks_writes() {
        let mut pin = SimPin::new("enable");
        assert_eq!(pin.level(), DigitalLevel::Low);
        assert_eq!(pin.writes(), 0);

        pin.set_high().unwrap();
        pin.set_high().unwrap();
        pin.set_low().unwrap();
        assert_eq!(pin.level(), DigitalLevel::Low);
        assert_eq!(pin.writes(), 3);
        assert_eq!(pin.transitions(), 2);

        let snap = pin.snapshot();
        assert_eq!(snap["label"], "enable");
        assert_eq!(snap["signal"]["level"], "low");
    }
}
