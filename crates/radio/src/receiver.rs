// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use core::fmt::Write;

use crate::{EnableOutput, Radio};

/// Observable state of the enable line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnableLevel {
    /// Power-on state: the pin is an output that was never written.
    #[default]
    Low,
    High,
}

impl EnableLevel {
    /// `1` enables; every other value, including garbage, disables.
    pub fn from_state(value: i32) -> Self {
        if value == 1 {
            EnableLevel::High
        } else {
            EnableLevel::Low
        }
    }

    pub fn is_high(self) -> bool {
        matches!(self, EnableLevel::High)
    }

    /// Status line written to the serial log.
    pub fn label(self) -> &'static str {
        match self {
            EnableLevel::High => "ON",
            EnableLevel::Low => "OFF",
        }
    }
}

impl From<bool> for EnableLevel {
    fn from(high: bool) -> Self {
        if high {
            EnableLevel::High
        } else {
            EnableLevel::Low
        }
    }
}

/// The receive loop: owns the radio, the enable line and the log sink.
#[derive(Debug)]
pub struct Receiver<R, O, L> {
    radio: R,
    output: O,
    log: L,
    state: Option<i32>,
    level: EnableLevel,
}

impl<R, O, L> Receiver<R, O, L>
where
    R: Radio,
    O: EnableOutput,
    L: Write,
{
    /// The output is not written until the first message arrives.
    pub fn new(radio: R, output: O, log: L) -> Self {
        Self {
            radio,
            output,
            log,
            state: None,
            level: EnableLevel::Low,
        }
    }

    /// Runs one iteration of the loop.
    ///
    /// Returns the level that was applied, or `None` when no message was
    /// pending (in which case nothing is touched).
    pub fn poll(&mut self) -> Option<EnableLevel> {
        let value = self.radio.try_receive()?;
        self.state = Some(value);

        let level = EnableLevel::from_state(value);
        self.output.set_output(level.is_high());
        self.level = level;

        // Serial.println framing; a full or broken console is ignored.
        let _ = write!(self.log, "{}\r\n", level.label());
        Some(level)
    }

    pub fn run(&mut self) -> ! {
        loop {
            self.poll();
        }
    }

    /// Last received value, `None` until the first message.
    pub fn state(&self) -> Option<i32> {
        self.state
    }

    pub fn level(&self) -> EnableLevel {
        self.level
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn log(&self) -> &L {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut L {
        &mut self.log
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct ScriptedRadio {
        inbox: VecDeque<i32>,
        polls: usize,
    }

    impl ScriptedRadio {
        fn with(values: &[i32]) -> Self {
            Self {
                inbox: values.iter().copied().collect(),
                polls: 0,
            }
        }
    }

    impl Radio for ScriptedRadio {
        fn try_receive(&mut self) -> Option<i32> {
            self.polls += 1;
            self.inbox.pop_front()
        }
    }

    #[derive(Default)]
    struct RecordingOutput {
        writes: Vec<bool>,
    }

    impl EnableOutput for RecordingOutput {
        fn set_output(&mut self, high: bool) {
            self.writes.push(high);
        }
    }

    fn receiver(values: &[i32]) -> Receiver<ScriptedRadio, RecordingOutput, String> {
        Receiver::new(
            ScriptedRadio::with(values),
            RecordingOutput::default(),
            String::new(),
        )
    }

    #[test]
    fn test_one_turns_output_on() {
        let mut rx = receiver(&[1]);
        assert_eq!(rx.poll(), Some(EnableLevel::High));
        assert_eq!(rx.output().writes, vec![true]);
        assert_eq!(rx.log(), "ON\r\n");
        assert_eq!(rx.state(), Some(1));
    }

    #[test]
    fn test_zero_turns_output_off() {
        let mut rx = receiver(&[0]);
        assert_eq!(rx.poll(), Some(EnableLevel::Low));
        assert_eq!(rx.output().writes, vec![false]);
        assert_eq!(rx.log(), "OFF\r\n");
    }

    #[test]
    fn test_negative_value_is_off() {
        let mut rx = receiver(&[-5]);
        assert_eq!(rx.poll(), Some(EnableLevel::Low));
        assert_eq!(rx.output().writes, vec![false]);
        assert_eq!(rx.log(), "OFF\r\n");
        assert_eq!(rx.state(), Some(-5));
    }

    #[test]
    fn test_any_value_other_than_one_is_off() {
        for v in [2, -1, i32::MAX, i32::MIN, 0x0101, 256] {
            assert_eq!(EnableLevel::from_state(v), EnableLevel::Low, "value {v}");
        }
        assert_eq!(EnableLevel::from_state(1), EnableLevel::High);
    }

    #[test]
    fn test_idle_iterations_change_nothing() {
        let mut rx = receiver(&[1]);
        rx.poll();
        for _ in 0..10 {
            assert_eq!(rx.poll(), None);
        }
        assert_eq!(rx.radio().polls, 11);
        assert_eq!(rx.output().writes, vec![true]);
        assert_eq!(rx.log(), "ON\r\n");
        assert_eq!(rx.level(), EnableLevel::High);
        assert_eq!(rx.state(), Some(1));
    }

    #[test]
    fn test_repeated_value_does_not_toggle() {
        let mut rx = receiver(&[1, 1, 0, 0]);
        while rx.poll().is_some() {}
        assert_eq!(rx.output().writes, vec![true, true, false, false]);
        assert_eq!(rx.log(), "ON\r\nON\r\nOFF\r\nOFF\r\n");
        assert_eq!(rx.level(), EnableLevel::Low);
    }

    #[test]
    fn test_initial_state_is_low_and_unwritten() {
        let rx = receiver(&[]);
        assert_eq!(rx.level(), EnableLevel::Low);
        assert_eq!(rx.state(), None);
        assert!(rx.output().writes.is_empty());
        assert!(rx.log().is_empty());
    }

    #[test]
    fn test_borrowed_parts_satisfy_capabilities() {
        let mut radio = ScriptedRadio::with(&[1]);
        let mut out = RecordingOutput::default();
        let mut log = String::new();
        {
            let mut rx = Receiver::new(&mut radio, &mut out, &mut log);
            rx.poll();
        }
        assert_eq!(out.writes, vec![true]);
        assert_eq!(log, "ON\r\n");
    }
}
