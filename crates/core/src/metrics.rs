// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::peripherals::nrf24::{AirFrame, Delivery};
use crate::BenchObserver;
use rfenable_radio::EnableLevel;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Link-level counters collected while a bench runs.
#[derive(Debug, Default)]
pub struct LinkMetrics {
    iterations: AtomicU64,
    frames_accepted: AtomicU64,
    frames_dropped: AtomicU64,
    on_decisions: AtomicU64,
    off_decisions: AtomicU64,
    drops_by_reason: Mutex<HashMap<String, u64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkSummary {
    pub iterations: u64,
    pub frames_accepted: u64,
    pub frames_dropped: u64,
    pub on_decisions: u64,
    pub off_decisions: u64,
    pub drops_by_reason: HashMap<String, u64>,
}

impl LinkMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&self) {
        self.iterations.store(0, Ordering::SeqCst);
        self.frames_accepted.store(0, Ordering::SeqCst);
        self.frames_dropped.store(0, Ordering::SeqCst);
        self.on_decisions.store(0, Ordering::SeqCst);
        self.off_decisions.store(0, Ordering::SeqCst);
        if let Ok(mut m) = self.drops_by_reason.lock() {
            m.clear();
        }
    }

    pub fn get_drops(&self, reason: &str) -> u64 {
        self.drops_by_reason
            .lock()
            .ok()
            .and_then(|m| m.get(reason).copied())
            .unwrap_or(0)
    }

    pub fn summary(&self) -> LinkSummary {
        LinkSummary {
            iterations: self.iterations.load(Ordering::SeqCst),
            frames_accepted: self.frames_accepted.load(Ordering::SeqCst),
            frames_dropped: self.frames_dropped.load(Ordering::SeqCst),
            on_decisions: self.on_decisions.load(Ordering::SeqCst),
            off_decisions: self.off_decisions.load(Ordering::SeqCst),
            drops_by_reason: self
                .drops_by_reason
                .lock()
                .map(|m| m.clone())
                .unwrap_or_default(),
        }
    }
}

fn drop_reason(delivery: &Delivery) -> &'static str {
    match delivery {
        Delivery::Accepted { .. } => "accepted",
        Delivery::NotListening => "not_listening",
        Delivery::ChannelMismatch => "channel_mismatch",
        Delivery::AddressMismatch => "address_mismatch",
        Delivery::LengthMismatch { .. } => "length_mismatch",
        Delivery::FifoFull => "fifo_full",
    }
}

impl BenchObserver for LinkMetrics {
    fn on_frame(&self, _frame: &AirFrame, delivery: &Delivery) {
        if delivery.is_accepted() {
            self.frames_accepted.fetch_add(1, Ordering::Relaxed);
            return;
        }
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut m) = self.drops_by_reason.lock() {
            *m.entry(drop_reason(delivery).to_string()).or_insert(0) += 1;
        }
    }

    fn on_iteration(&self) {
        self.iterations.fetch_add(1, Ordering::Relaxed);
    }

    fn on_decision(&self, _value: i32, level: EnableLevel) {
        match level {
            EnableLevel::High => self.on_decisions.fetch_add(1, Ordering::Relaxed),
            EnableLevel::Low => self.off_decisions.fetch_add(1, Ordering::Relaxed),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> AirFrame {
        AirFrame {
            channel: 76,
            address: b"00001".to_vec(),
            payload: vec![0; 32],
        }
    }

    #[test]
    fn test_counts_frames_by_outcome() {
        let m = LinkMetrics::new();
        m.on_frame(&frame(), &Delivery::Accepted { pipe: 0 });
        m.on_frame(&frame(), &Delivery::AddressMismatch);
        m.on_frame(&frame(), &Delivery::AddressMismatch);
        m.on_frame(&frame(), &Delivery::FifoFull);

        let s = m.summary();
        assert_eq!(s.frames_accepted, 1);
        assert_eq!(s.frames_dropped, 3);
        assert_eq!(m.get_drops("address_mismatch"), 2);
        assert_eq!(m.get_drops("fifo_full"), 1);
    }

    #[test]
    fn test_reset_clears_everything() {
        let m = LinkMetrics::new();
        m.on_iteration();
        m.on_decision(1, EnableLevel::High);
        m.on_frame(&frame(), &Delivery::NotListening);
        m.reset();
        assert_eq!(m.summary(), LinkSummary::default());
    }
}
