// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::peripherals::nrf24::registers::Register;
use crate::peripherals::nrf24::{AirFrame, Delivery, SimDelay, SimLine, SimNrf24, SimSpi};
use crate::peripherals::pin::SimPin;
use crate::peripherals::serial::LineLog;
use crate::signals::DigitalLevel;
use crate::snapshot::{BenchCounters, BenchSnapshot, BoardWiring};
use crate::{BenchError, BenchObserver, BenchResult};
use rfenable_config::BoardConfig;
use rfenable_radio::nrf24::{ListenConfig, Nrf24Radio, PaLevel};
use rfenable_radio::{EnableLevel, PinOutput, Receiver, StateWidth};
use std::sync::Arc;

pub type SimRadio = Nrf24Radio<SimSpi, SimLine, SimDelay>;
pub type SimReceiver = Receiver<SimRadio, PinOutput<SimPin>, LineLog>;

/// Receiver parameters for a bench. Defaults equal the firmware constants.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    pub wiring: BoardWiring,
    pub address: Vec<u8>,
    pub pipe: u8,
    pub channel: u8,
    pub pa_level: PaLevel,
    pub payload_size: u8,
    pub state_width: StateWidth,
    pub echo_log: bool,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            wiring: BoardWiring::default(),
            address: rfenable_radio::ADDRESS.to_vec(),
            pipe: rfenable_radio::PIPE,
            channel: rfenable_radio::CHANNEL,
            pa_level: PaLevel::Min,
            payload_size: rfenable_radio::PAYLOAD_SIZE,
            state_width: StateWidth::I16,
            echo_log: false,
        }
    }
}

impl BenchConfig {
    pub fn from_board(board: &BoardConfig) -> BenchResult<Self> {
        board
            .validate()
            .map_err(|e| BenchError::InvalidConfig(format!("{:#}", e)))?;

        let pa_level = match board.pa_level {
            rfenable_config::PaLevel::Min => PaLevel::Min,
            rfenable_config::PaLevel::Low => PaLevel::Low,
            rfenable_config::PaLevel::High => PaLevel::High,
            rfenable_config::PaLevel::Max => PaLevel::Max,
        };
        let state_width = match board.state_width {
            rfenable_config::StateWidth::I16 => StateWidth::I16,
            rfenable_config::StateWidth::I32 => StateWidth::I32,
        };

        Ok(Self {
            wiring: BoardWiring::from(board),
            address: board.address_bytes(),
            pipe: board.pipe,
            channel: board.channel,
            pa_level,
            payload_size: board.payload_size,
            state_width,
            echo_log: false,
        })
    }
}

/// A receiver running against a simulated nRF24L01 and enable pin.
#[derive(Debug)]
pub struct Bench {
    air: SimNrf24,
    receiver: SimReceiver,
    config: BenchConfig,
    listen_address: Vec<u8>,
    channel: u8,
    payload_size: u8,
    observers: Vec<Arc<dyn BenchObserver>>,
    counters: BenchCounters,
}

impl Bench {
    /// Runs the firmware's setup sequence against a fresh radio.
    pub fn new(config: BenchConfig) -> BenchResult<Self> {
        let width = config.address.len();
        if !(3..=5).contains(&width) {
            return Err(BenchError::InvalidConfig(format!(
                "address must be 3 to 5 bytes, got {}",
                width
            )));
        }
        let (Some(_), Some(pw_reg)) = (Register::rx_addr(config.pipe), Register::rx_pw(config.pipe))
        else {
            return Err(BenchError::InvalidConfig(format!(
                "pipe {} out of range (0..=5)",
                config.pipe
            )));
        };

        let wiring = &config.wiring;
        tracing::info!(
            "Board '{}': CE D{}, CSN D{}, enable D{}, serial {} baud",
            wiring.name,
            wiring.ce_pin,
            wiring.csn_pin,
            wiring.enable_pin,
            wiring.baud
        );

        let air = SimNrf24::new();
        let mut radio = Nrf24Radio::new(air.ce(), air.spi(), air.delay(), config.state_width);
        radio.listen(&ListenConfig {
            address: &config.address,
            pipe: config.pipe,
            channel: config.channel,
            pa_level: config.pa_level,
            payload_size: config.payload_size,
        })?;

        let (listen_address, channel, payload_size) = {
            let model = air.lock()?;
            tracing::debug!("Radio settled after {} us", model.elapsed_ns() / 1_000);
            let address = model.rx_address(config.pipe).ok_or_else(|| {
                BenchError::InvalidConfig(format!("pipe {} has no address", config.pipe))
            })?;
            (address, model.register(Register::RfCh), model.register(pw_reg))
        };

        tracing::info!(
            "Listening on pipe {} address {:?} channel {} ({:?})",
            config.pipe,
            String::from_utf8_lossy(&listen_address),
            channel,
            config.pa_level
        );

        let receiver = Receiver::new(
            radio,
            PinOutput(SimPin::new(config.wiring.enable_label())),
            LineLog::new(config.echo_log),
        );

        Ok(Self {
            air,
            receiver,
            config,
            listen_address,
            channel,
            payload_size,
            observers: Vec::new(),
            counters: BenchCounters::default(),
        })
    }

    pub fn add_observer(&mut self, observer: Arc<dyn BenchObserver>) {
        self.observers.push(observer);
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// Full address the receiver answers to on its pipe.
    pub fn listen_address(&self) -> &[u8] {
        &self.listen_address
    }

    /// Builds the frame a matching transmitter would send for `value`.
    pub fn frame_for(&self, value: i32) -> AirFrame {
        let mut payload = vec![0u8; self.payload_size as usize];
        self.config.state_width.encode(value, &mut payload);
        AirFrame {
            channel: self.channel,
            address: self.listen_address.clone(),
            payload,
        }
    }

    pub fn transmit(&mut self, value: i32) -> BenchResult<Delivery> {
        let frame = self.frame_for(value);
        self.transmit_frame(&frame)
    }

    pub fn transmit_frame(&mut self, frame: &AirFrame) -> BenchResult<Delivery> {
        let delivery = self.air.deliver(frame)?;
        self.counters.frames_sent += 1;
        match delivery {
            Delivery::Accepted { pipe } => {
                self.counters.frames_accepted += 1;
                tracing::debug!("Frame accepted on pipe {}", pipe);
            }
            Delivery::FifoFull => {
                self.counters.frames_dropped += 1;
                tracing::warn!("RX FIFO full, frame lost");
            }
            other => {
                self.counters.frames_dropped += 1;
                tracing::debug!("Frame dropped: {:?}", other);
            }
        }
        for observer in &self.observers {
            observer.on_frame(frame, &delivery);
        }
        Ok(delivery)
    }

    /// One pass of the receive loop.
    pub fn step(&mut self) -> Option<EnableLevel> {
        self.counters.iterations += 1;
        for observer in &self.observers {
            observer.on_iteration();
        }

        let decision = self.receiver.poll();
        if let Some(level) = decision {
            self.counters.decisions += 1;
            let value = self.receiver.state().unwrap_or_default();
            tracing::debug!("State {} -> enable {:?}", value, level);
            for observer in &self.observers {
                observer.on_decision(value, level);
            }
        }
        decision
    }

    /// Disables a reading pipe the way the firmware would.
    pub fn close_reading_pipe(&mut self, pipe: u8) -> BenchResult<()> {
        self.receiver.radio_mut().close_reading_pipe(pipe)?;
        Ok(())
    }

    /// Puts the radio in power-down; frames are no longer received.
    pub fn power_down(&mut self) -> BenchResult<()> {
        self.receiver.radio_mut().power_down()?;
        Ok(())
    }

    /// Runs `iterations` passes; returns how many of them applied a level.
    pub fn idle(&mut self, iterations: u64) -> u64 {
        (0..iterations).filter(|_| self.step().is_some()).count() as u64
    }

    pub fn level(&self) -> DigitalLevel {
        self.pin().level()
    }

    pub fn enable_level(&self) -> EnableLevel {
        self.receiver.level()
    }

    pub fn state(&self) -> Option<i32> {
        self.receiver.state()
    }

    pub fn pin(&self) -> &SimPin {
        &self.receiver.output().0
    }

    pub fn transitions(&self) -> u64 {
        self.pin().transitions()
    }

    pub fn log(&self) -> &LineLog {
        self.receiver.log()
    }

    pub fn log_mut(&mut self) -> &mut LineLog {
        self.receiver.log_mut()
    }

    pub fn log_lines(&self) -> &[String] {
        self.receiver.log().lines()
    }

    pub fn air(&self) -> &SimNrf24 {
        &self.air
    }

    pub fn counters(&self) -> &BenchCounters {
        &self.counters
    }

    pub fn snapshot(&self) -> BenchSnapshot {
        BenchSnapshot {
            board: self.config.wiring.clone(),
            counters: self.counters.clone(),
            enable: self.level(),
            transitions: self.transitions(),
            state: self.state(),
            log: self.log_lines().to_vec(),
            radio: self.air.snapshot(),
            pin: self.pin().snapshot(),
        }
    }
}
