// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! nRF24L01 receive path on top of the `rf24-rs` driver.
//!
//! `rf24-rs` ports the RF24 Arduino library, so a transmitter built against
//! that library (static 32-byte payloads, 16-bit CRC, auto-ack, 1 Mbps) is
//! received unchanged.

use core::fmt;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;
use rf24_rs::radio::{prelude::*, Nrf24Error, RF24};

pub use rf24_rs::PaLevel;

use crate::{Radio, StateWidth};

/// Largest static payload the chip accepts.
pub const MAX_PAYLOAD: usize = 32;

/// Driver error for a radio on bus `SPI` with CE pin `DO`.
pub type Error<SPI, DO> = Nrf24Error<
    <SPI as embedded_hal::spi::ErrorType>::Error,
    <DO as embedded_hal::digital::ErrorType>::Error,
>;

/// Receive-side settings applied by [`Nrf24Radio::listen`].
#[derive(Debug, Clone, Copy)]
pub struct ListenConfig<'a> {
    pub address: &'a [u8],
    pub pipe: u8,
    pub channel: u8,
    pub pa_level: PaLevel,
    pub payload_size: u8,
}

impl Default for ListenConfig<'static> {
    fn default() -> Self {
        Self {
            address: &crate::ADDRESS,
            pipe: crate::PIPE,
            channel: crate::CHANNEL,
            pa_level: PaLevel::Min,
            payload_size: crate::PAYLOAD_SIZE,
        }
    }
}

/// An `rf24-rs` radio seen as a source of state values.
pub struct Nrf24Radio<SPI, DO, DELAY> {
    radio: RF24<SPI, DO, DELAY>,
    state_width: StateWidth,
}

impl<SPI, DO, DELAY> fmt::Debug for Nrf24Radio<SPI, DO, DELAY> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Nrf24Radio")
            .field("state_width", &self.state_width)
            .finish_non_exhaustive()
    }
}

impl<SPI, DO, DELAY> Nrf24Radio<SPI, DO, DELAY>
where
    SPI: SpiDevice,
    DO: OutputPin,
    DELAY: DelayNs,
{
    /// Wraps a driver on CE pin `ce`, SPI device `spi` (CSN framed by the
    /// device) and `delay`.
    pub fn new(ce: DO, spi: SPI, delay: DELAY, state_width: StateWidth) -> Self {
        Self {
            radio: RF24::new(ce, spi, delay),
            state_width,
        }
    }

    /// Resets the chip, binds the reading pipe and enters RX mode.
    ///
    /// `init` leaves the RF24 defaults (channel 76, 32-byte payloads,
    /// 5-byte addresses); they are rewritten only to match `config`.
    pub fn listen(&mut self, config: &ListenConfig<'_>) -> Result<(), Error<SPI, DO>> {
        self.radio.init()?;
        self.radio.set_channel(config.channel)?;
        self.radio.set_payload_length(config.payload_size)?;
        self.radio.set_address_length(config.address.len() as u8)?;
        self.radio.open_rx_pipe(config.pipe, config.address)?;
        self.radio.set_pa_level(config.pa_level)?;
        self.radio.as_rx()?;
        Ok(())
    }

    pub fn close_reading_pipe(&mut self, pipe: u8) -> Result<(), Error<SPI, DO>> {
        self.radio.close_rx_pipe(pipe)
    }

    pub fn power_down(&mut self) -> Result<(), Error<SPI, DO>> {
        self.radio.power_down()
    }

    pub fn state_width(&self) -> StateWidth {
        self.state_width
    }
}

impl<SPI, DO, DELAY> Radio for Nrf24Radio<SPI, DO, DELAY>
where
    SPI: SpiDevice,
    DO: OutputPin,
    DELAY: DelayNs,
{
    /// Bus faults read as "nothing received"; the receive path has no error
    /// channel.
    fn try_receive(&mut self) -> Option<i32> {
        if !self.radio.available().ok()? {
            return None;
        }
        let width = self.state_width.bytes();
        let mut buf = [0u8; MAX_PAYLOAD];
        self.radio.read(&mut buf, Some(width as u8)).ok()?;
        Some(self.state_width.decode(&buf[..width]))
    }
}
