// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Radio-controlled enable line.
//!
//! A [`Receiver`] polls a [`Radio`] for a one-integer command and drives an
//! [`EnableOutput`] HIGH when the command is `1` and LOW for anything else,
//! writing `ON` / `OFF` to a serial log. The [`nrf24`] module adapts an
//! `rf24-rs` nRF24L01 driver into the [`Radio`] used on hardware.

#![cfg_attr(not(test), no_std)]

pub mod nrf24;
pub mod receiver;

use embedded_hal::digital::OutputPin;

pub use receiver::{EnableLevel, Receiver};

/// Address of the reading pipe the receiver listens on.
pub const ADDRESS: [u8; 5] = *b"00001";
/// Reading pipe bound to [`ADDRESS`].
pub const PIPE: u8 = 0;
/// Default RF channel (2476 MHz).
pub const CHANNEL: u8 = 76;
/// Static payload width used by the transmitter.
pub const PAYLOAD_SIZE: u8 = 32;
/// Serial console baud rate.
pub const BAUD: u32 = 115_200;

/// Source of decoded state values.
pub trait Radio {
    /// Returns the next received state value, or `None` when nothing is pending.
    fn try_receive(&mut self) -> Option<i32>;
}

/// The digital line gating downstream power.
pub trait EnableOutput {
    fn set_output(&mut self, high: bool);
}

impl<T: Radio + ?Sized> Radio for &mut T {
    fn try_receive(&mut self) -> Option<i32> {
        (**self).try_receive()
    }
}

impl<T: EnableOutput + ?Sized> EnableOutput for &mut T {
    fn set_output(&mut self, high: bool) {
        (**self).set_output(high)
    }
}

/// Adapts an `embedded-hal` output pin into an [`EnableOutput`].
///
/// Pin errors are discarded: the enable line has no failure path.
#[derive(Debug)]
pub struct PinOutput<P>(pub P);

impl<P: OutputPin> EnableOutput for PinOutput<P> {
    fn set_output(&mut self, high: bool) {
        let _ = if high {
            self.0.set_high()
        } else {
            self.0.set_low()
        };
    }
}

/// Width of the integer carried at the start of each payload.
///
/// The transmitter sends a native C `int`: two bytes on AVR boards, four on
/// 32-bit parts. Bytes are little-endian and signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StateWidth {
    #[default]
    I16,
    I32,
}

impl StateWidth {
    pub const fn bytes(self) -> usize {
        match self {
            StateWidth::I16 => 2,
            StateWidth::I32 => 4,
        }
    }

    /// Decodes the leading bytes of `buf`. Missing bytes read as zero.
    pub fn decode(self, buf: &[u8]) -> i32 {
        let mut raw = [0u8; 4];
        let n = buf.len().min(self.bytes());
        raw[..n].copy_from_slice(&buf[..n]);
        match self {
            StateWidth::I16 => i16::from_le_bytes([raw[0], raw[1]]) as i32,
            StateWidth::I32 => i32::from_le_bytes(raw),
        }
    }

    /// Writes `value` into the leading bytes of `out`, truncating to the
    /// width. Returns the number of bytes written.
    pub fn encode(self, value: i32, out: &mut [u8]) -> usize {
        let bytes = value.to_le_bytes();
        let n = out.len().min(self.bytes());
        out[..n].copy_from_slice(&bytes[..n]);
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;

    #[derive(Default)]
    struct LevelPin {
        high: Option<bool>,
    }

    impl ErrorType for LevelPin {
        type Error = Infallible;
    }

    impl OutputPin for LevelPin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.high = Some(false);
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.high = Some(true);
            Ok(())
        }
    }

    #[test]
    fn test_pin_output_drives_embedded_hal_pin() {
        let mut out = PinOutput(LevelPin::default());
        out.set_output(true);
        assert_eq!(out.0.high, Some(true));
        out.set_output(false);
        assert_eq!(out.0.high, Some(false));
    }

    #[test]
    fn test_i16_decode_is_signed_little_endian() {
        assert_eq!(StateWidth::I16.decode(&[0x01, 0x00]), 1);
        assert_eq!(StateWidth::I16.decode(&[0xFB, 0xFF]), -5);
        assert_eq!(StateWidth::I16.decode(&[0x01, 0x00, 0xAA, 0xBB]), 1);
    }

    #[test]
    fn test_i32_decode_uses_four_bytes() {
        assert_eq!(StateWidth::I32.decode(&[0x01, 0x00, 0x00, 0x00]), 1);
        assert_eq!(StateWidth::I32.decode(&[0x01, 0x00, 0x01, 0x00]), 0x0001_0001);
        assert_eq!(StateWidth::I32.decode(&[0x01]), 1);
    }

    #[test]
    fn test_encode_truncates_to_width() {
        let mut buf = [0u8; 4];
        assert_eq!(StateWidth::I16.encode(0x0001_0001, &mut buf), 2);
        assert_eq!(buf, [0x01, 0x00, 0x00, 0x00]);
        assert_eq!(StateWidth::I16.decode(&buf), 1);
    }
}
