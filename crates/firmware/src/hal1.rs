// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! embedded-hal 1.0 views of the stm32f1xx-hal peripherals (0.2 traits)
//! the radio driver runs on.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, OutputPin};
use embedded_hal::spi::{self, Operation, SpiDevice};
use embedded_hal_02::blocking::delay::DelayUs;
use embedded_hal_02::blocking::spi::{Transfer, Write};
use embedded_hal_02::digital::v2::OutputPin as OutputPin02;

/// Core clock, used to turn in-transaction delays into cycles.
const SYSCLK_MHZ: u64 = 72;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusFault;

impl spi::Error for BusFault {
    fn kind(&self) -> spi::ErrorKind {
        spi::ErrorKind::Other
    }
}

impl digital::Error for BusFault {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}

pub struct Pin<P>(pub P);

impl<P: OutputPin02> digital::ErrorType for Pin<P> {
    type Error = BusFault;
}

impl<P: OutputPin02> OutputPin for Pin<P> {
    fn set_low(&mut self) -> Result<(), BusFault> {
        self.0.set_low().map_err(|_| BusFault)
    }

    fn set_high(&mut self) -> Result<(), BusFault> {
        self.0.set_high().map_err(|_| BusFault)
    }
}

/// An SPI bus plus its chip-select line.
pub struct Device<SPI, CS> {
    spi: SPI,
    cs: CS,
}

impl<SPI, CS> Device<SPI, CS>
where
    SPI: Transfer<u8> + Write<u8>,
    CS: OutputPin02,
{
    pub fn new(spi: SPI, cs: CS) -> Self {
        Self { spi, cs }
    }

    fn exchange(&mut self, op: &mut Operation<'_, u8>) -> Result<(), BusFault> {
        match op {
            Operation::Read(words) => {
                words.fill(0xFF);
                self.transfer(&mut words[..])
            }
            Operation::Write(words) => self.spi.write(&words[..]).map_err(|_| BusFault),
            Operation::Transfer(read, write) => {
                for i in 0..read.len().max(write.len()) {
                    let mut word = [write.get(i).copied().unwrap_or(0xFF)];
                    self.transfer(&mut word)?;
                    if let Some(r) = read.get_mut(i) {
                        *r = word[0];
                    }
                }
                Ok(())
            }
            Operation::TransferInPlace(words) => self.transfer(&mut words[..]),
            Operation::DelayNs(ns) => {
                let cycles = u64::from(*ns) * SYSCLK_MHZ / 1_000 + 1;
                cortex_m::asm::delay(cycles as u32);
                Ok(())
            }
        }
    }

    fn transfer(&mut self, words: &mut [u8]) -> Result<(), BusFault> {
        self.spi.transfer(words).map(|_| ()).map_err(|_| BusFault)
    }
}

impl<SPI, CS> spi::ErrorType for Device<SPI, CS>
where
    SPI: Transfer<u8> + Write<u8>,
    CS: OutputPin02,
{
    type Error = BusFault;
}

impl<SPI, CS> SpiDevice for Device<SPI, CS>
where
    SPI: Transfer<u8> + Write<u8>,
    CS: OutputPin02,
{
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), BusFault> {
        self.cs.set_low().map_err(|_| BusFault)?;
        let mut res = Ok(());
        for op in operations.iter_mut() {
            res = self.exchange(op);
            if res.is_err() {
                break;
            }
        }
        self.cs.set_high().map_err(|_| BusFault)?;
        res
    }
}

pub struct Delay<D>(pub D);

impl<D: DelayUs<u32>> DelayNs for Delay<D> {
    fn delay_ns(&mut self, ns: u32) {
        self.0.delay_us(ns.div_ceil(1_000));
    }

    fn delay_us(&mut self, us: u32) {
        self.0.delay_us(us);
    }
}
