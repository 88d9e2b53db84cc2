// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

pub mod registers;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, OutputPin};
use embedded_hal::spi::{self, Operation, SpiDevice};
use registers::{address_width, command, ConfigFlags, FifoStatus, Register, Status};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

/// Depth of the hardware RX FIFO.
pub const RX_FIFO_DEPTH: usize = 3;

/// One over-the-air packet as seen by the receiver's antenna.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AirFrame {
    pub channel: u8,
    pub address: Vec<u8>,
    pub payload: Vec<u8>,
}

/// What the receiver did with an [`AirFrame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Delivery {
    Accepted { pipe: u8 },
    NotListening,
    ChannelMismatch,
    AddressMismatch,
    LengthMismatch { expected: u8, actual: usize },
    FifoFull,
}

impl Delivery {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Delivery::Accepted { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LineFault {
    #[error("nRF24 model lock poisoned")]
    Poisoned,
}

impl spi::Error for LineFault {
    fn kind(&self) -> spi::ErrorKind {
        spi::ErrorKind::Other
    }
}

impl digital::Error for LineFault {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Phase {
    #[default]
    Command,
    ReadRegister {
        reg: u8,
        index: usize,
    },
    WriteRegister {
        reg: u8,
        index: usize,
    },
    ReadPayload {
        index: usize,
    },
    Discard,
}

#[derive(Debug, Clone, Serialize)]
struct RxEntry {
    pipe: u8,
    payload: Vec<u8>,
}

/// Byte-level model of an nRF24L01+ behind its SPI port.
///
/// Covers the register file, the RX FIFO and the CE/CSN lines. The
/// transmit side (payload writes, `ACTIVATE`) is accepted on the bus and
/// otherwise ignored.
#[derive(Debug, Serialize)]
pub struct Nrf24Model {
    registers: [u8; 0x20],
    rx_addr_p0: [u8; 5],
    rx_addr_p1: [u8; 5],
    tx_addr: [u8; 5],
    irq: u8,
    ce: bool,
    selected: bool,
    rx_fifo: VecDeque<RxEntry>,
    spi_frames: u64,
    elapsed_ns: u64,

    #[serde(skip)]
    phase: Phase,
    #[serde(skip)]
    payload_out: Vec<u8>,
}

impl Default for Nrf24Model {
    fn default() -> Self {
        Self::new()
    }
}

impl Nrf24Model {
    /// Power-on reset state.
    pub fn new() -> Self {
        let mut registers = [0u8; 0x20];
        registers[Register::Config.addr() as usize] = 0x08;
        registers[Register::EnAa.addr() as usize] = 0x3F;
        registers[Register::EnRxAddr.addr() as usize] = 0x03;
        registers[Register::SetupAw.addr() as usize] = 0x03;
        registers[Register::SetupRetr.addr() as usize] = 0x03;
        registers[Register::RfCh.addr() as usize] = 0x02;
        registers[Register::RfSetup.addr() as usize] = 0x0E;
        registers[Register::RxAddrP2.addr() as usize] = 0xC3;
        registers[Register::RxAddrP3.addr() as usize] = 0xC4;
        registers[Register::RxAddrP4.addr() as usize] = 0xC5;
        registers[Register::RxAddrP5.addr() as usize] = 0xC6;

        Self {
            registers,
            rx_addr_p0: [0xE7; 5],
            rx_addr_p1: [0xC2; 5],
            tx_addr: [0xE7; 5],
            irq: 0,
            ce: false,
            selected: false,
            rx_fifo: VecDeque::new(),
            spi_frames: 0,
            elapsed_ns: 0,
            phase: Phase::Command,
            payload_out: Vec::new(),
        }
    }

    pub fn select(&mut self) {
        self.selected = true;
        self.phase = Phase::Command;
        self.spi_frames += 1;
    }

    pub fn deselect(&mut self) {
        self.selected = false;
        self.phase = Phase::Command;
        self.payload_out.clear();
    }

    pub fn set_ce(&mut self, high: bool) {
        self.ce = high;
    }

    /// Clocks one byte through the SPI port and returns the MISO byte.
    pub fn exchange(&mut self, mosi: u8) -> u8 {
        match self.phase {
            Phase::Command => {
                let status = self.status();
                self.phase = self.decode(mosi);
                status.bits()
            }
            Phase::ReadRegister { reg, index } => {
                self.phase = Phase::ReadRegister {
                    reg,
                    index: index + 1,
                };
                self.read_byte(reg, index)
            }
            Phase::WriteRegister { reg, index } => {
                self.write_byte(reg, index, mosi);
                self.phase = Phase::WriteRegister {
                    reg,
                    index: index + 1,
                };
                0
            }
            Phase::ReadPayload { index } => {
                self.phase = Phase::ReadPayload { index: index + 1 };
                self.payload_out.get(index).copied().unwrap_or(0)
            }
            Phase::Discard => 0,
        }
    }

    fn decode(&mut self, cmd: u8) -> Phase {
        let reg = cmd & command::REGISTER_MASK;
        match cmd {
            c if c & !command::REGISTER_MASK == command::R_REGISTER => {
                Phase::ReadRegister { reg, index: 0 }
            }
            c if c & !command::REGISTER_MASK == command::W_REGISTER => {
                Phase::WriteRegister { reg, index: 0 }
            }
            command::R_RX_PAYLOAD => {
                self.payload_out = self
                    .rx_fifo
                    .pop_front()
                    .map(|entry| entry.payload)
                    .unwrap_or_default();
                Phase::ReadPayload { index: 0 }
            }
            command::R_RX_PL_WID => {
                let width = self.rx_fifo.front().map_or(0, |e| e.payload.len() as u8);
                self.payload_out = vec![width];
                Phase::ReadPayload { index: 0 }
            }
            command::FLUSH_RX => {
                self.rx_fifo.clear();
                Phase::Discard
            }
            _ => Phase::Discard,
        }
    }

    pub fn status(&self) -> Status {
        let flags = Status::from_bits_retain(self.irq) & Status::IRQ;
        flags.with_rx_pipe(self.rx_fifo.front().map(|e| e.pipe))
    }

    pub fn fifo_status(&self) -> FifoStatus {
        let mut fifo = FifoStatus::TX_EMPTY;
        if self.rx_fifo.is_empty() {
            fifo |= FifoStatus::RX_EMPTY;
        }
        if self.rx_fifo.len() >= RX_FIFO_DEPTH {
            fifo |= FifoStatus::RX_FULL;
        }
        fifo
    }

    /// Side-effect free register read.
    pub fn read_byte(&self, reg: u8, index: usize) -> u8 {
        match Register::from_addr(reg) {
            Some(Register::Status) => self.status().bits(),
            Some(Register::FifoStatus) => self.fifo_status().bits(),
            Some(Register::RxAddrP0) => self.rx_addr_p0.get(index).copied().unwrap_or(0),
            Some(Register::RxAddrP1) => self.rx_addr_p1.get(index).copied().unwrap_or(0),
            Some(Register::TxAddr) => self.tx_addr.get(index).copied().unwrap_or(0),
            Some(_) if index == 0 => self.registers[reg as usize],
            _ => 0,
        }
    }

    fn write_byte(&mut self, reg: u8, index: usize, value: u8) {
        let Some(register) = Register::from_addr(reg) else {
            return;
        };
        match register {
            Register::Status if index == 0 => {
                // write 1 to clear
                self.irq &= !(value & Status::IRQ.bits());
            }
            Register::FifoStatus | Register::ObserveTx | Register::Rpd => {}
            Register::RxAddrP0 if index < 5 => self.rx_addr_p0[index] = value,
            Register::RxAddrP1 if index < 5 => self.rx_addr_p1[index] = value,
            Register::TxAddr if index < 5 => self.tx_addr[index] = value,
            Register::RfCh if index == 0 => self.registers[reg as usize] = value & 0x7F,
            Register::RxPwP0
            | Register::RxPwP1
            | Register::RxPwP2
            | Register::RxPwP3
            | Register::RxPwP4
            | Register::RxPwP5
                if index == 0 =>
            {
                self.registers[reg as usize] = value & 0x3F
            }
            r if index == 0 && !r.is_wide_address() => self.registers[reg as usize] = value,
            _ => {}
        }
    }

    pub fn register(&self, reg: Register) -> u8 {
        self.read_byte(reg.addr(), 0)
    }

    pub fn is_listening(&self) -> bool {
        let config = ConfigFlags::from_bits_retain(self.registers[Register::Config.addr() as usize]);
        self.ce && config.contains(ConfigFlags::PWR_UP | ConfigFlags::PRIM_RX)
    }

    pub fn pending(&self) -> usize {
        self.rx_fifo.len()
    }

    /// CSN-framed transactions seen so far.
    pub fn spi_frames(&self) -> u64 {
        self.spi_frames
    }

    /// Time the host spent in delays, in nanoseconds.
    pub fn elapsed_ns(&self) -> u64 {
        self.elapsed_ns
    }

    /// Address of a reading pipe at the configured address width.
    pub fn rx_address(&self, pipe: u8) -> Option<Vec<u8>> {
        let width = address_width(self.register(Register::SetupAw))?;
        let addr = match pipe {
            0 => self.rx_addr_p0[..width].to_vec(),
            1 => self.rx_addr_p1[..width].to_vec(),
            2..=5 => {
                let mut addr = self.rx_addr_p1[..width].to_vec();
                addr[0] = self.registers[Register::rx_addr(pipe)?.addr() as usize];
                addr
            }
            _ => return None,
        };
        Some(addr)
    }

    fn match_pipe(&self, address: &[u8]) -> Option<u8> {
        let enabled = self.register(Register::EnRxAddr);
        (0..6u8)
            .filter(|p| enabled & (1 << p) != 0)
            .find(|p| self.rx_address(*p).as_deref() == Some(address))
    }

    /// Offers a frame to the receiver.
    pub fn deliver(&mut self, frame: &AirFrame) -> Delivery {
        if !self.is_listening() {
            return Delivery::NotListening;
        }
        if frame.channel != self.register(Register::RfCh) {
            return Delivery::ChannelMismatch;
        }
        let Some(pipe) = self.match_pipe(&frame.address) else {
            return Delivery::AddressMismatch;
        };

        let expected = Register::rx_pw(pipe).map_or(0, |r| self.register(r));
        if expected == 0 || frame.payload.len() != expected as usize {
            return Delivery::LengthMismatch {
                expected,
                actual: frame.payload.len(),
            };
        }
        if self.rx_fifo.len() >= RX_FIFO_DEPTH {
            return Delivery::FifoFull;
        }

        self.rx_fifo.push_back(RxEntry {
            pipe,
            payload: frame.payload.clone(),
        });
        self.irq |= Status::RX_DR.bits();
        Delivery::Accepted { pipe }
    }
}

/// Shared handle to one simulated radio. Clones refer to the same chip.
#[derive(Debug, Clone, Default)]
pub struct SimNrf24 {
    model: Arc<Mutex<Nrf24Model>>,
}

impl SimNrf24 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock(&self) -> Result<MutexGuard<'_, Nrf24Model>, LineFault> {
        self.model.lock().map_err(|_| LineFault::Poisoned)
    }

    pub fn spi(&self) -> SimSpi {
        SimSpi {
            model: self.model.clone(),
        }
    }

    pub fn ce(&self) -> SimLine {
        SimLine {
            model: self.model.clone(),
        }
    }

    pub fn delay(&self) -> SimDelay {
        SimDelay {
            model: self.model.clone(),
        }
    }

    pub fn deliver(&self, frame: &AirFrame) -> Result<Delivery, LineFault> {
        Ok(self.lock()?.deliver(frame))
    }

    pub fn snapshot(&self) -> serde_json::Value {
        self.lock()
            .ok()
            .and_then(|m| serde_json::to_value(&*m).ok())
            .unwrap_or(serde_json::Value::Null)
    }
}

/// SPI device of a [`SimNrf24`]. Each transaction frames CSN.
#[derive(Debug, Clone)]
pub struct SimSpi {
    model: Arc<Mutex<Nrf24Model>>,
}

impl spi::ErrorType for SimSpi {
    type Error = LineFault;
}

impl SpiDevice for SimSpi {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), LineFault> {
        let mut model = self.model.lock().map_err(|_| LineFault::Poisoned)?;
        model.select();
        for op in operations.iter_mut() {
            match op {
                Operation::Read(words) => {
                    for w in words.iter_mut() {
                        *w = model.exchange(command::NOP);
                    }
                }
                Operation::Write(words) => {
                    for w in words.iter() {
                        model.exchange(*w);
                    }
                }
                Operation::Transfer(read, write) => {
                    for i in 0..read.len().max(write.len()) {
                        let miso = model.exchange(write.get(i).copied().unwrap_or(command::NOP));
                        if let Some(r) = read.get_mut(i) {
                            *r = miso;
                        }
                    }
                }
                Operation::TransferInPlace(words) => {
                    for w in words.iter_mut() {
                        *w = model.exchange(*w);
                    }
                }
                Operation::DelayNs(ns) => model.elapsed_ns += u64::from(*ns),
            }
        }
        model.deselect();
        Ok(())
    }
}

/// CE input of a [`SimNrf24`].
#[derive(Debug, Clone)]
pub struct SimLine {
    model: Arc<Mutex<Nrf24Model>>,
}

impl SimLine {
    fn drive(&mut self, high: bool) -> Result<(), LineFault> {
        let mut model = self.model.lock().map_err(|_| LineFault::Poisoned)?;
        model.set_ce(high);
        Ok(())
    }
}

impl digital::ErrorType for SimLine {
    type Error = LineFault;
}

impl OutputPin for SimLine {
    fn set_low(&mut self) -> Result<(), LineFault> {
        self.drive(false)
    }

    fn set_high(&mut self) -> Result<(), LineFault> {
        self.drive(true)
    }
}

/// Delay provider that only accounts for the requested time on the model.
#[derive(Debug, Clone)]
pub struct SimDelay {
    model: Arc<Mutex<Nrf24Model>>,
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        if let Ok(mut model) = self.model.lock() {
            model.elapsed_ns += u64::from(ns);
        }
    }
}
