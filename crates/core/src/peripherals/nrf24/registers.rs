// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! nRF24L01(+) register map and the SPI commands the model decodes.

use bitflags::bitflags;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Register {
    Config = 0x00,
    EnAa = 0x01,
    EnRxAddr = 0x02,
    SetupAw = 0x03,
    SetupRetr = 0x04,
    RfCh = 0x05,
    RfSetup = 0x06,
    Status = 0x07,
    ObserveTx = 0x08,
    Rpd = 0x09,
    RxAddrP0 = 0x0A,
    RxAddrP1 = 0x0B,
    RxAddrP2 = 0x0C,
    RxAddrP3 = 0x0D,
    RxAddrP4 = 0x0E,
    RxAddrP5 = 0x0F,
    TxAddr = 0x10,
    RxPwP0 = 0x11,
    RxPwP1 = 0x12,
    RxPwP2 = 0x13,
    RxPwP3 = 0x14,
    RxPwP4 = 0x15,
    RxPwP5 = 0x16,
    FifoStatus = 0x17,
    Dynpd = 0x1C,
    Feature = 0x1D,
}

impl Register {
    const RX_ADDR: [Register; 6] = [
        Register::RxAddrP0,
        Register::RxAddrP1,
        Register::RxAddrP2,
        Register::RxAddrP3,
        Register::RxAddrP4,
        Register::RxAddrP5,
    ];

    const RX_PW: [Register; 6] = [
        Register::RxPwP0,
        Register::RxPwP1,
        Register::RxPwP2,
        Register::RxPwP3,
        Register::RxPwP4,
        Register::RxPwP5,
    ];

    pub const fn addr(self) -> u8 {
        self as u8
    }

    pub fn rx_addr(pipe: u8) -> Option<Register> {
        Self::RX_ADDR.get(pipe as usize).copied()
    }

    pub fn rx_pw(pipe: u8) -> Option<Register> {
        Self::RX_PW.get(pipe as usize).copied()
    }

    pub fn from_addr(addr: u8) -> Option<Register> {
        let reg = match addr {
            0x00 => Register::Config,
            0x01 => Register::EnAa,
            0x02 => Register::EnRxAddr,
            0x03 => Register::SetupAw,
            0x04 => Register::SetupRetr,
            0x05 => Register::RfCh,
            0x06 => Register::RfSetup,
            0x07 => Register::Status,
            0x08 => Register::ObserveTx,
            0x09 => Register::Rpd,
            0x0A..=0x0F => Self::RX_ADDR[(addr - 0x0A) as usize],
            0x10 => Register::TxAddr,
            0x11..=0x16 => Self::RX_PW[(addr - 0x11) as usize],
            0x17 => Register::FifoStatus,
            0x1C => Register::Dynpd,
            0x1D => Register::Feature,
            _ => return None,
        };
        Some(reg)
    }

    /// Registers holding a full multi-byte address.
    pub fn is_wide_address(self) -> bool {
        matches!(
            self,
            Register::RxAddrP0 | Register::RxAddrP1 | Register::TxAddr
        )
    }
}

/// SPI command opcodes.
pub mod command {
    pub const R_REGISTER: u8 = 0x00;
    pub const W_REGISTER: u8 = 0x20;
    pub const REGISTER_MASK: u8 = 0x1F;
    pub const R_RX_PL_WID: u8 = 0x60;
    pub const R_RX_PAYLOAD: u8 = 0x61;
    pub const FLUSH_RX: u8 = 0xE2;
    pub const NOP: u8 = 0xFF;
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ConfigFlags: u8 {
        const MASK_RX_DR = 1 << 6;
        const MASK_TX_DS = 1 << 5;
        const MASK_MAX_RT = 1 << 4;
        const EN_CRC = 1 << 3;
        const CRCO = 1 << 2;
        const PWR_UP = 1 << 1;
        const PRIM_RX = 1 << 0;
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Status: u8 {
        const RX_DR = 1 << 6;
        const TX_DS = 1 << 5;
        const MAX_RT = 1 << 4;
        const RX_P_NO = 0b111 << 1;
        const TX_FULL = 1 << 0;

        /// Write-1-to-clear interrupt flags.
        const IRQ = Self::RX_DR.bits() | Self::TX_DS.bits() | Self::MAX_RT.bits();
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FifoStatus: u8 {
        const TX_REUSE = 1 << 6;
        const TX_FULL = 1 << 5;
        const TX_EMPTY = 1 << 4;
        const RX_FULL = 1 << 1;
        const RX_EMPTY = 1 << 0;
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RfSetup: u8 {
        const CONT_WAVE = 1 << 7;
        const RF_DR_LOW = 1 << 5;
        const PLL_LOCK = 1 << 4;
        const RF_DR_HIGH = 1 << 3;
        const RF_PWR = 0b11 << 1;
        const LNA_HCURR = 1 << 0;
    }
}

/// `RX_P_NO` value meaning the RX FIFO is empty.
pub const RX_P_NO_EMPTY: u8 = 0b111;

impl Status {
    /// Pipe of the payload at the head of the RX FIFO.
    pub fn rx_pipe(self) -> Option<u8> {
        let pipe = (self.bits() & Self::RX_P_NO.bits()) >> 1;
        (pipe <= 5).then_some(pipe)
    }

    pub fn with_rx_pipe(self, pipe: Option<u8>) -> Self {
        let no = pipe.filter(|p| *p <= 5).unwrap_or(RX_P_NO_EMPTY);
        Self::from_bits_retain((self.bits() & !Self::RX_P_NO.bits()) | (no << 1))
    }
}

/// Address width in bytes encoded by `SETUP_AW`.
pub fn address_width(setup_aw: u8) -> Option<usize> {
    match setup_aw & 0b11 {
        0b01 => Some(3),
        0b10 => Some(4),
        0b11 => Some(5),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_lookup_round_trips_addresses() {
        for addr in 0..0x20u8 {
            if let Some(reg) = Register::from_addr(addr) {
                assert_eq!(reg.addr(), addr);
            }
        }
        assert_eq!(Register::from_addr(0x18), None);
        assert_eq!(Register::rx_addr(5), Some(Register::RxAddrP5));
        assert_eq!(Register::rx_pw(6), None);
    }

    #[test]
    fn test_status_rx_pipe() {
        let empty = Status::from_bits_retain(0x0E);
        assert_eq!(empty.rx_pipe(), None);

        let pipe0 = Status::RX_DR.with_rx_pipe(Some(0));
        assert_eq!(pipe0.rx_pipe(), Some(0));
        assert!(pipe0.contains(Status::RX_DR));

        let pipe3 = empty.with_rx_pipe(Some(3));
        assert_eq!(pipe3.bits(), 0b0000_0110);
    }

    #[test]
    fn test_rf_pwr_bits() {
        let setup = RfSetup::from_bits_retain(0b0000_0111);
        assert_eq!((setup & RfSetup::RF_PWR).bits() >> 1, 3);
        assert!(setup.contains(RfSetup::LNA_HCURR));
    }

    #[test]
    fn test_address_width_encoding() {
        assert_eq!(address_width(0b01), Some(3));
        assert_eq!(address_width(0b11), Some(5));
        assert_eq!(address_width(0b00), None);
    }
}
