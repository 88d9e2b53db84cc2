#![no_std]
// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

#![no_main]

mod hal1;

use core::fmt::Write;
use cortex_m_rt::entry;
use embedded_hal_02::spi::MODE_0;
use panic_halt as _;
use rfenable_radio::nrf24::{ListenConfig, Nrf24Radio};
use rfenable_radio::{PinOutput, Receiver, StateWidth, BAUD};
use stm32f1xx_hal::{
    pac,
    prelude::*,
    serial::{Config, Serial},
    spi::Spi,
};

// Wiring (Blue Pill):
//   SPI1  SCK PA5, MISO PA6, MOSI PA7
//   CSN   PA4
//   CE    PB0
//   EN    PB10
//   USART1 TX PA9, RX PA10
#[entry]
fn main() -> ! {
    let dp = pac::Peripherals::take().unwrap();
    let cp = cortex_m::Peripherals::take().unwrap();

    let mut flash = dp.FLASH.constrain();
    let rcc = dp.RCC.constrain();
    let clocks = rcc
        .cfgr
        .use_hse(8.MHz())
        .sysclk(72.MHz())
        .pclk1(36.MHz())
        .freeze(&mut flash.acr);

    let mut afio = dp.AFIO.constrain();
    let mut gpioa = dp.GPIOA.split();
    let mut gpiob = dp.GPIOB.split();

    // Configured as output without a write: the line idles low.
    let enable = gpiob.pb10.into_push_pull_output(&mut gpiob.crh);

    let tx_pin = gpioa.pa9.into_alternate_push_pull(&mut gpioa.crh);
    let rx_pin = gpioa.pa10;
    let serial = Serial::new(
        dp.USART1,
        (tx_pin, rx_pin),
        &mut afio.mapr,
        Config::default().baudrate(BAUD.bps()),
        &clocks,
    );
    let (mut log, _rx) = serial.split();

    let sck = gpioa.pa5.into_alternate_push_pull(&mut gpioa.crl);
    let miso = gpioa.pa6;
    let mosi = gpioa.pa7.into_alternate_push_pull(&mut gpioa.crl);
    let spi = Spi::spi1(
        dp.SPI1,
        (sck, miso, mosi),
        &mut afio.mapr,
        MODE_0,
        1.MHz(),
        clocks,
    );
    let csn = gpioa.pa4.into_push_pull_output(&mut gpioa.crl);
    let ce = gpiob.pb0.into_push_pull_output(&mut gpiob.crl);

    let delay = hal1::Delay(cp.SYST.delay(&clocks));
    let mut radio = Nrf24Radio::new(
        hal1::Pin(ce),
        hal1::Device::new(spi, csn),
        delay,
        StateWidth::I16,
    );

    // No recovery: report and keep polling, the loop stays silent until the
    // chip answers.
    if let Err(e) = radio.listen(&ListenConfig::default()) {
        let _ = write!(log, "radio: {:?}\r\n", e);
    }

    Receiver::new(radio, PinOutput(hal1::Pin(enable)), log).run()
}
