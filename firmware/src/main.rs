// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundation.xyz>
// SPDX-License-Identifier: GPL-3.0-or-later

#![no_std]
#![no_main]

mod central;
mod comms;
mod nus;
mod registry;

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, AtomicU8};

#[cfg(feature = "debug")]
use defmt_rtt as _;
// global logger
use embassy_nrf as _;
// time driver
use panic_probe as _;

use central::{initialize_sd, run_central};
use comms::comms_task;
use consts::{ATT_MTU, BT_MAX_NUM_PKT, MAX_PERIPHERAL_LINKS};
use defmt::{info, unwrap};
use embassy_executor::Spawner;
use embassy_nrf::buffered_uarte::{self, BufferedUarte};
use embassy_nrf::gpio::{Level, Output, OutputDrive};
use embassy_nrf::interrupt::{self, InterruptExt};
use embassy_nrf::peripherals::UARTE0;
use embassy_nrf::{bind_interrupts, uarte};
use embassy_sync::blocking_mutex::raw::ThreadModeRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::mutex::Mutex;
use heapless::Vec;
use host_protocol::LinkId;
use nrf_softdevice::ble::get_address;
use nrf_softdevice::Softdevice;
use registry::LinkRegistry;
use static_cell::StaticCell;

bind_interrupts!(struct Irqs {
    UARTE0_UART0 => buffered_uarte::InterruptHandler<UARTE0>;
});

#[cfg(not(feature = "debug"))]
mod dummy_logging {
    #[defmt::global_logger]
    struct Logger;

    unsafe impl defmt::Logger for Logger {
        fn acquire() {}

        unsafe fn flush() {}

        unsafe fn release() {}

        unsafe fn write(_bytes: &[u8]) {}
    }
}

/// Host frames queued per link before SendData reports BufferFull.
pub const LINK_TX_DEPTH: usize = 2;

// Signal for BT state
static BT_STATE: AtomicBool = AtomicBool::new(false);

/// Frames received from peripherals, tagged with the link they arrived on.
/// The host drains this with GetReceivedData polls.
static BT_DATA_RX: Channel<ThreadModeRawMutex, (LinkId, Vec<u8, ATT_MTU>), BT_MAX_NUM_PKT> =
    Channel::new();

/// Host frames waiting to be written out on each link.
static BT_DATA_TX: [Channel<ThreadModeRawMutex, Vec<u8, ATT_MTU>, LINK_TX_DEPTH>;
    MAX_PERIPHERAL_LINKS] = [const { Channel::new() }; MAX_PERIPHERAL_LINKS];

/// Last RSSI sample per link, 0 while the link is down.
static RSSI_VALUES: [AtomicU8; MAX_PERIPHERAL_LINKS] =
    [const { AtomicU8::new(0) }; MAX_PERIPHERAL_LINKS];

/// Bookkeeping for every peripheral link slot.
static REGISTRY: Mutex<ThreadModeRawMutex, LinkRegistry> = Mutex::new(LinkRegistry::new());

/// nRF -> MPU IRQ output pin
static IRQ_OUT_PIN: Mutex<ThreadModeRawMutex, RefCell<Option<Output<'static>>>> =
    Mutex::new(RefCell::new(None));

#[embassy_executor::task]
async fn softdevice_task(sd: &'static Softdevice) -> ! {
    info!("SD is running");
    sd.run().await
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let mut conf = embassy_nrf::config::Config::default();
    conf.hfclk_source = embassy_nrf::config::HfclkSource::ExternalXtal;
    conf.lfclk_source = embassy_nrf::config::LfclkSource::ExternalXtal;

    conf.gpiote_interrupt_priority = interrupt::Priority::P2;
    conf.time_interrupt_priority = interrupt::Priority::P2;

    let p = embassy_nrf::init(conf);

    let uart = {
        // Configure UART to the MPU
        let mut config = uarte::Config::default();
        config.parity = uarte::Parity::EXCLUDED;
        config.baudrate = uarte::Baudrate::BAUD460800;

        static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
        static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
        BufferedUarte::new(
            p.UARTE0,
            p.TIMER1,
            p.PPI_CH0,
            p.PPI_CH1,
            p.PPI_GROUP0,
            Irqs,
            p.P0_08,
            p.P0_06,
            config,
            RX_BUF.init([0; 256]),
            TX_BUF.init([0; 256]),
        )
    };

    // Configure the OUT IRQ pin
    {
        IRQ_OUT_PIN
            .lock()
            .await
            .borrow_mut()
            .replace(Output::new(p.P0_20, Level::High, OutputDrive::Standard));
    }

    // set priority to avoid collisions with softdevice
    interrupt::UARTE0_UART0.set_priority(interrupt::Priority::P3);

    let sd = initialize_sd();

    unwrap!(spawner.spawn(softdevice_task(sd)), "Spawning the softdevice failed");

    // Get Bt device address
    let mut address = get_address(sd).bytes();
    address.reverse();
    info!("Address : {=[u8;6]:#X}", address);

    unwrap!(spawner.spawn(comms_task(uart)), "Spawning the comms task failed");

    info!("Init tasks");
    run_central(sd, spawner).await;
}
