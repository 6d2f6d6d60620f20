// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundation.xyz>
// SPDX-License-Identifier: GPL-3.0-or-later

//! Nordic Uart Service ([NUS]) client.
//! Peripherals expose the service; the hub drives it from the central side,
//! writing host frames to `rx` and receiving peer data as `tx` notifications.
//! [NUS]: https://developer.nordicsemi.com/nRF_Connect_SDK/doc/latest/nrf/libraries/bluetooth_services/services/nus.html

use consts::ATT_MTU;
use heapless::Vec;
use nrf_softdevice::gatt_client;

#[gatt_client(uuid = "6E400001-B5A3-F393-E0A9-E50E24DCCA9E")]
pub struct NusClient {
    #[characteristic(uuid = "6E400002-B5A3-F393-E0A9-E50E24DCCA9E", write)]
    rx: Vec<u8, ATT_MTU>,

    #[characteristic(uuid = "6E400003-B5A3-F393-E0A9-E50E24DCCA9E", notify)]
    tx: Vec<u8, ATT_MTU>,
}
