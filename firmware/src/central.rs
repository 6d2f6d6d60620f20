// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundation.xyz>
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::nus::{NusClient, NusClientEvent};
use crate::{BT_DATA_RX, BT_DATA_TX, BT_STATE, REGISTRY, RSSI_VALUES};
use consts::{ATT_MTU, DEVICE_NAME, MAX_PEER_NAME_LEN, MAX_PERIPHERAL_LINKS, NUS_UUID};
use core::mem;
use core::slice;
use core::sync::atomic::Ordering;
use defmt::{debug, error, info, unwrap};
use embassy_executor::Spawner;
use embassy_time::Timer;
use futures::future::{select, Either};
use futures::pin_mut;
use heapless::{String, Vec};
use host_protocol::LinkId;
use link_state::PeripheralSlot;
use nrf_softdevice::ble::{central, gatt_client, Address, Connection};
use nrf_softdevice::{raw, Softdevice};

// AD types carrying the 128-bit service UUID list and the local name.
const AD_UUID128_INCOMPLETE: u8 = 0x06;
const AD_UUID128_COMPLETE: u8 = 0x07;
const AD_NAME_SHORTENED: u8 = 0x08;
const AD_NAME_COMPLETE: u8 = 0x09;

// Get connection interval with macro
// to get 15ms just call ci_ms!(15)
macro_rules! ci_ms {
    ($a:expr) => {{
        let ms = ($a as f32 * 1000.0) / 1250.0;
        debug!("ci units: {}", ms);
        ms as u16
    }};
}

pub fn initialize_sd() -> &'static Softdevice {
    let config = nrf_softdevice::Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_XTAL as u8,
            rc_ctiv: 0,
            rc_temp_ctiv: 0,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_20_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: MAX_PERIPHERAL_LINKS as u8,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t {
            att_mtu: ATT_MTU as u16,
        }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: 0,
            central_role_count: MAX_PERIPHERAL_LINKS as u8,
            central_sec_count: 0,
            _bitfield_1: raw::ble_gap_cfg_role_count_t::new_bitfield_1(0),
        }),
        gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
            p_value: DEVICE_NAME.as_ptr() as _,
            current_len: DEVICE_NAME.len() as u16,
            max_len: DEVICE_NAME.len() as u16,
            write_perm: unsafe { mem::zeroed() },
            _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(raw::BLE_GATTS_VLOC_STACK as u8),
        }),

        ..Default::default()
    };

    Softdevice::enable(&config)
}

/// Blocks until the host has enabled radio work.
async fn wait_until_enabled() {
    while !BT_STATE.load(Ordering::Relaxed) {
        Timer::after_millis(200).await;
    }
}

/// One AD structure's payload, picked out of raw advertising data.
fn adv_field(data: &[u8], ad_type: u8) -> Option<&[u8]> {
    let mut offset = 0;
    while offset < data.len() {
        let len = data[offset] as usize;
        if len == 0 || offset + 1 + len > data.len() {
            return None;
        }
        if data[offset + 1] == ad_type {
            return Some(&data[offset + 2..offset + 1 + len]);
        }
        offset += 1 + len;
    }
    None
}

/// Does this advertisement carry the NUS UUID?
fn advertises_nus(data: &[u8]) -> bool {
    let nus = NUS_UUID.to_le_bytes();
    adv_field(data, AD_UUID128_COMPLETE)
        .or_else(|| adv_field(data, AD_UUID128_INCOMPLETE))
        .map_or(false, |uuids| uuids.chunks_exact(16).any(|u| *u == nus))
}

/// The advertised local name, empty if the peer does not include one.
fn peer_name(data: &[u8]) -> String<MAX_PEER_NAME_LEN> {
    let mut name = String::new();
    let field = adv_field(data, AD_NAME_COMPLETE).or_else(|| adv_field(data, AD_NAME_SHORTENED));
    if let Some(bytes) = field {
        if let Ok(text) = core::str::from_utf8(bytes) {
            for c in text.chars() {
                if name.push(c).is_err() {
                    break;
                }
            }
        }
    }
    name
}

/// Scans until a NUS peripheral we are not already linked to shows up.
async fn scan_for_uart_peer(
    sd: &Softdevice,
    skip: &Vec<Address, MAX_PERIPHERAL_LINKS>,
) -> (Address, String<MAX_PEER_NAME_LEN>) {
    let config = central::ScanConfig::default();
    let res = central::scan(sd, &config, |params| {
        let data = unsafe { slice::from_raw_parts(params.data.p_data, params.data.len as usize) };
        if !advertises_nus(data) {
            return None;
        }
        let peer = unsafe { Address::from_raw(params.peer_addr) };
        if skip.contains(&peer) {
            return None;
        }
        Some((peer, peer_name(data)))
    })
    .await;

    unwrap!(res, "scan failed")
}

/// Connect loop: claim a free slot, find a peer, bring the link up and
/// hand it to its own task.
pub async fn run_central(sd: &'static Softdevice, spawner: Spawner) {
    loop {
        wait_until_enabled().await;

        let (link, skip) = {
            let registry = REGISTRY.lock().await;
            (registry.find_free(), registry.bound_peers())
        };
        let Some(link) = link else {
            // All slots bound; check again once something disconnects.
            Timer::after_millis(500).await;
            continue;
        };

        let (peer, name) = scan_for_uart_peer(sd, &skip).await;
        info!("link {}: connecting to {:?} ({=str})", link, peer, name.as_str());

        let whitelist = [&peer];
        let mut config = central::ConnectConfig::default();
        config.scan_config.whitelist = Some(&whitelist);
        config.att_mtu = Some(ATT_MTU as u16);
        config.conn_params = raw::ble_gap_conn_params_t {
            conn_sup_timeout: 400, // 4s
            max_conn_interval: ci_ms!(30),
            min_conn_interval: ci_ms!(15),
            slave_latency: 0,
        };
        let conn = match central::connect(sd, &config).await {
            Ok(conn) => conn,
            Err(e) => {
                error!("connect error - {:?}", e);
                continue;
            }
        };

        let client: NusClient = match gatt_client::discover(&conn).await {
            Ok(client) => client,
            Err(e) => {
                error!("link {}: NUS discovery failed - {:?}", link, e);
                let _ = conn.disconnect();
                continue;
            }
        };

        // Subscribe to peer data before anything can flow.
        if let Err(e) = client.tx_cccd_write(true).await {
            error!("link {}: enabling notifications failed - {:?}", link, e);
            let _ = conn.disconnect();
            continue;
        }

        let handle = unwrap!(conn.handle(), "fresh connection has a handle");
        let mut slot = PeripheralSlot::new(client);
        slot.bind(handle, name.as_str());
        {
            let mut registry = REGISTRY.lock().await;
            registry.bind(link, peer, handle, name.as_str());
            debug!("registry: {:?}", registry.slot(link));
        }

        if spawner.spawn(link_task(conn, slot, link)).is_err() {
            // Dropping the connection tears it down again.
            error!("link {}: no task slot free", link);
            REGISTRY.lock().await.invalidate(link);
        }
    }
}

/// Serves one live link: peer data goes to the host queue, host frames go
/// out through the UART client, and the slot is released on disconnect.
#[embassy_executor::task(pool_size = MAX_PERIPHERAL_LINKS)]
async fn link_task(conn: Connection, mut slot: PeripheralSlot<NusClient>, link: LinkId) {
    info!("link {}: up as {=str} (handle {=u16:#06x})", link, slot.name(), slot.handle());

    // Drop frames queued for a previous tenant of this slot.
    while BT_DATA_TX[link as usize].try_receive().is_ok() {}

    conn.start_rssi();

    let exit_reason = loop {
        let gatt_fut = gatt_client::run(&conn, slot.uart(), |event| match event {
            NusClientEvent::TxNotification(data) => {
                if BT_DATA_RX.try_send((link, data)).is_err() {
                    info!("Error BT_DATA_RX");
                }
                if let Some(rssi) = conn.rssi() {
                    // Get as u8 rssi - receiver side will take care of cast to i8
                    RSSI_VALUES[link as usize].store(rssi as u8, Ordering::Relaxed);
                }
            }
        });
        let host_fut = BT_DATA_TX[link as usize].receive();

        // Pin mutable futures
        pin_mut!(gatt_fut);
        pin_mut!(host_fut);

        match select(gatt_fut, host_fut).await {
            Either::Left((e, _)) => break e,
            Either::Right((data, _)) => {
                // Writing shares the connection with the event loop, so a
                // notification raised while this write is in flight is lost.
                if let Err(e) = slot.uart().rx_write(&data).await {
                    error!("link {}: uart write failed - {:?}", link, e);
                }
            }
        }
    };
    info!("link {}: gatt client exited: {:?}", link, exit_reason);

    slot.invalidate();
    REGISTRY.lock().await.invalidate(link);
    RSSI_VALUES[link as usize].store(0, Ordering::Relaxed);
}
