// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundation.xyz>
// SPDX-License-Identifier: GPL-3.0-or-later

//! Host MPU to BLE hub communication protocol.
//! The MPU is the host; the nRF52x hub bridges it to the UART channels of
//! up to `MAX_PERIPHERAL_LINKS` BLE peripherals. Messages travel as
//! postcard payloads in COBS frames, tagged with the link they concern.

#![no_std]

use serde::{Deserialize, Serialize};

#[cfg(test)]
mod tests;

/// Maximum supported message size to be serialized or deserialized by
/// `postcard`. Messages larger than this will be rejected.
pub const COBS_MAX_MSG_SIZE: usize = 512;

/// Index of one peripheral link slot on the hub.
pub type LinkId = u8;

/// Bluetooth-specific messages for controlling the radio and moving data
/// over the peripheral links.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub enum Bluetooth<'a> {
    /// Start scanning and connecting to peripherals
    Enable,
    /// Stop making new connections
    Disable,
    /// Acknowledge enable
    AckEnable,
    /// Acknowledge disable
    AckDisable,

    /// Request signal strength of one link
    GetSignalStrength { link: LinkId },
    /// Response with signal strength value (0-255)
    SignalStrength { link: LinkId, rssi: u8 },

    /// Send raw data to the peripheral bound to a link
    SendData { link: LinkId, data: &'a [u8] },
    /// Outcome of a SendData request
    SendDataResponse(SendDataResponse),

    /// Poll for data received from any peripheral
    GetReceivedData,
    /// Data received from the peripheral bound to a link
    ReceivedData { link: LinkId, data: &'a [u8] },
    /// Nothing buffered at the moment
    NoReceivedData,

    /// Request the bound/unbound state of one link
    GetLinkStatus { link: LinkId },
    /// Response with the link state and the bound peer's name
    AckLinkStatus {
        link: LinkId,
        connected: bool,
        name: &'a str,
    },

    /// Request hub firmware version
    GetFirmwareVersion,
    /// Response with firmware version string
    AckFirmwareVersion { version: &'a str },
}

/// Outcome codes for SendData requests.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub enum SendDataResponse {
    /// Queued for transmission on the link
    Sent,
    /// The link's transmit queue is full
    BufferFull,
    /// Payload exceeds the BLE MTU
    DataTooLarge,
    /// No peripheral is bound to that link
    NotConnected,
}

/// Current operational state of the hub.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub enum State {
    /// Scanning and serving links
    Enabled,
    /// Radio work suspended
    Disabled,
    /// Device state is undefined or transitioning
    Unknown,
}

/// Decode failures reported back to the host.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub enum PostcardError {
    /// Frame exceeded the COBS buffer
    OverFull,
    /// Frame did not deserialize
    Deser,
}

/// Top-level message types for host-hub communication.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub enum HostProtocolMessage<'a> {
    /// Bluetooth control and data transfer messages
    Bluetooth(#[serde(borrow)] Bluetooth<'a>),
    /// Request device reset
    Reset,
    /// Query current device state
    GetState,
    /// Response with current state
    AckState(State),
    /// Report a frame the hub could not decode
    PostcardError(PostcardError),
    /// Received a message that makes no sense in the current state
    InappropriateMessage(State),
}
