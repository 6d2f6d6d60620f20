#![no_std]

/// Largest application payload carried in one BLE packet.
pub const MTU: usize = 244;

/// ATT MTU negotiated on every link: payload plus the 3-byte ATT header.
/// Staying at 247 bytes keeps a whole payload in a single link-layer PDU.
pub const ATT_MTU: usize = MTU + 3;

/// GAP device name of the hub itself.
/// The hub never advertises; the name is only visible to connected peers
/// that read our GAP service.
pub const DEVICE_NAME: &str = "BLE Uart Hub";

/// UUID for the Nordic UART Service (NUS).
pub const NUS_UUID: u128 = 0x6E400001_B5A3_F393_E0A9_E50E24DCCA9E;

/// Connection handle value meaning "no active connection".
/// This is `BLE_CONN_HANDLE_INVALID` from the SoftDevice headers; link
/// bookkeeping uses it as the unbound sentinel.
pub const CONN_HANDLE_INVALID: u16 = 0xFFFF;

/// Number of peripheral links the hub maintains concurrently.
/// The SoftDevice is configured for exactly this many central connections.
pub const MAX_PERIPHERAL_LINKS: usize = 4;

/// Longest peer name kept per link, in bytes.
/// Matches the GAP device-name cap; longer advertised names are truncated.
pub const MAX_PEER_NAME_LEN: usize = 32;

/// Maximum number of BLE packets buffered for the host.
/// This limits memory usage while ensuring reliable data transfer.
pub const BT_MAX_NUM_PKT: usize = 8;

/// First flash address available to the application.
/// The S140 SoftDevice occupies everything below it.
pub const BASE_APP_ADDR: u32 = 0x27000;
