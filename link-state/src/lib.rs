// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundation.xyz>
// SPDX-License-Identifier: GPL-3.0-or-later

//! Bookkeeping for one peripheral link of the BLE central.
//!
//! Each link occupies a slot that tracks whether it is bound to a live
//! connection, the display name of the bound peer, and the SoftDevice
//! connection handle identifying the link to the radio stack. The registry
//! holding the slots lives in the firmware; this crate only provides the
//! per-slot state and its lifecycle discipline: a slot binds handle and
//! name together and releases both together, so a stale name never
//! survives a handle invalidation.

#![no_std]

use consts::{CONN_HANDLE_INVALID, MAX_PEER_NAME_LEN};
use heapless::String;

#[cfg(test)]
mod tests;

/// State of one peripheral connection slot.
///
/// A freshly created slot is unbound: empty name, invalid handle. Handles
/// use the SoftDevice convention where [`CONN_HANDLE_INVALID`] means "no
/// active connection".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnectionSlot {
    name: String<MAX_PEER_NAME_LEN>,
    conn_handle: Option<u16>,
}

impl ConnectionSlot {
    /// Creates an unbound slot.
    pub const fn new() -> Self {
        Self {
            name: String::new(),
            conn_handle: None,
        }
    }

    /// Display name of the bound peer, empty while unbound.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Replaces the stored name unconditionally.
    ///
    /// Names longer than the slot capacity are truncated at a character
    /// boundary. Whether an empty name makes sense for a bound slot is the
    /// caller's business; nothing is validated here.
    pub fn set_name(&mut self, name: &str) {
        self.name.clear();
        for c in name.chars() {
            if self.name.push(c).is_err() {
                break;
            }
        }
    }

    /// Connection handle of this link, or [`CONN_HANDLE_INVALID`] while
    /// unbound.
    pub fn handle(&self) -> u16 {
        self.conn_handle.unwrap_or(CONN_HANDLE_INVALID)
    }

    /// Replaces the stored handle unconditionally.
    ///
    /// Storing [`CONN_HANDLE_INVALID`] marks the slot unbound but leaves
    /// the name in place; only [`ConnectionSlot::invalidate`] clears both.
    pub fn set_handle(&mut self, handle: u16) {
        self.conn_handle = if handle == CONN_HANDLE_INVALID {
            None
        } else {
            Some(handle)
        };
    }

    /// True while the slot holds no live connection.
    pub fn is_invalid(&self) -> bool {
        self.conn_handle.is_none()
    }

    /// Binds the slot to a live connection, handle and name together.
    pub fn bind(&mut self, handle: u16, name: &str) {
        self.set_handle(handle);
        self.set_name(name);
    }

    /// Releases the slot: invalid handle, empty name. Idempotent.
    pub fn invalidate(&mut self) {
        self.conn_handle = None;
        self.name.clear();
    }
}

/// A connection slot that also owns the UART client of its link.
///
/// `C` is the UART-over-BLE client type; the firmware instantiates it with
/// the NUS GATT client. The client lives exactly as long as the slot value,
/// independent of handle validity, so the owner decides when to construct
/// and drop the pair.
pub struct PeripheralSlot<C> {
    link: ConnectionSlot,
    uart: C,
}

impl<C> PeripheralSlot<C> {
    /// Wraps `uart` in an unbound slot.
    pub const fn new(uart: C) -> Self {
        Self {
            link: ConnectionSlot::new(),
            uart,
        }
    }

    /// Display name of the bound peer, empty while unbound.
    pub fn name(&self) -> &str {
        self.link.name()
    }

    pub fn set_name(&mut self, name: &str) {
        self.link.set_name(name);
    }

    /// Connection handle of this link, or [`CONN_HANDLE_INVALID`] while
    /// unbound.
    pub fn handle(&self) -> u16 {
        self.link.handle()
    }

    pub fn set_handle(&mut self, handle: u16) {
        self.link.set_handle(handle);
    }

    pub fn is_invalid(&self) -> bool {
        self.link.is_invalid()
    }

    /// Binds the slot to a live connection, handle and name together.
    pub fn bind(&mut self, handle: u16, name: &str) {
        self.link.bind(handle, name);
    }

    /// Releases the slot; the owned client stays put.
    pub fn invalidate(&mut self) {
        self.link.invalidate();
    }

    /// The UART client serving this link.
    pub fn uart(&self) -> &C {
        &self.uart
    }

    pub fn uart_mut(&mut self) -> &mut C {
        &mut self.uart
    }
}
