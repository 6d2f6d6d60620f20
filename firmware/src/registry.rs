// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundation.xyz>
// SPDX-License-Identifier: GPL-3.0-or-later

//! The owning registry for the hub's link slots: one [`ConnectionSlot`]
//! per potential peripheral link, plus the peer address each slot is bound
//! to so the scanner can skip peers that are already linked.

use consts::MAX_PERIPHERAL_LINKS;
use heapless::Vec;
use host_protocol::LinkId;
use link_state::ConnectionSlot;
use nrf_softdevice::ble::Address;

pub struct LinkRegistry {
    slots: [ConnectionSlot; MAX_PERIPHERAL_LINKS],
    peers: [Option<Address>; MAX_PERIPHERAL_LINKS],
}

impl LinkRegistry {
    pub const fn new() -> Self {
        Self {
            slots: [const { ConnectionSlot::new() }; MAX_PERIPHERAL_LINKS],
            peers: [None; MAX_PERIPHERAL_LINKS],
        }
    }

    /// Lowest free link slot, if any.
    pub fn find_free(&self) -> Option<LinkId> {
        self.slots
            .iter()
            .position(|slot| slot.is_invalid())
            .map(|idx| idx as LinkId)
    }

    /// Slot state for a host-supplied link id.
    pub fn slot(&self, link: LinkId) -> Option<&ConnectionSlot> {
        self.slots.get(link as usize)
    }

    /// Binds a slot to a freshly established connection.
    /// Indexes come from [`LinkRegistry::find_free`]; a bad one is a bug.
    pub fn bind(&mut self, link: LinkId, peer: Address, handle: u16, name: &str) {
        self.slots[link as usize].bind(handle, name);
        self.peers[link as usize] = Some(peer);
    }

    /// Releases a slot after its link went down.
    pub fn invalidate(&mut self, link: LinkId) {
        self.slots[link as usize].invalidate();
        self.peers[link as usize] = None;
    }

    /// Addresses of all currently bound peers, for scan filtering.
    pub fn bound_peers(&self) -> Vec<Address, MAX_PERIPHERAL_LINKS> {
        self.peers.iter().flatten().copied().collect()
    }
}
