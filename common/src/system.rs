// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

use crate::interface::InterfaceError;
use crate::models::route::{RouteError, RouteMessage};
use pnet::datalink::NetworkInterface;
use pnet::ipnetwork::IpNetwork;

/// Defines the contract for reading OS-level network state.
///
/// Everything the killswitch learns about the host goes through this trait,
/// which keeps interface classification and peer resolution testable
/// against canned data.
pub trait NetworkRepository {
    /// Retrieves every network interface known to the OS, up or not.
    fn get_network_interfaces(&self) -> Result<Vec<NetworkInterface>, InterfaceError>;

    /// Addresses bound to `interface`.
    fn get_interface_addresses(
        &self,
        interface: &NetworkInterface,
    ) -> Result<Vec<IpNetwork>, InterfaceError> {
        Ok(interface.ips.clone())
    }

    /// The routing information base for all address families, in kernel order.
    fn get_route_messages(&self) -> Result<Vec<RouteMessage>, RouteError>;
}
