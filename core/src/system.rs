// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

use pnet::datalink::{self, NetworkInterface};

use killswitch_common::debug;
use killswitch_common::interface::InterfaceError;
use killswitch_common::models::route::{self, RouteError, RouteMessage};
use killswitch_common::system::NetworkRepository;

/// Reads interfaces through `pnet` and the routing table through `sysctl`.
pub struct SystemRepo;

impl NetworkRepository for SystemRepo {
    fn get_network_interfaces(&self) -> Result<Vec<NetworkInterface>, InterfaceError> {
        check_ifaddrs()?;
        let interfaces = datalink::interfaces();
        debug!(verbosity = 2, "OS reported {} interfaces", interfaces.len());
        Ok(interfaces)
    }

    fn get_route_messages(&self) -> Result<Vec<RouteMessage>, RouteError> {
        let rib: Vec<u8> = fetch_rib()?;
        debug!(verbosity = 2, "Routing table dump is {} bytes", rib.len());
        route::parse_rib(&rib)
    }
}

/// `datalink::interfaces` reports a failed `getifaddrs` as an empty list.
#[cfg(unix)]
fn check_ifaddrs() -> Result<(), InterfaceError> {
    let mut head: *mut libc::ifaddrs = std::ptr::null_mut();

    // SAFETY: `head` is a valid out-pointer for the list head.
    if unsafe { libc::getifaddrs(&mut head) } != 0 {
        return Err(InterfaceError::Enumerate(std::io::Error::last_os_error()));
    }

    // SAFETY: `head` was filled by the successful call above and is freed once.
    unsafe { libc::freeifaddrs(head) };
    Ok(())
}

#[cfg(not(unix))]
fn check_ifaddrs() -> Result<(), InterfaceError> {
    Ok(())
}

#[cfg(target_os = "macos")]
fn fetch_rib() -> Result<Vec<u8>, RouteError> {
    macos_impl::fetch_rib()
}

#[cfg(not(target_os = "macos"))]
fn fetch_rib() -> Result<Vec<u8>, RouteError> {
    Err(RouteError::Unsupported(std::env::consts::OS))
}

#[cfg(target_os = "macos")]
mod macos_impl {
    use super::*;
    use std::io;
    use std::ptr;

    const CTL_NET: libc::c_int = 4;
    const PF_ROUTE: libc::c_int = 17;
    const AF_UNSPEC: libc::c_int = 0;
    const NET_RT_DUMP: libc::c_int = 1;

    /// The table may grow between sizing and reading it.
    const ATTEMPTS: usize = 3;

    pub fn fetch_rib() -> Result<Vec<u8>, RouteError> {
        let mut mib: [libc::c_int; 6] = [CTL_NET, PF_ROUTE, 0, AF_UNSPEC, NET_RT_DUMP, 0];

        for _ in 0..ATTEMPTS {
            let mut len: libc::size_t = 0;

            // SAFETY: `mib` holds six valid ints and a null buffer only asks for the size.
            let rc = unsafe {
                libc::sysctl(
                    mib.as_mut_ptr(),
                    mib.len() as libc::c_uint,
                    ptr::null_mut(),
                    &mut len,
                    ptr::null_mut(),
                    0,
                )
            };
            if rc != 0 {
                return Err(RouteError::Fetch(io::Error::last_os_error()));
            }

            let mut buf: Vec<u8> = vec![0; len];

            // SAFETY: `buf` is `len` bytes long and `len` tells the kernel so.
            let rc = unsafe {
                libc::sysctl(
                    mib.as_mut_ptr(),
                    mib.len() as libc::c_uint,
                    buf.as_mut_ptr().cast(),
                    &mut len,
                    ptr::null_mut(),
                    0,
                )
            };
            if rc == 0 {
                buf.truncate(len);
                return Ok(buf);
            }

            let err = io::Error::last_os_error();
            if err.raw_os_error() != Some(libc::ENOMEM) {
                return Err(RouteError::Fetch(err));
            }
        }

        Err(RouteError::Fetch(io::Error::other(
            "routing table kept growing while it was read",
        )))
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
