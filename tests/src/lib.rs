// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

mod killswitch;

pub mod utils {
    use killswitch_common::interface::InterfaceError;
    use killswitch_common::models::route::{RouteAddr, RouteError, RouteMessage};
    use killswitch_common::system::NetworkRepository;
    use pnet::datalink::NetworkInterface;
    use pnet::ipnetwork::IpNetwork;
    use pnet::util::MacAddr;
    use std::net::IpAddr;

    pub const IFF_UP: u32 = 1;
    pub const IFF_BROADCAST: u32 = 2;
    pub const IFF_LOOPBACK: u32 = 8;
    pub const IFF_POINTTOPOINT: u32 = 16;

    /// Canned host state standing in for the OS.
    #[derive(Default)]
    pub struct MockNetwork {
        pub interfaces: Vec<NetworkInterface>,
        pub routes: Vec<RouteMessage>,
        pub fail_routes: bool,
    }

    impl MockNetwork {
        pub fn with_interface(mut self, interface: NetworkInterface) -> Self {
            self.interfaces.push(interface);
            self
        }

        pub fn with_route(mut self, flags: i32, dst: &str) -> Self {
            let ip_addr: IpAddr = dst.parse().expect("valid route destination");
            self.routes
                .push(RouteMessage::with_destination(flags, RouteAddr::from(ip_addr)));
            self
        }
    }

    impl NetworkRepository for MockNetwork {
        fn get_network_interfaces(&self) -> Result<Vec<NetworkInterface>, InterfaceError> {
            Ok(self.interfaces.clone())
        }

        fn get_route_messages(&self) -> Result<Vec<RouteMessage>, RouteError> {
            if self.fail_routes {
                return Err(RouteError::Unsupported("mock"));
            }
            Ok(self.routes.clone())
        }
    }

    pub fn create_mock_interface(
        name: &str,
        mac: Option<MacAddr>,
        ips: &[&str],
        flags: u32,
    ) -> NetworkInterface {
        NetworkInterface {
            name: name.to_string(),
            description: "An interface".to_string(),
            index: 0,
            mac,
            ips: ips
                .iter()
                .map(|ip| ip.parse::<IpNetwork>().expect("valid network"))
                .collect(),
            flags,
        }
    }

    /// `en0` on a home LAN, `utun0` on the tunnel, plus loopback.
    pub fn connected_host() -> MockNetwork {
        MockNetwork::default()
            .with_interface(create_mock_interface(
                "lo0",
                None,
                &["127.0.0.1/8", "::1/128"],
                IFF_UP | IFF_LOOPBACK,
            ))
            .with_interface(create_mock_interface(
                "en0",
                Some(MacAddr(0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff)),
                &["fe80::1/64", "192.168.1.10/24"],
                IFF_UP | IFF_BROADCAST,
            ))
            .with_interface(create_mock_interface(
                "utun0",
                None,
                &["10.8.0.2/32"],
                IFF_UP | IFF_POINTTOPOINT,
            ))
    }
}
