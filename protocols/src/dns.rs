// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

use anyhow::{Context, Result, anyhow};
use dns_parser::{Builder, Packet, QueryClass, QueryType, RData};

/// Name whose TXT record echoes the address the query came from.
pub const WHOAMI_NAME: &str = "o-o.myaddr.l.google.com";

/// Authoritative server answering [`WHOAMI_NAME`].
pub const WHOAMI_SERVER: &str = "ns1.google.com:53";

/// Returns the query id and the first string of the last TXT answer.
pub fn get_txt_record(payload: &[u8]) -> Result<(u16, String)> {
    let packet = Packet::parse(payload).context("Failed to parse DNS packet")?;

    let text = packet
        .answers
        .iter()
        .filter_map(|record| match &record.data {
            RData::TXT(txt) => txt.iter().next(),
            _ => None,
        })
        .last()
        .ok_or_else(|| anyhow!("No valid TXT record found"))?;

    Ok((packet.header.id, String::from_utf8_lossy(text).into_owned()))
}

/// Constructs a raw DNS query packet for a TXT lookup.
pub fn create_txt_packet(name: &str, id: u16) -> Result<Vec<u8>> {
    let mut builder: Builder = Builder::new_query(id, false);

    builder.add_question(name, false, QueryType::TXT, QueryClass::IN);

    let packet_bytes: Vec<u8> = builder
        .build()
        .map_err(|e| anyhow!("Failed to build DNS packet: {:?}", e))?;

    Ok(packet_bytes)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
