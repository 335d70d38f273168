// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

//! # Public IP Lookup
//!
//! Asks the outside world which address our traffic leaves from. Used by
//! `info` as a leak self-check: with the kill switch on, the answer should be
//! the VPN exit, not the ISP address.
//!
//! A DNS TXT query against Google's authoritative server is tried first, then
//! a few plain-text HTTP echo services. Each attempt is bounded by the
//! caller's timeout.

use std::net::IpAddr;
use std::time::Duration;

use killswitch_common::debug;
use killswitch_common::utils::ip;
use killswitch_protocols::dns;
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::time;

pub const HTTP_ENDPOINTS: [&str; 3] = [
    "https://checkip.amazonaws.com",
    "https://myip.country/ip",
    "http://trackip.net/ip",
];

const USER_AGENT: &str = "killswitch";
const MAX_DNS_PAYLOAD: usize = 512;

#[derive(Debug, Error)]
pub enum WhoamiError {
    #[error("DNS lookup failed: {0}")]
    Dns(String),

    #[error("HTTP lookup via {url} failed: {reason}")]
    Http { url: String, reason: String },

    #[error("lookup timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0:?} is not an IP address")]
    Malformed(String),

    #[error("every public IP lookup failed")]
    Exhausted,
}

/// Returns the public address, trying DNS first and HTTP afterwards.
pub async fn public_ip(timeout: Duration) -> Result<IpAddr, WhoamiError> {
    match time::timeout(timeout, dns_lookup()).await {
        Ok(Ok(ip_addr)) => return Ok(ip_addr),
        Ok(Err(e)) => debug!(verbosity = 1, "{e}"),
        Err(_) => debug!(verbosity = 1, "{}", WhoamiError::Timeout(timeout)),
    }

    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|e| WhoamiError::Http {
            url: String::new(),
            reason: e.to_string(),
        })?;

    for url in HTTP_ENDPOINTS {
        match time::timeout(timeout, http_lookup(&client, url)).await {
            Ok(Ok(ip_addr)) => return Ok(ip_addr),
            Ok(Err(e)) => debug!(verbosity = 1, "{e}"),
            Err(_) => debug!(verbosity = 1, "{url}: {}", WhoamiError::Timeout(timeout)),
        }
    }

    Err(WhoamiError::Exhausted)
}

async fn dns_lookup() -> Result<IpAddr, WhoamiError> {
    let to_dns_err = |e: std::io::Error| WhoamiError::Dns(e.to_string());

    let socket = UdpSocket::bind("0.0.0.0:0").await.map_err(to_dns_err)?;
    socket.connect(dns::WHOAMI_SERVER).await.map_err(to_dns_err)?;

    let id: u16 = rand::random();
    let query = dns::create_txt_packet(dns::WHOAMI_NAME, id)
        .map_err(|e| WhoamiError::Dns(e.to_string()))?;
    socket.send(&query).await.map_err(to_dns_err)?;

    let mut buf = [0u8; MAX_DNS_PAYLOAD];
    loop {
        let len = socket.recv(&mut buf).await.map_err(to_dns_err)?;
        match dns::get_txt_record(&buf[..len]) {
            Ok((answer_id, text)) if answer_id == id => return normalize(&text),
            Ok((answer_id, _)) => {
                debug!(verbosity = 2, "Ignoring DNS answer with id {answer_id}");
            }
            Err(e) => return Err(WhoamiError::Dns(e.to_string())),
        }
    }
}

async fn http_lookup(client: &reqwest::Client, url: &str) -> Result<IpAddr, WhoamiError> {
    let to_http_err = |e: reqwest::Error| WhoamiError::Http {
        url: url.to_string(),
        reason: e.to_string(),
    };

    let body = client
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(to_http_err)?
        .text()
        .await
        .map_err(to_http_err)?;

    normalize(&body)
}

/// Strips whitespace and quotes from a lookup answer and parses it.
pub fn normalize(raw: &str) -> Result<IpAddr, WhoamiError> {
    let text = raw.trim().trim_matches('"').trim();
    ip::parse_ip(text).map_err(|_| WhoamiError::Malformed(text.to_string()))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
