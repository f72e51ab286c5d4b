use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::{Duration, Instant};

use tokio::net::UdpSocket;

use crate::measurement::ProbeFailure;

const HEADER_LEN: usize = 12;
const MAX_LABEL_LEN: usize = 63;
const MAX_NAME_LEN: usize = 253;
const MAX_DATAGRAM: usize = 1232;

const FLAG_QR: u16 = 0x8000;
const FLAG_RD: u16 = 0x0100;
const RCODE_MASK: u16 = 0x000f;

const TYPE_A: u16 = 1;
const CLASS_IN: u16 = 1;

/// Time from sending one A query to `resolver` until a matching, successful answer arrives.
pub(crate) async fn resolve(resolver: SocketAddr, domain: &str) -> Result<Duration, ProbeFailure> {
    let id: u16 = rand::random();
    let query = encode_query(id, domain)?;

    let local: SocketAddr = if resolver.is_ipv4() {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    } else {
        (Ipv6Addr::UNSPECIFIED, 0).into()
    };
    let socket = UdpSocket::bind(local)
        .await
        .map_err(|err| ProbeFailure::unavailable(format!("udp bind: {err}")))?;
    socket
        .connect(resolver)
        .await
        .map_err(|err| ProbeFailure::transport(format!("udp connect {resolver}: {err}")))?;

    let started = Instant::now();
    socket
        .send(&query)
        .await
        .map_err(|err| ProbeFailure::transport(format!("send to {resolver}: {err}")))?;

    let mut buf = [0u8; MAX_DATAGRAM];
    loop {
        let n = socket
            .recv(&mut buf)
            .await
            .map_err(|err| ProbeFailure::transport(format!("recv from {resolver}: {err}")))?;
        let packet = &buf[..n];

        // Stray datagrams (late answers to someone else's query) are skipped.
        if read_u16(packet, 0) != Some(id) {
            continue;
        }

        check_response(id, packet)?;
        return Ok(started.elapsed());
    }
}

/// Encodes a recursive A/IN query for `domain`.
pub(crate) fn encode_query(id: u16, domain: &str) -> Result<Vec<u8>, ProbeFailure> {
    let name = domain.strip_suffix('.').unwrap_or(domain);
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(ProbeFailure::protocol(format!("invalid domain `{domain}`")));
    }

    let mut buf = Vec::with_capacity(HEADER_LEN + name.len() + 6);
    buf.extend_from_slice(&id.to_be_bytes());
    buf.extend_from_slice(&FLAG_RD.to_be_bytes());
    buf.extend_from_slice(&1u16.to_be_bytes()); // qdcount
    buf.extend_from_slice(&[0u8; 6]); // ancount, nscount, arcount

    for label in name.split('.') {
        if label.is_empty() || label.len() > MAX_LABEL_LEN || !label.is_ascii() {
            return Err(ProbeFailure::protocol(format!("invalid domain `{domain}`")));
        }
        buf.push(label.len() as u8);
        buf.extend_from_slice(label.as_bytes());
    }
    buf.push(0);

    buf.extend_from_slice(&TYPE_A.to_be_bytes());
    buf.extend_from_slice(&CLASS_IN.to_be_bytes());

    Ok(buf)
}

/// Accepts a response only if it answers query `id` with `NOERROR` and at least one record.
pub(crate) fn check_response(id: u16, packet: &[u8]) -> Result<(), ProbeFailure> {
    if packet.len() < HEADER_LEN {
        return Err(ProbeFailure::protocol(format!(
            "truncated dns header ({} bytes)",
            packet.len()
        )));
    }

    let (Some(resp_id), Some(flags), Some(ancount)) = (
        read_u16(packet, 0),
        read_u16(packet, 2),
        read_u16(packet, 6),
    ) else {
        return Err(ProbeFailure::protocol("truncated dns header"));
    };

    if resp_id != id {
        return Err(ProbeFailure::protocol(format!(
            "dns id mismatch (sent {id}, got {resp_id})"
        )));
    }
    if flags & FLAG_QR == 0 {
        return Err(ProbeFailure::protocol("dns packet is not a response"));
    }

    let rcode = flags & RCODE_MASK;
    if rcode != 0 {
        return Err(ProbeFailure::protocol(format!("dns rcode {rcode}")));
    }
    if ancount == 0 {
        return Err(ProbeFailure::protocol("dns response has no answers"));
    }

    Ok(())
}

fn read_u16(buf: &[u8], at: usize) -> Option<u16> {
    let bytes = buf.get(at..at + 2)?;
    Some(u16::from_be_bytes([bytes[0], bytes[1]]))
}
