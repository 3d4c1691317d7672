// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A narrow `.m2ts` duration probe (§4.8), used only to cross-check a chosen placement's
//! predicted episode boundary against an actual clip's measured duration during remux. The
//! alignment engine itself never calls this — §4.5 is pure arithmetic over MPLS-declared
//! times.

use std::path::Path;

use crate::errors::ErrorKind::M2tsParseError;
use crate::errors::*;

/// Each BD-ATS record is a 4-byte arrival timestamp prefix followed by a standard 188-byte
/// MPEG-TS packet.
const PACKET_LEN: usize = 192;
const TS_PACKET_LEN: usize = 188;
const ATS_PREFIX_LEN: usize = PACKET_LEN - TS_PACKET_LEN;

/// PCR runs at 27 MHz.
const PCR_HZ: f64 = 27_000_000.0;

/// Scans `path` for the first and last valid PCR and returns `(last - first) / 27e6` seconds.
pub fn probe_duration<P: AsRef<Path>>(path: P) -> Result<f64> {
    let data = std::fs::read(path.as_ref())?;
    let mut pcrs = Vec::new();

    let mut offset = 0;
    while offset + PACKET_LEN <= data.len() {
        let packet = &data[offset + ATS_PREFIX_LEN..offset + PACKET_LEN];
        if let Some(pcr) = extract_pcr(packet) {
            pcrs.push(pcr);
        }
        offset += PACKET_LEN;
    }

    let first = pcrs.first().ok_or_else(|| Error::from(M2tsParseError("no PCR found in stream".to_string())))?;
    let last = pcrs.last().ok_or_else(|| Error::from(M2tsParseError("no PCR found in stream".to_string())))?;

    Ok((*last as f64 - *first as f64) / PCR_HZ)
}

/// Extracts a 42-bit PCR from one 188-byte TS packet, if its adaptation field carries one.
fn extract_pcr(packet: &[u8]) -> Option<u64> {
    if packet.len() != TS_PACKET_LEN || packet[0] != 0x47 {
        return None;
    }

    let adaptation_field_control = (packet[3] >> 4) & 0b11;
    if adaptation_field_control != 0b10 && adaptation_field_control != 0b11 {
        return None;
    }

    let adaptation_field_length = packet[4] as usize;
    if adaptation_field_length < 1 || 5 + adaptation_field_length > packet.len() {
        return None;
    }

    let flags = packet[5];
    let pcr_flag = (flags >> 4) & 1;
    if pcr_flag == 0 {
        return None;
    }

    let b = &packet[6..12];
    let base = (u64::from(b[0]) << 25) | (u64::from(b[1]) << 17) | (u64::from(b[2]) << 9) | (u64::from(b[3]) << 1) | (u64::from(b[4]) >> 7);
    let ext = u64::from(b[4] & 0x01) << 8 | u64::from(b[5]);

    Some(base * 300 + ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet_with_pcr(pcr: u64) -> Vec<u8> {
        let mut ats = vec![0u8; ATS_PREFIX_LEN];
        let mut ts = vec![0u8; TS_PACKET_LEN];
        ts[0] = 0x47;
        ts[3] = 0b0010_0000; // adaptation field only
        ts[4] = 7; // adaptation field length
        ts[5] = 0b0001_0000; // pcr_flag set

        let base = pcr / 300;
        let ext = pcr % 300;
        ts[6] = (base >> 25) as u8;
        ts[7] = (base >> 17) as u8;
        ts[8] = (base >> 9) as u8;
        ts[9] = (base >> 1) as u8;
        ts[10] = (((base & 1) << 7) as u8) | 0x7E | ((ext >> 8) as u8 & 0x01);
        ts[11] = (ext & 0xFF) as u8;

        ats.extend(ts);
        ats
    }

    #[test]
    fn extracts_pcr_from_adaptation_field() {
        let packet = packet_with_pcr(27_000_000 * 5);
        let pcr = extract_pcr(&packet[ATS_PREFIX_LEN..]).unwrap();
        assert_eq!(pcr, 27_000_000 * 5);
    }

    #[test]
    fn probe_duration_uses_first_and_last_pcr() {
        let mut data = packet_with_pcr(27_000_000 * 10);
        data.extend(packet_with_pcr(27_000_000 * 15));
        let tmp = mktemp::Temp::new_file().unwrap();
        std::fs::write(tmp.as_path(), &data).unwrap();
        let secs = probe_duration(tmp.as_path()).unwrap();
        assert!((secs - 5.0).abs() < 1e-6);
    }

    #[test]
    fn stream_with_no_pcr_is_an_error() {
        let mut ats = vec![0u8; ATS_PREFIX_LEN];
        let ts = vec![0u8; TS_PACKET_LEN];
        ats.extend(ts);
        let tmp = mktemp::Temp::new_file().unwrap();
        std::fs::write(tmp.as_path(), &ats).unwrap();
        assert!(probe_duration(tmp.as_path()).is_err());
    }
}
