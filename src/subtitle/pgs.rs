// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Presentation Graphics Stream (`.sup`/PGS) duration probing.
//!
//! PGS is a bitmap subtitle format; there is no text content to merge, so all this module
//! extracts is timing — the presentation timestamp of the last display segment, which is
//! all the alignment engine needs from a bitmap track. Errors are plain strings here and get
//! wrapped into `ErrorKind::PgsParseError` by the caller in `subtitle::mod`, the same way
//! `combine` parse errors are threaded through `subtitle::common`.

use crate::bytes::ByteReader;
use crate::subtitle::duration::estimate_max_end;

const PTS_HZ: f64 = 90_000.0;
/// PTS values at or beyond this many seconds are discarded as corrupt/wraparound garbage.
const MAX_PLAUSIBLE_SECS: f64 = 18_000.0;

/// A parsed PGS stream, reduced to the one number the alignment engine needs.
#[derive(Debug, Clone, Copy)]
pub struct PgsFile {
    /// Outlier-guarded maximum presentation timestamp, in seconds.
    pub max_end_secs: f64,
}

impl PgsFile {
    /// Parse a `.sup` PGS stream from raw file bytes.
    pub fn parse(data: &[u8]) -> Result<PgsFile, String> {
        let mut reader = ByteReader::new(data);
        let mut pts_secs = Vec::new();

        while reader.remaining() >= 2 {
            let start = reader.pos();
            let magic = match reader.read_str(2) {
                Ok(m) => m,
                Err(_) => break,
            };
            if magic != "PG" {
                return Err(format!("expected 'PG' segment magic at offset {}", start));
            }

            let pts = reader.read_u32().map_err(|e| format!("truncated PTS at offset {}: {}", start, e))?;
            reader.skip(5).map_err(|e| format!("truncated segment header at offset {}: {}", start, e))?;
            let segment_size = reader.read_u16().map_err(|e| format!("truncated segment size at offset {}: {}", start, e))?;
            reader
                .skip(segment_size as usize)
                .map_err(|e| format!("truncated segment payload at offset {}: {}", start, e))?;

            let secs = f64::from(pts) / PTS_HZ;
            if secs < MAX_PLAUSIBLE_SECS {
                pts_secs.push(secs);
            }
        }

        if pts_secs.is_empty() {
            return Err("PGS stream did not contain a single well-formed segment".to_string());
        }

        Ok(PgsFile {
            max_end_secs: estimate_max_end(&pts_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(pts_secs: f64, payload_len: u16) -> Vec<u8> {
        let mut v = Vec::new();
        v.extend_from_slice(b"PG");
        v.extend_from_slice(&((pts_secs * PTS_HZ) as u32).to_be_bytes());
        v.extend_from_slice(&[0u8; 5]);
        v.extend_from_slice(&payload_len.to_be_bytes());
        v.extend(std::iter::repeat(0u8).take(payload_len as usize));
        v
    }

    #[test]
    fn parses_segments_and_picks_last_plausible_pts() {
        let mut data = segment(10.0, 4);
        data.extend(segment(20.5, 0));
        let file = PgsFile::parse(&data).unwrap();
        assert!((file.max_end_secs - 20.5).abs() < 1e-6);
    }

    #[test]
    fn discards_implausible_wraparound_pts() {
        let mut data = segment(100.0, 0);
        data.extend(segment(19000.0, 0));
        let file = PgsFile::parse(&data).unwrap();
        assert!((file.max_end_secs - 100.0).abs() < 1e-6);
    }

    #[test]
    fn bad_magic_is_an_error() {
        let mut data = segment(1.0, 0);
        data[0] = b'X';
        assert!(PgsFile::parse(&data).is_err());
    }

    #[test]
    fn empty_stream_is_an_error() {
        assert!(PgsFile::parse(&[]).is_err());
    }
}
