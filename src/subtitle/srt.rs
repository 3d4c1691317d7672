// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! SubRip (`.srt`) parsing, serialization and merging.

use crate::subtitle::common::{format_srt_timepoint, parse_srt_timepoint, read_text_file, split_bom};
use crate::timetypes::{TimeDelta, TimePoint};

use self::errors::ErrorKind::*;
use self::errors::Result;

/// `.srt`-parser-specific errors.
#[allow(missing_docs)]
pub mod errors {
    error_chain! {
        errors {
            NoEntries {
                description("the SubRip file did not contain a single valid entry")
            }
        }
    }
}

/// One `.srt` entry: an index, a time span, and free-form text (possibly multi-line).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// The 1-based index printed above the timing line. Not necessarily meaningful — many
    /// players ignore it and renumber on load — but kept so untouched entries round-trip.
    pub index: i64,
    /// Start time.
    pub start: TimePoint,
    /// End time.
    pub end: TimePoint,
    /// Text lines, in order, newlines excluded.
    pub text: Vec<String>,
}

/// A parsed `.srt` subtitle file: a flat, ordered list of entries.
#[derive(Debug, Clone)]
pub struct SrtFile {
    /// Entries, in presentation order (not necessarily sorted by time).
    pub entries: Vec<Entry>,
}

impl SrtFile {
    /// Parse a `.srt` subtitle from raw file bytes.
    pub fn parse(data: &[u8]) -> Result<SrtFile> {
        let text = read_text_file(data);
        let (_, text) = split_bom(&text);
        Self::parse_str(text)
    }

    /// Parse a `.srt` subtitle from already-decoded text.
    pub fn parse_str(text: &str) -> Result<SrtFile> {
        let normalized = text.replace("\r\n", "\n");
        let mut entries = Vec::new();

        for (block_num, block) in normalized.split("\n\n").enumerate() {
            let block = block.trim();
            if block.is_empty() {
                continue;
            }

            let mut lines = block.lines();
            let index_line = match lines.next() {
                Some(l) => l.trim(),
                None => continue,
            };
            let index: i64 = match index_line.parse() {
                Ok(i) => i,
                Err(_) => {
                    log::warn!("srt: skipping block {}: non-numeric index {:?}", block_num, index_line);
                    continue;
                }
            };

            let time_line = match lines.next() {
                Some(l) => l.trim(),
                None => {
                    log::warn!("srt: skipping block {}: missing time line", block_num);
                    continue;
                }
            };
            let (start, end) = match parse_time_line(time_line) {
                Ok(pair) => pair,
                Err(e) => {
                    log::warn!("srt: skipping block {}: malformed time line {:?}: {}", block_num, time_line, e);
                    continue;
                }
            };

            let text: Vec<String> = lines.map(|l| l.to_string()).collect();
            entries.push(Entry { index, start, end, text });
        }

        if entries.is_empty() {
            return Err(NoEntries.into());
        }

        Ok(SrtFile { entries })
    }

    /// Serialize back to `.srt` bytes (UTF-8 with BOM, CRLF line endings as commonly expected
    /// by players).
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = String::new();
        out.push('\u{feff}');
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                out.push_str("\r\n");
            }
            out.push_str(&entry.index.to_string());
            out.push_str("\r\n");
            out.push_str(&format_srt_timepoint(entry.start));
            out.push_str(" --> ");
            out.push_str(&format_srt_timepoint(entry.end));
            out.push_str("\r\n");
            for line in &entry.text {
                out.push_str(line);
                out.push_str("\r\n");
            }
        }
        out.into_bytes()
    }

    /// Shift every entry's start and end time by `delta_secs`.
    pub fn shift(&mut self, delta_secs: f64) {
        let delta = TimeDelta::from_secs_f64(delta_secs);
        for entry in &mut self.entries {
            entry.start += delta;
            entry.end += delta;
        }
    }

    /// The largest end time across all entries, in seconds. `0.0` if there are none.
    pub fn max_end_secs(&self) -> f64 {
        self.entries.iter().map(|e| e.end.secs_f64()).fold(0.0, f64::max)
    }

    /// All entry end times, in seconds.
    pub fn event_end_times_secs(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.end.secs_f64()).collect()
    }

    /// Appends `other`'s entries to `self`, shifting their times by `time_shift_secs` and
    /// renumbering each incoming index as `incoming_index + base_last_index`, where
    /// `base_last_index` is `self`'s highest existing index before the append.
    pub(crate) fn append(&mut self, other: &SrtFile, time_shift_secs: f64) {
        let delta = TimeDelta::from_secs_f64(time_shift_secs);
        let base_last_index = self.entries.iter().map(|e| e.index).max().unwrap_or(0);
        for entry in &other.entries {
            self.entries.push(Entry {
                index: entry.index + base_last_index,
                start: entry.start + delta,
                end: entry.end + delta,
                text: entry.text.clone(),
            });
        }
    }
}

fn parse_time_line(line: &str) -> std::result::Result<(TimePoint, TimePoint), String> {
    let mut parts = line.splitn(2, "-->");
    let start_str = parts.next().ok_or("missing '-->'")?.trim();
    let end_str = parts.next().ok_or("missing end timestamp")?.trim();
    // players tolerate trailing position tags (e.g. "X1:... Y1:...") after the end timestamp
    let end_str = end_str.split_whitespace().next().unwrap_or(end_str);
    let start = parse_srt_timepoint(start_str)?;
    let end = parse_srt_timepoint(end_str)?;
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> &'static str {
        "1\r\n00:00:01,000 --> 00:00:02,500\r\nHello\r\nthere\r\n\r\n2\r\n00:00:03,000 --> 00:00:04,000\r\nBye\r\n"
    }

    #[test]
    fn parses_entries_with_multiline_text() {
        let file = SrtFile::parse_str(sample()).unwrap();
        assert_eq!(file.entries.len(), 2);
        assert_eq!(file.entries[0].text, vec!["Hello".to_string(), "there".to_string()]);
        assert!((file.max_end_secs() - 4.0).abs() < 1e-6);
    }

    #[test]
    fn tolerates_trailing_position_tags() {
        let text = "1\n00:00:01,000 --> 00:00:02,000 X1:100 X2:200 Y1:10 Y2:20\nhi\n";
        let file = SrtFile::parse_str(text).unwrap();
        assert_eq!(file.entries.len(), 1);
    }

    #[test]
    fn skips_malformed_block_and_continues() {
        let text = "abc\nnot a time line\ngarbage\n\n2\n00:00:01,000 --> 00:00:02,000\nok\n";
        let file = SrtFile::parse_str(text).unwrap();
        assert_eq!(file.entries.len(), 1);
        assert_eq!(file.entries[0].index, 2);
    }

    #[test]
    fn append_renumbers_and_shifts() {
        let mut base = SrtFile::parse_str(sample()).unwrap();
        let other = SrtFile::parse_str("1\r\n00:00:00,000 --> 00:00:01,000\r\nx\r\n").unwrap();
        base.append(&other, 10.0);
        assert_eq!(base.entries.len(), 3);
        assert_eq!(base.entries[2].index, 3);
        assert!((base.entries[2].start.secs_f64() - 10.0).abs() < 1e-6);
    }

    #[test]
    fn empty_file_is_an_error() {
        assert!(SrtFile::parse_str("\n\n").is_err());
    }
}
