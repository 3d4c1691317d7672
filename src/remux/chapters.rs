// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! OGM-compatible chapter text generation (§4.6, §6).

use std::path::Path;

use crate::errors::Result;
use crate::timetypes::TimePoint;

/// Renders `offsets_secs` (playlist-local chapter offsets, in ascending order) as OGM chapter
/// text: for the *i*-th offset, a `CHAPTERii=HH:MM:SS.mmm` line followed by a
/// `CHAPTERiiNAME=Chapter ii` line, both two-digit zero-padded. No trailing newline.
pub fn ogm_chapter_text(offsets_secs: &[f64]) -> String {
    let mut lines = Vec::with_capacity(offsets_secs.len() * 2);
    for (i, &offset) in offsets_secs.iter().enumerate() {
        let idx = i + 1;
        let t = TimePoint::from_secs_f64(offset);
        lines.push(format!("CHAPTER{:02}={:02}:{:02}:{:02}.{:03}", idx, t.hours(), t.mins_comp(), t.secs_comp(), t.msecs_comp()));
        lines.push(format!("CHAPTER{:02}NAME=Chapter {:02}", idx, idx));
    }
    lines.join("\n")
}

/// Writes the chapter text to `path`, UTF-8 with BOM (§6).
pub fn write_chapter_file<P: AsRef<Path>>(path: P, offsets_secs: &[f64]) -> Result<()> {
    let mut bytes = vec![0xEFu8, 0xBB, 0xBF];
    bytes.extend_from_slice(ogm_chapter_text(offsets_secs).as_bytes());
    std::fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_three_marks_exactly() {
        let text = ogm_chapter_text(&[0.0, 720.5, 1441.25]);
        assert_eq!(
            text,
            "CHAPTER01=00:00:00.000\n\
             CHAPTER01NAME=Chapter 01\n\
             CHAPTER02=00:12:00.500\n\
             CHAPTER02NAME=Chapter 02\n\
             CHAPTER03=00:24:01.250\n\
             CHAPTER03NAME=Chapter 03"
        );
    }

    #[test]
    fn empty_offsets_yield_empty_text() {
        assert_eq!(ogm_chapter_text(&[]), "");
    }
}
