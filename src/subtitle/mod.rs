// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The subtitle data model: a tagged union over the three formats the remainder of the
//! crate cares about (`.ass`/`.ssa`, `.srt`, PGS `.sup`), dispatched by filename suffix.

pub mod ass;
pub mod common;
pub mod duration;
pub mod pgs;
pub mod srt;

use std::path::Path;

use crate::errors::ErrorKind::*;
use crate::errors::*;

pub use ass::AssFile;
pub use pgs::PgsFile;
pub use srt::SrtFile;

/// A parsed subtitle, in whatever one of the three supported formats it came in as.
#[derive(Debug, Clone)]
pub enum Subtitle {
    /// Advanced SubStation Alpha / SubStation Alpha.
    Ass(AssFile),
    /// SubRip.
    Srt(SrtFile),
    /// Presentation Graphics Stream — bitmap, timing-only.
    Pgs(PgsFile),
}

impl Subtitle {
    /// Parse a subtitle file, picking the format from its extension.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Subtitle> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
        match ext.as_str() {
            "ass" | "ssa" => Ok(Subtitle::Ass(AssFile::parse(&data)?)),
            "srt" => Ok(Subtitle::Srt(SrtFile::parse(&data)?)),
            "sup" => Ok(Subtitle::Pgs(PgsFile::parse(&data).map_err(PgsParseError)?)),
            _ => Err(UnknownFileFormat.into()),
        }
    }

    /// The outlier-guarded duration estimate, in seconds (§3 "Duration estimate").
    pub fn max_end_secs(&self) -> f64 {
        match self {
            Subtitle::Ass(f) => duration::estimate_max_end(&f.event_end_times_secs()),
            Subtitle::Srt(f) => duration::estimate_max_end(&f.event_end_times_secs()),
            Subtitle::Pgs(f) => f.max_end_secs,
        }
    }

    /// Shift every timed element by `delta_secs`. A no-op for PGS (duration-only).
    pub fn shift(&mut self, delta_secs: f64) {
        match self {
            Subtitle::Ass(f) => f.shift(delta_secs),
            Subtitle::Srt(f) => f.shift(delta_secs),
            Subtitle::Pgs(_) => {}
        }
    }

    /// Whether this subtitle carries mergeable text content (ASS/SRT) as opposed to being
    /// bitmap-only (PGS), per §3: "no content merging is possible" for PGS.
    pub fn is_mergeable(&self) -> bool {
        !matches!(self, Subtitle::Pgs(_))
    }

    /// Merge `other` into `self`, time-shifted by `time_shift_secs`. Both must be the same
    /// variant (ASS into ASS, SRT into SRT); PGS cannot be merged at all.
    pub fn merge_from(&mut self, other: &Subtitle, time_shift_secs: f64) -> Result<()> {
        match (self, other) {
            (Subtitle::Ass(base), Subtitle::Ass(incoming)) => {
                let name_map = base.reconcile_styles(incoming);
                base.append_events(incoming, time_shift_secs, &name_map);
                Ok(())
            }
            (Subtitle::Srt(base), Subtitle::Srt(incoming)) => {
                base.append(incoming, time_shift_secs);
                Ok(())
            }
            _ => Err(VariantMismatch.into()),
        }
    }

    /// Serialize back to bytes in this subtitle's own format. PGS has no serialized form
    /// since nothing is mutated; callers that need the original bytes keep them separately.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        match self {
            Subtitle::Ass(f) => Ok(f.to_bytes()),
            Subtitle::Srt(f) => Ok(f.to_bytes()),
            Subtitle::Pgs(_) => Err(VariantMismatch.into()),
        }
    }
}
