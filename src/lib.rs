// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

#![deny(
    missing_docs,
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    unused_qualifications
)]

//! Aligns per-episode subtitles to Blu-ray MPLS chapter marks, merges them into one
//! playlist-wide subtitle file, and optionally drives an external-tool remux.
//!
//! The hard core is [`align`]: given one or more decoded [`mpls::Playlist`]s and an ordered
//! list of episode-subtitle durations, it decides which chapter mark begins which episode and
//! produces a [`align::PlacementPlan`]. [`merge`] consumes that plan plus the raw
//! [`subtitle::Subtitle`] values and emits one consolidated subtitle per playlist. [`remux`]
//! optionally consumes the same plan to split and reassemble MKV/M2TS outputs via the
//! [`tools`] adapters.
//!
//! GUI, ISO mounting and invocation of the external binaries themselves are deliberately left
//! to the caller: this crate exposes narrow interfaces ([`discover::IsoMountAdapter`],
//! [`progress::ProgressHandler`]) rather than bundled implementations.

#[macro_use]
extern crate error_chain;
extern crate combine;
extern crate encoding_rs;
extern crate mktemp;
extern crate rayon;

/// The episode-to-chapter alignment engine — the hard core of this crate.
pub mod align;

/// A positional big-endian byte-slice reader shared by the MPLS and PGS decoders.
pub mod bytes;

/// Resolved paths to the external tool binaries the remux orchestrator drives.
pub mod config;

/// BDMV root discovery, main-playlist selection, and disc-tree maintenance.
pub mod discover;

/// Error-chain generated error types.
pub mod errors;

/// A narrow `.m2ts` duration probe used only to cross-check remux output.
pub mod m2ts;

/// Concatenates episode subtitles into one playlist-wide file using a [`align::PlacementPlan`].
pub mod merge;

/// Decodes `.mpls` playlist files into play-items and chapter marks.
pub mod mpls;

/// Cooperative cancellation/progress reporting for long-running remux/merge runs.
pub mod progress;

/// Drives external tools to split MKVs by chapter, re-encode LPCM to FLAC, and reassemble.
pub mod remux;

/// The subtitle data model: parsing, time-shifting and merging ASS/SRT/PGS content.
pub mod subtitle;

/// Types that represent a time point, duration and time span.
pub mod timetypes;

/// Thin adapters over the external binaries the remux orchestrator drives.
pub mod tools;

pub use align::{align, Placement, PlacementPlan};
pub use config::ToolConfig;
pub use discover::{BdmvRoot, IsoMountAdapter};
pub use errors::{Error, ErrorKind, Result};
pub use merge::{merge_playlist, output_paths, write_merged_subtitle};
pub use mpls::{ChapterBoundary, PlayItem, Playlist};
pub use progress::{NullProgressHandler, ProgressHandler};
pub use subtitle::{AssFile, PgsFile, SrtFile, Subtitle};
