// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Decodes Blu-ray `.mpls` playlist files into a [`Playlist`] of [`PlayItem`]s and chapter marks.
//!
//! Only the fields needed by the alignment engine are read: clip names, in/out times and
//! chapter-mark timestamps. Everything else in the file (stream tables, UO masks, sub-paths)
//! is skipped via the length-prefixed record framing described in the MPLS layout.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::bytes::ByteReader;

/// 45 kHz is the tick rate every MPLS in/out/mark timestamp is expressed in.
pub const MPLS_CLOCK_HZ: f64 = 45_000.0;

/// `.mpls`-parser-specific errors.
#[allow(missing_docs)]
pub mod errors {
    error_chain! {
        errors {
            Truncated(at: usize, field: &'static str) {
                description("mpls file ended unexpectedly")
                display("mpls file ended unexpectedly at offset {} while reading `{}`", at, field)
            }
            NotAnMpls {
                description("file does not look like an mpls playlist")
            }
        }
    }
}

use self::errors::ErrorKind::*;
use self::errors::Result;

/// One clip segment referenced by a playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayItem {
    /// 5-character clip name (matches a `.m2ts`/`.clpi` pair under `STREAM`/`CLIPINF`).
    pub clip_name: String,

    /// Start of the segment, in 45 kHz ticks.
    pub in_time: u32,

    /// End of the segment, in 45 kHz ticks.
    pub out_time: u32,
}

impl PlayItem {
    /// Duration of this play-item in seconds.
    pub fn duration_secs(&self) -> f64 {
        f64::from(self.out_time - self.in_time) / MPLS_CLOCK_HZ
    }
}

/// A decoded `.mpls` playlist: an ordered list of play-items and the chapter marks inside them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playlist {
    /// Play-items in playback order.
    pub play_items: Vec<PlayItem>,

    /// Chapter mark timestamps (45 kHz ticks), keyed by the play-item index they fall in,
    /// in encounter order within each play-item. Timestamps within one play-item are
    /// non-decreasing, as guaranteed by the disc authoring tools.
    pub chapter_marks: BTreeMap<usize, Vec<u32>>,
}

/// A chapter boundary flattened across an entire playlist: `offset_secs` from the start of
/// the playlist at which this mark occurs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChapterBoundary {
    /// 1-based chapter index over the whole playlist.
    pub chapter_index: usize,
    /// Index into `Playlist::play_items` this boundary falls in.
    pub play_item_index: usize,
    /// Offset in seconds from the start of the playlist.
    pub offset_secs: f64,
}

impl Playlist {
    /// Parse a playlist from an on-disk `.mpls` file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Playlist> {
        let data = fs::read(path.as_ref()).map_err(|_| Error::from(NotAnMpls))?;
        Playlist::parse_bytes(&data)
    }

    /// Parse a playlist from an already-loaded byte buffer.
    pub fn parse_bytes(data: &[u8]) -> Result<Playlist> {
        if data.len() < 16 {
            return Err(NotAnMpls.into());
        }

        let mut header = ByteReader::new(data);
        header.seek(8);
        let playlist_start_offset = header.read_u32().map_err(|_| Truncated(8, "playlist_start_offset"))? as usize;
        let playlist_mark_start_offset = header
            .read_u32()
            .map_err(|_| Truncated(12, "playlist_mark_start_offset"))? as usize;

        let play_items = Self::parse_play_items(data, playlist_start_offset)?;
        let chapter_marks = Self::parse_chapter_marks(data, playlist_mark_start_offset)?;

        Ok(Playlist { play_items, chapter_marks })
    }

    fn parse_play_items(data: &[u8], playlist_start_offset: usize) -> Result<Vec<PlayItem>> {
        let mut r = ByteReader::new(data);
        r.seek(playlist_start_offset);
        r.skip(6).map_err(|_| Truncated(playlist_start_offset, "playlist header"))?;
        let nb_play_items = r.read_u16().map_err(|_| Truncated(r.pos(), "nb_play_items"))?;
        r.skip(2).map_err(|_| Truncated(r.pos(), "playlist reserved bytes"))?;

        let mut play_items = Vec::with_capacity(nb_play_items as usize);
        for _ in 0..nb_play_items {
            let record_start = r.pos();
            let length = r.read_u16().map_err(|_| Truncated(record_start, "play_item length"))? as usize;

            if length != 0 {
                let clip_name = r.read_str(5).map_err(|_| Truncated(r.pos(), "clip_name"))?;
                r.skip(7).map_err(|_| Truncated(r.pos(), "play_item reserved bytes"))?;
                let in_time = r.read_u32().map_err(|_| Truncated(r.pos(), "in_time"))?;
                let out_time = r.read_u32().map_err(|_| Truncated(r.pos(), "out_time"))?;
                play_items.push(PlayItem {
                    clip_name,
                    in_time,
                    out_time,
                });
            }

            r.seek(record_start + length + 2);
        }

        Ok(play_items)
    }

    fn parse_chapter_marks(data: &[u8], playlist_mark_start_offset: usize) -> Result<BTreeMap<usize, Vec<u32>>> {
        let mut r = ByteReader::new(data);
        r.seek(playlist_mark_start_offset);
        r.skip(4).map_err(|_| Truncated(playlist_mark_start_offset, "playlist_mark header"))?;
        let nb_playlist_marks = r.read_u16().map_err(|_| Truncated(r.pos(), "nb_playlist_marks"))?;

        let mut marks: BTreeMap<usize, Vec<u32>> = BTreeMap::new();
        for _ in 0..nb_playlist_marks {
            r.skip(2).map_err(|_| Truncated(r.pos(), "mark reserved bytes"))?;
            let ref_to_play_item_id = r.read_u16().map_err(|_| Truncated(r.pos(), "ref_to_play_item_id"))? as usize;
            let mark_timestamp = r.read_u32().map_err(|_| Truncated(r.pos(), "mark_timestamp"))?;
            r.skip(6).map_err(|_| Truncated(r.pos(), "mark trailing bytes"))?;
            marks.entry(ref_to_play_item_id).or_insert_with(Vec::new).push(mark_timestamp);
        }

        Ok(marks)
    }

    /// Total playback time of the playlist in seconds, counting every play-item.
    pub fn total_time(&self) -> f64 {
        self.play_items.iter().map(PlayItem::duration_secs).sum()
    }

    /// Total playback time counting each distinct clip name once, regardless of how many
    /// times it loops through play-items (used for main-playlist selection, see `discover`).
    pub fn total_time_no_repeat(&self) -> f64 {
        let mut seen: BTreeMap<&str, f64> = BTreeMap::new();
        for item in &self.play_items {
            seen.entry(item.clip_name.as_str()).or_insert_with(|| item.duration_secs());
        }
        seen.values().sum()
    }

    /// Total number of chapter marks across all play-items.
    pub fn total_marks(&self) -> usize {
        self.chapter_marks.values().map(Vec::len).sum()
    }

    /// Flatten the chapter marks into an ordered list of playlist-relative boundaries.
    ///
    /// Ordering matches `PlacementPlan`'s contract: iterate `chapter_marks` by play-item index
    /// (a `BTreeMap` already does this), then by timestamp within that play-item.
    pub fn chapter_boundaries(&self) -> Vec<ChapterBoundary> {
        let mut offsets_before = Vec::with_capacity(self.play_items.len());
        let mut running = 0.0;
        for item in &self.play_items {
            offsets_before.push(running);
            running += item.duration_secs();
        }

        let mut boundaries = Vec::with_capacity(self.total_marks());
        let mut chapter_index = 0;
        for (&play_item_index, timestamps) in &self.chapter_marks {
            let item = match self.play_items.get(play_item_index) {
                Some(item) => item,
                None => continue,
            };
            let base_offset = offsets_before[play_item_index];
            for &ts in timestamps {
                chapter_index += 1;
                let offset_secs = base_offset + f64::from(ts.saturating_sub(item.in_time)) / MPLS_CLOCK_HZ;
                boundaries.push(ChapterBoundary {
                    chapter_index,
                    play_item_index,
                    offset_secs,
                });
            }
        }

        boundaries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a minimal but byte-accurate `.mpls` fixture: one play-item of `dur_ticks`
    /// ticks, with chapter marks at the given tick offsets from its `in_time`.
    fn build_fixture(in_time: u32, out_time: u32, mark_offsets: &[u32]) -> Vec<u8> {
        let mut play_items_section = Vec::new();
        play_items_section.extend_from_slice(&[0u8; 6]); // skipped header bytes
        play_items_section.extend_from_slice(&1u16.to_be_bytes()); // nb_play_items
        play_items_section.extend_from_slice(&[0u8; 2]); // reserved

        let mut item_body = Vec::new();
        item_body.extend_from_slice(b"00001");
        item_body.extend_from_slice(&[0u8; 7]);
        item_body.extend_from_slice(&in_time.to_be_bytes());
        item_body.extend_from_slice(&out_time.to_be_bytes());
        play_items_section.extend_from_slice(&(item_body.len() as u16).to_be_bytes());
        play_items_section.extend_from_slice(&item_body);

        let mut marks_section = Vec::new();
        marks_section.extend_from_slice(&[0u8; 4]); // skipped header bytes
        marks_section.extend_from_slice(&(mark_offsets.len() as u16).to_be_bytes());
        for &off in mark_offsets {
            marks_section.extend_from_slice(&[0u8; 2]); // reserved
            marks_section.extend_from_slice(&0u16.to_be_bytes()); // ref_to_play_item_id = 0
            marks_section.extend_from_slice(&(in_time + off).to_be_bytes());
            marks_section.extend_from_slice(&[0u8; 6]); // trailing reserved
        }

        let playlist_start_offset = 16u32;
        let playlist_mark_start_offset = playlist_start_offset + play_items_section.len() as u32;

        let mut data = Vec::new();
        data.extend_from_slice(b"MPLS0200"); // 8-byte magic + version, unused by the parser
        data.extend_from_slice(&playlist_start_offset.to_be_bytes());
        data.extend_from_slice(&playlist_mark_start_offset.to_be_bytes());
        data.extend_from_slice(&play_items_section);
        data.extend_from_slice(&marks_section);
        data
    }

    #[test]
    fn round_trips_in_out_time_and_marks() {
        let data = build_fixture(0, 45_000 * 1440, &[0, 45_000 * 720]);
        let playlist = Playlist::parse_bytes(&data).unwrap();

        assert_eq!(playlist.play_items.len(), 1);
        assert_eq!(playlist.play_items[0].clip_name, "00001");
        assert_eq!(playlist.play_items[0].in_time, 0);
        assert_eq!(playlist.play_items[0].out_time, 45_000 * 1440);

        assert_eq!(playlist.chapter_marks.get(&0).unwrap(), &vec![0, 45_000 * 720]);
    }

    #[test]
    fn total_time_matches_sum_of_play_items() {
        let data = build_fixture(0, 45_000 * 1440, &[0]);
        let playlist = Playlist::parse_bytes(&data).unwrap();
        assert!((playlist.total_time() - 1440.0).abs() < 1e-6);
        assert!(playlist.total_time() >= playlist.total_time_no_repeat());
    }

    #[test]
    fn chapter_boundaries_are_offsets_from_playlist_start() {
        let data = build_fixture(0, 45_000 * 2880, &[0, 45_000 * 1440]);
        let playlist = Playlist::parse_bytes(&data).unwrap();
        let boundaries = playlist.chapter_boundaries();
        assert_eq!(boundaries.len(), 2);
        assert_eq!(boundaries[0].chapter_index, 1);
        assert!((boundaries[0].offset_secs - 0.0).abs() < 1e-6);
        assert_eq!(boundaries[1].chapter_index, 2);
        assert!((boundaries[1].offset_secs - 1440.0).abs() < 1e-6);
    }

    #[test]
    fn empty_chapter_marks_for_some_play_items_are_skipped() {
        // two play-items, only the second has a mark
        let mut play_items_section = Vec::new();
        play_items_section.extend_from_slice(&[0u8; 6]);
        play_items_section.extend_from_slice(&2u16.to_be_bytes());
        play_items_section.extend_from_slice(&[0u8; 2]);

        for (name, in_t, out_t) in [("00001", 0u32, 45_000 * 600), ("00002", 0u32, 45_000 * 600)] {
            let mut item_body = Vec::new();
            item_body.extend_from_slice(name.as_bytes());
            item_body.extend_from_slice(&[0u8; 7]);
            item_body.extend_from_slice(&in_t.to_be_bytes());
            item_body.extend_from_slice(&out_t.to_be_bytes());
            play_items_section.extend_from_slice(&(item_body.len() as u16).to_be_bytes());
            play_items_section.extend_from_slice(&item_body);
        }

        let mut marks_section = Vec::new();
        marks_section.extend_from_slice(&[0u8; 4]);
        marks_section.extend_from_slice(&1u16.to_be_bytes());
        marks_section.extend_from_slice(&[0u8; 2]);
        marks_section.extend_from_slice(&1u16.to_be_bytes()); // ref_to_play_item_id = 1
        marks_section.extend_from_slice(&0u32.to_be_bytes());
        marks_section.extend_from_slice(&[0u8; 6]);

        let playlist_start_offset = 16u32;
        let playlist_mark_start_offset = playlist_start_offset + play_items_section.len() as u32;
        let mut data = Vec::new();
        data.extend_from_slice(b"MPLS0200");
        data.extend_from_slice(&playlist_start_offset.to_be_bytes());
        data.extend_from_slice(&playlist_mark_start_offset.to_be_bytes());
        data.extend_from_slice(&play_items_section);
        data.extend_from_slice(&marks_section);

        let playlist = Playlist::parse_bytes(&data).unwrap();
        assert!(playlist.chapter_marks.get(&0).is_none());
        let boundaries = playlist.chapter_boundaries();
        assert_eq!(boundaries.len(), 1);
        assert_eq!(boundaries[0].play_item_index, 1);
    }
}
