// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The remux orchestrator (§4.6): chapter injection and BD-to-MKV remuxing, both driven by a
//! [`PlacementPlan`] and the [`tools`](crate::tools) adapters.

pub mod chapters;
pub mod tsmuxer;

use std::path::{Path, PathBuf};

use crate::align::PlacementPlan;
use crate::config::ToolConfig;
use crate::errors::ErrorKind::Cancelled;
use crate::errors::Result;
use crate::mpls::Playlist;
use crate::progress::ProgressHandler;
use crate::tools;

/// Injects chapters into an already-produced MKV in place, using the flattened chapter
/// boundaries of `playlist` (§4.6 "Chapter injection").
pub fn inject_chapters(cfg: &ToolConfig, mkv_path: &Path, playlist: &Playlist) -> Result<()> {
    let offsets: Vec<f64> = playlist.chapter_boundaries().into_iter().map(|b| b.offset_secs).collect();
    log::info!("injecting {} chapter mark(s) into {:?}", offsets.len(), mkv_path);
    tools::mkv_set_chapters(cfg, mkv_path, &offsets)
}

/// Merges `mkv_path` with a new chapter file and writes the result to `out_path`, instead of
/// editing in place.
pub fn merge_with_chapters(cfg: &ToolConfig, mkv_path: &Path, playlist: &Playlist, out_path: &Path) -> Result<()> {
    let offsets: Vec<f64> = playlist.chapter_boundaries().into_iter().map(|b| b.offset_secs).collect();
    tools::mkv_merge_with_chapters(cfg, mkv_path, &offsets, out_path)
}

/// Splits `playlist_mkv` into one file per episode placed in `playlist_index`, using the
/// plan's chapter indices as split points, writing into `out_pattern`.
pub fn split_playlist_by_plan(cfg: &ToolConfig, playlist_mkv: &Path, plan: &PlacementPlan, playlist_index: usize, out_pattern: &Path) -> Result<()> {
    let mut chapter_indices: Vec<usize> = plan
        .placements
        .values()
        .filter(|p| p.playlist_index == playlist_index)
        .map(|p| p.chapter_index)
        .collect();
    chapter_indices.sort_unstable();
    log::info!("splitting playlist {} at chapters {:?}", playlist_index, chapter_indices);
    tools::mkv_split_by_chapters(cfg, playlist_mkv, &chapter_indices, out_pattern)
}

/// One episode's LPCM-to-FLAC remux step: probe tracks, extract and encode every LPCM track
/// to FLAC, then remux dropping the LPCM originals in favor of the FLAC files (§4.6 "BD
/// remux"). `extract_and_encode` is supplied by the caller since extracting raw PCM audio
/// from an MKV is itself routed through whichever external tool the caller prefers (not
/// specified by this crate, §1 "Non-goals": decoding audio).
pub fn remux_episode_audio(
    cfg: &ToolConfig,
    episode_mkv: &Path,
    extract_and_encode: impl Fn(&ToolConfig, usize, &Path) -> Result<PathBuf> + Sync,
    subtitle: Option<&Path>,
    out_path: &Path,
    progress: &dyn ProgressHandler,
) -> Result<()> {
    use rayon::prelude::*;

    let (_total_tracks, lpcm_tracks) = tools::pcm_extract_and_probe(cfg, episode_mkv)?;
    let track_ids: Vec<usize> = lpcm_tracks.keys().copied().collect();

    log::info!("episode {:?}: re-encoding {} LPCM track(s) to FLAC", episode_mkv, track_ids.len());

    let flac_paths: Result<Vec<PathBuf>> = track_ids.par_iter().map(|&track_id| extract_and_encode(cfg, track_id, episode_mkv)).collect();
    let flac_paths = flac_paths?;

    if progress.is_cancelled() {
        return Err(Cancelled.into());
    }

    let replacements: Vec<tools::TrackReplacement> = track_ids
        .into_iter()
        .zip(flac_paths)
        .map(|(track_id, flac_path)| tools::TrackReplacement { track_id, flac_path })
        .collect();

    let track_order: Vec<usize> = (0.._total_tracks).collect();
    tools::remux_with_new_tracks(cfg, episode_mkv, &replacements, subtitle, out_path, &track_order, &[])?;

    progress.inc("remux episode");
    log::info!("episode {:?}: remux complete -> {:?}", episode_mkv, out_path);
    Ok(())
}
