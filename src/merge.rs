// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Consumes a [`PlacementPlan`] plus the raw per-episode subtitles and emits one merged
//! subtitle per playlist (§4.3).

use std::path::{Path, PathBuf};

use crate::align::PlacementPlan;
use crate::errors::*;
use crate::subtitle::Subtitle;

/// Builds the merged, playlist-wide subtitle for `playlist_index` out of `subtitles` (indexed
/// by episode) and `plan`. Episodes are appended in episode-index order, each shifted by its
/// own placement offset (§5: "its merged subtitle is emitted before the next playlist's merge
/// begins" — the caller is expected to call this once per playlist, in playlist order).
///
/// Returns `Ok(None)` if no episode was placed in this playlist (§8 scenario 5, partial fill),
/// or if the first placed episode's subtitle is bitmap-only (PGS) and therefore has no
/// mergeable text content (§3: "for bitmap-only subtitles, no content merging is possible").
pub fn merge_playlist(plan: &PlacementPlan, subtitles: &[Subtitle], playlist_index: usize) -> Result<Option<Subtitle>> {
    let mut episodes: Vec<(usize, f64)> = plan
        .placements
        .iter()
        .filter(|(_, p)| p.playlist_index == playlist_index)
        .map(|(&episode, p)| (episode, p.offset_secs))
        .collect();
    episodes.sort_by_key(|(episode, _)| *episode);

    let (first_episode, first_offset) = match episodes.first() {
        Some(&(e, off)) => (e, off),
        None => return Ok(None),
    };

    if !subtitles[first_episode].is_mergeable() {
        log::info!("playlist {}: episode {} subtitle is bitmap-only, skipping merge", playlist_index, first_episode);
        return Ok(None);
    }

    log::info!("playlist {}: merging {} episode(s)", playlist_index, episodes.len());

    let mut merged = subtitles[first_episode].clone();
    merged.shift(first_offset);

    for &(episode, offset) in &episodes[1..] {
        merged.merge_from(&subtitles[episode], offset)?;
    }

    log::info!("playlist {}: merge complete", playlist_index);
    Ok(Some(merged))
}

/// The file extension a `Subtitle` serializes to.
fn extension(subtitle: &Subtitle) -> &'static str {
    match subtitle {
        Subtitle::Ass(f) => match f.script_type {
            crate::subtitle::ass::ScriptType::V4 => "ssa",
            crate::subtitle::ass::ScriptType::V4Plus => "ass",
        },
        Subtitle::Srt(_) => "srt",
        Subtitle::Pgs(_) => "sup",
    }
}

/// The two output paths a merged subtitle is written to (§6): next to the BDMV root, named
/// after the root folder, and next to the selected MPLS, named after its stem.
pub fn output_paths(bdmv_root: &Path, mpls_path: &Path, subtitle: &Subtitle) -> (PathBuf, PathBuf) {
    let ext = extension(subtitle);

    let folder_name = bdmv_root.file_name().and_then(|n| n.to_str()).unwrap_or("output");
    let root_path = bdmv_root.join(format!("{}.{}", folder_name, ext));

    let mpls_stem = mpls_path.file_stem().and_then(|n| n.to_str()).unwrap_or("output");
    let mpls_sibling_path = mpls_path.with_file_name(format!("{}.{}", mpls_stem, ext));

    (root_path, mpls_sibling_path)
}

/// Writes `subtitle` to both of its [`output_paths`].
pub fn write_merged_subtitle(bdmv_root: &Path, mpls_path: &Path, subtitle: &Subtitle) -> Result<()> {
    let bytes = subtitle.to_bytes()?;
    let (root_path, mpls_sibling_path) = output_paths(bdmv_root, mpls_path, subtitle);
    std::fs::write(&root_path, &bytes)?;
    std::fs::write(&mpls_sibling_path, &bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::Placement;
    use crate::subtitle::srt::SrtFile;
    use std::collections::BTreeMap;

    fn srt(text: &str) -> Subtitle {
        Subtitle::Srt(SrtFile::parse_str(text).unwrap())
    }

    #[test]
    fn merges_episodes_in_order_with_offsets() {
        let sub0 = srt("1\n00:00:01,000 --> 00:00:02,000\nfirst\n");
        let sub1 = srt("1\n00:00:01,000 --> 00:00:02,000\nsecond\n");

        let mut placements = BTreeMap::new();
        placements.insert(0, Placement { playlist_index: 0, chapter_index: 1, offset_secs: 0.0 });
        placements.insert(1, Placement { playlist_index: 0, chapter_index: 2, offset_secs: 100.0 });
        let plan = PlacementPlan { placements };

        let merged = merge_playlist(&plan, &[sub0, sub1], 0).unwrap().unwrap();
        match merged {
            Subtitle::Srt(f) => {
                assert_eq!(f.entries.len(), 2);
                assert!((f.entries[1].start.secs_f64() - 101.0).abs() < 1e-6);
            }
            _ => panic!("expected srt"),
        }
    }

    #[test]
    fn unassigned_playlist_yields_none() {
        let plan = PlacementPlan::default();
        let subs: Vec<Subtitle> = Vec::new();
        assert!(merge_playlist(&plan, &subs, 0).unwrap().is_none());
    }

    #[test]
    fn output_paths_use_root_folder_name_and_mpls_stem() {
        let sub = srt("1\n00:00:01,000 --> 00:00:02,000\nhi\n");
        let root = Path::new("/discs/MyShow");
        let mpls = Path::new("/discs/MyShow/BDMV/PLAYLIST/00001.mpls");
        let (root_path, mpls_path) = output_paths(root, mpls, &sub);
        assert_eq!(root_path, Path::new("/discs/MyShow/MyShow.srt"));
        assert_eq!(mpls_path, Path::new("/discs/MyShow/BDMV/PLAYLIST/00001.srt"));
    }
}
