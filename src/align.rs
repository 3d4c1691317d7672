// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The episode-to-chapter alignment engine.
//!
//! Given one or more decoded [`Playlist`]s and an ordered list of per-episode subtitle
//! durations, decides which chapter boundary begins which episode and how far to shift that
//! episode's subtitle timestamps. This is pure arithmetic over MPLS-declared times; no I/O,
//! no external tools, no suspension points (§5).

use std::collections::BTreeMap;

use crate::errors::ErrorKind::AlignmentError;
use crate::errors::*;
use crate::mpls::{ChapterBoundary, Playlist};

/// Guards against a trailing non-dialogue scene (credits, recap) pushing an episode's
/// subtitle end past the next chapter mark by a modest amount.
pub const TRAILING_TOLERANCE_SECS: f64 = 300.0;

/// Ensures the remaining playlist time can plausibly still hold the next episode before
/// advancing to it.
pub const NEXT_EPISODE_FIT_SECS: f64 = 180.0;

/// A play-item longer than this is a candidate "siamese" clip holding more than one episode.
pub const SIAMESE_CLIP_MIN_SECS: f64 = 2_600.0;

/// Maximum gap between an episode's effective end and a siamese play-item's first mark for
/// that play-item to be treated as holding a second (or further) episode.
pub const SIAMESE_GAP_MAX_SECS: f64 = 1_800.0;

/// A siamese-clip mark only counts if at least this much of the play-item remains after it.
pub const SIAMESE_TAIL_MIN_SECS: f64 = 1_200.0;

/// Where one episode was placed: which playlist, which 1-based chapter index within it, and
/// the playlist-relative offset in seconds at which the episode begins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Index into the `playlists` slice passed to [`align`].
    pub playlist_index: usize,
    /// 1-based chapter index over the flattened chapter-mark list of that playlist.
    pub chapter_index: usize,
    /// Offset in seconds from the playlist start at which the episode begins.
    pub offset_secs: f64,
}

/// The result of [`align`]: a dense `episode_index -> Placement` map. Episodes at the tail
/// with no playlist time left to receive them are simply absent (partial fill, §8 scenario 5).
#[derive(Debug, Clone, Default)]
pub struct PlacementPlan {
    /// One entry per successfully placed episode.
    pub placements: BTreeMap<usize, Placement>,
}

impl PlacementPlan {
    /// The placement for `episode_index`, if any.
    pub fn get(&self, episode_index: usize) -> Option<&Placement> {
        self.placements.get(&episode_index)
    }
}

fn item_start_offsets(playlist: &Playlist) -> Vec<f64> {
    let mut offsets = Vec::with_capacity(playlist.play_items.len());
    let mut running = 0.0;
    for item in &playlist.play_items {
        offsets.push(running);
        running += item.duration_secs();
    }
    offsets
}

/// Runs the greedy (optionally override-assisted) alignment algorithm described in §4.5.
///
/// `durations` is the ordered list of per-episode subtitle durations, in seconds (§3/§4.4).
/// `overrides` pins episode `e` to the given 1-based chapter index of whichever playlist the
/// walk has reached when `e` is the next episode to place; the heuristic is bypassed for that
/// episode but resumes immediately afterward. A pin that the walk never reaches is an error.
pub fn align(playlists: &[Playlist], durations: &[f64], overrides: &BTreeMap<usize, usize>) -> Result<PlacementPlan> {
    let n = durations.len();
    let mut placements: BTreeMap<usize, Placement> = BTreeMap::new();
    let mut e = 0usize;

    for (p_idx, playlist) in playlists.iter().enumerate() {
        if e >= n {
            break;
        }

        let boundaries = playlist.chapter_boundaries();
        let b0 = match boundaries.first() {
            Some(b) => *b,
            None => continue,
        };

        let item_starts = item_start_offsets(playlist);

        let mut marks_by_item: BTreeMap<usize, Vec<ChapterBoundary>> = BTreeMap::new();
        for b in &boundaries {
            marks_by_item.entry(b.play_item_index).or_insert_with(Vec::new).push(*b);
        }

        // invariant: exactly one episode receives the first boundary of the playlist
        placements.insert(
            e,
            Placement {
                playlist_index: p_idx,
                chapter_index: b0.chapter_index,
                offset_secs: b0.offset_secs,
            },
        );
        let mut sub_end = b0.offset_secs + durations[e];
        let mut left = playlist.total_time();

        for (item_idx, item) in playlist.play_items.iter().enumerate() {
            if let Some(marks) = marks_by_item.get(&item_idx) {
                if let Some(first) = marks.first() {
                    if first.chapter_index != b0.chapter_index {
                        let pinned = overrides.get(&(e + 1)) == Some(&first.chapter_index);
                        let heuristic_ok = first.offset_secs > sub_end - TRAILING_TOLERANCE_SECS
                            && e + 1 < n
                            && left > durations[e + 1] - NEXT_EPISODE_FIT_SECS;
                        let eligible = e + 1 < n && !overrides.contains_key(&(e + 1));

                        if pinned || (eligible && heuristic_ok) {
                            e += 1;
                            placements.insert(
                                e,
                                Placement {
                                    playlist_index: p_idx,
                                    chapter_index: first.chapter_index,
                                    offset_secs: first.offset_secs,
                                },
                            );
                            sub_end = first.offset_secs + durations[e];
                        }
                    }

                    if item.duration_secs() > SIAMESE_CLIP_MIN_SECS && sub_end - first.offset_secs < SIAMESE_GAP_MAX_SECS {
                        for m in marks {
                            if e + 1 >= n {
                                break;
                            }
                            if m.offset_secs <= sub_end {
                                continue;
                            }
                            let tail = item_starts[item_idx] + item.duration_secs() - m.offset_secs;
                            let pinned = overrides.get(&(e + 1)) == Some(&m.chapter_index);
                            let eligible = !overrides.contains_key(&(e + 1));

                            if pinned || (eligible && tail > SIAMESE_TAIL_MIN_SECS) {
                                e += 1;
                                placements.insert(
                                    e,
                                    Placement {
                                        playlist_index: p_idx,
                                        chapter_index: m.chapter_index,
                                        offset_secs: m.offset_secs,
                                    },
                                );
                                sub_end = m.offset_secs + durations[e];
                            }
                        }
                    }
                }
            }

            left -= item.duration_secs();
        }

        e += 1;
    }

    for &pinned_episode in overrides.keys() {
        if !placements.contains_key(&pinned_episode) {
            return Err(AlignmentError(format!("override for episode {} was never reached by the alignment walk", pinned_episode)).into());
        }
    }

    Ok(PlacementPlan { placements })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mpls::PlayItem;

    fn playlist(items: Vec<(u32, u32)>, marks: Vec<(usize, Vec<u32>)>) -> Playlist {
        Playlist {
            play_items: items
                .into_iter()
                .enumerate()
                .map(|(_, (in_t, out_t))| PlayItem {
                    clip_name: "00001".to_string(),
                    in_time: in_t,
                    out_time: out_t,
                })
                .collect(),
            chapter_marks: marks.into_iter().collect(),
        }
    }

    const TICK: u32 = 45_000;

    #[test]
    fn two_playlist_two_episode() {
        let a = playlist(vec![(0, TICK * 1440)], vec![(0, vec![0])]);
        let b = playlist(vec![(0, TICK * 1440)], vec![(0, vec![0])]);
        let durations = vec![1430.0, 1430.0];

        let plan = align(&[a, b], &durations, &BTreeMap::new()).unwrap();
        assert_eq!(plan.get(0).unwrap().playlist_index, 0);
        assert_eq!(plan.get(0).unwrap().chapter_index, 1);
        assert!((plan.get(0).unwrap().offset_secs - 0.0).abs() < 1e-6);
        assert_eq!(plan.get(1).unwrap().playlist_index, 1);
        assert_eq!(plan.get(1).unwrap().chapter_index, 1);
    }

    #[test]
    fn siamese_disc_places_two_episodes_from_one_play_item() {
        let p = playlist(vec![(0, TICK * 2880)], vec![(0, vec![0, TICK * 1440])]);
        let durations = vec![1430.0, 1430.0];

        let plan = align(&[p], &durations, &BTreeMap::new()).unwrap();
        assert_eq!(plan.placements.len(), 2);
        assert_eq!(plan.get(0).unwrap().chapter_index, 1);
        assert!((plan.get(0).unwrap().offset_secs - 0.0).abs() < 1e-6);
        assert_eq!(plan.get(1).unwrap().chapter_index, 2);
        assert!((plan.get(1).unwrap().offset_secs - 1440.0).abs() < 1e-6);
    }

    #[test]
    fn partial_fill_leaves_trailing_playlist_unassigned() {
        let p0 = playlist(vec![(0, TICK * 1440)], vec![(0, vec![0])]);
        let p1 = playlist(vec![(0, TICK * 1440)], vec![(0, vec![0])]);
        let p2 = playlist(vec![(0, TICK * 1440)], vec![(0, vec![0])]);
        let durations = vec![1430.0, 1430.0];

        let plan = align(&[p0, p1, p2], &durations, &BTreeMap::new()).unwrap();
        assert_eq!(plan.placements.len(), 2);
        assert_eq!(plan.get(0).unwrap().playlist_index, 0);
        assert_eq!(plan.get(1).unwrap().playlist_index, 1);
        assert!(plan.get(2).is_none());
    }

    #[test]
    fn chapter_ordering_is_strictly_increasing_within_a_playlist() {
        let p = playlist(vec![(0, TICK * 2880)], vec![(0, vec![0, TICK * 1440])]);
        let durations = vec![1430.0, 1430.0];
        let plan = align(&[p], &durations, &BTreeMap::new()).unwrap();
        assert!(plan.get(1).unwrap().chapter_index > plan.get(0).unwrap().chapter_index);
    }

    #[test]
    fn override_pins_an_episode_to_an_explicit_chapter() {
        let p = playlist(vec![(0, TICK * 2880)], vec![(0, vec![0, TICK * 600, TICK * 1440])]);
        let durations = vec![1430.0, 1430.0];
        let mut overrides = BTreeMap::new();
        overrides.insert(1, 3);

        let plan = align(&[p], &durations, &overrides).unwrap();
        assert_eq!(plan.get(1).unwrap().chapter_index, 3);
    }

    #[test]
    fn unreachable_override_is_an_error() {
        let p = playlist(vec![(0, TICK * 1440)], vec![(0, vec![0])]);
        let durations = vec![1430.0, 1430.0];
        let mut overrides = BTreeMap::new();
        overrides.insert(1, 5);

        assert!(align(&[p], &durations, &overrides).is_err());
    }

    #[test]
    fn single_play_item_playlist_still_places_episode_at_offset_zero() {
        let p = playlist(vec![(0, TICK * 1440)], vec![(0, vec![0])]);
        let durations = vec![1430.0];
        let plan = align(&[p], &durations, &BTreeMap::new()).unwrap();
        assert_eq!(plan.placements.len(), 1);
        assert!((plan.get(0).unwrap().offset_secs - 0.0).abs() < 1e-6);
    }
}
