extern crate bd_chapter_align;

use std::collections::BTreeMap;

use bd_chapter_align::{align, merge_playlist, Playlist, Subtitle};

/// Aligns two episode subtitles onto a two-playlist BDMV and writes the merged result next to
/// each playlist's MPLS file.
fn main() {
    let playlists = vec![
        Playlist::parse_file("BDMV/PLAYLIST/00001.mpls").expect("parse playlist A"),
        Playlist::parse_file("BDMV/PLAYLIST/00002.mpls").expect("parse playlist B"),
    ];

    let subtitles = vec![
        Subtitle::parse_file("episode01.ass").expect("parse episode 1 subtitle"),
        Subtitle::parse_file("episode02.ass").expect("parse episode 2 subtitle"),
    ];
    let durations: Vec<f64> = subtitles.iter().map(Subtitle::max_end_secs).collect();

    let plan = align(&playlists, &durations, &BTreeMap::new()).expect("could not align episodes to chapters");

    for playlist_index in 0..playlists.len() {
        if let Some(merged) = merge_playlist(&plan, &subtitles, playlist_index).expect("merge failed") {
            let data = merged.to_bytes().expect("serialize merged subtitle");
            println!("playlist {}: merged subtitle is {} bytes", playlist_index, data.len());
        }
    }
}
