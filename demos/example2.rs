extern crate bd_chapter_align;

use bd_chapter_align::BdmvRoot;

/// Discovers a BDMV root under the current directory, picks its main playlist, and restores
/// any folders lost when the disc image was copied over git/rsync.
fn main() {
    let root = BdmvRoot::discover(".").expect("scan for BDMV root").expect("no BDMV/PLAYLIST folder found here");
    println!("found {} candidate playlist(s)", root.candidate_playlists.len());

    if let Some((path, playlist)) = root.select_main_playlist().expect("select main playlist") {
        println!("main playlist: {:?} ({} chapter marks)", path, playlist.total_marks());
    }

    root.complete().expect("restore BDMV/BACKUP contents");
}
