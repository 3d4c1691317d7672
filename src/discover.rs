// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Input discovery (§6): locating BDMV roots, enumerating candidate playlists, and picking
//! the main one. Also carries `BdmvRoot::complete()`, an ambient filesystem-maintenance
//! helper with no bearing on alignment or merge — it must never be invoked implicitly by
//! either of those paths.

use std::path::{Path, PathBuf};

use crate::errors::Result;
use crate::mpls::Playlist;

/// A directory whose immediate children include a `BDMV` subfolder containing a `PLAYLIST`
/// subfolder.
#[derive(Debug, Clone)]
pub struct BdmvRoot {
    /// The root directory itself.
    pub path: PathBuf,
    /// Every `.mpls` file found directly under `BDMV/PLAYLIST`, in directory-listing order.
    pub candidate_playlists: Vec<PathBuf>,
}

impl BdmvRoot {
    /// Returns `path` as a `BdmvRoot` if it has the expected `BDMV/PLAYLIST` shape, scanning
    /// `PLAYLIST` for files whose name (case-insensitive) ends in `.mpls`.
    pub fn discover<P: AsRef<Path>>(path: P) -> Result<Option<BdmvRoot>> {
        let path = path.as_ref();
        let playlist_dir = path.join("BDMV").join("PLAYLIST");
        if !playlist_dir.is_dir() {
            return Ok(None);
        }

        let mut candidates = Vec::new();
        for entry in std::fs::read_dir(&playlist_dir)? {
            let entry = entry?;
            let file_path = entry.path();
            if file_path.is_file() {
                let ends_with_mpls = file_path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e.eq_ignore_ascii_case("mpls"))
                    .unwrap_or(false);
                if ends_with_mpls {
                    candidates.push(file_path);
                }
            }
        }
        candidates.sort();

        Ok(Some(BdmvRoot {
            path: path.to_path_buf(),
            candidate_playlists: candidates,
        }))
    }

    /// Recursively finds every `BdmvRoot` under `search_root` (including `search_root` itself).
    pub fn discover_all<P: AsRef<Path>>(search_root: P) -> Result<Vec<BdmvRoot>> {
        let mut roots = Vec::new();
        walk(search_root.as_ref(), &mut roots)?;
        Ok(roots)
    }

    /// Parses every candidate playlist and picks the one maximizing
    /// `total_time_no_repeat * (1 + total_marks / 5)` (§6 "Main playlist selection").
    pub fn select_main_playlist(&self) -> Result<Option<(&Path, Playlist)>> {
        let mut best: Option<(&Path, Playlist, f64)> = None;

        for candidate in &self.candidate_playlists {
            let playlist = match Playlist::parse_file(candidate) {
                Ok(p) => p,
                Err(e) => {
                    log::warn!("discover: skipping unparseable playlist {:?}: {}", candidate, e);
                    continue;
                }
            };
            let score = playlist.total_time_no_repeat() * (1.0 + playlist.total_marks() as f64 / 5.0);

            let is_better = match &best {
                Some((_, _, best_score)) => score > *best_score,
                None => true,
            };
            if is_better {
                best = Some((candidate.as_path(), playlist, score));
            }
        }

        Ok(best.map(|(path, playlist, _)| (path, playlist)))
    }

    /// Restores `BDMV/BACKUP` contents into `BDMV` for entries missing from the live tree,
    /// and creates the four standard empty subfolders (`AUXDATA`, `BDJO`, `JAR`, `META`) if
    /// absent. Grounded in `BluraySubtitle.py`'s `completion()`: a disc image copied over
    /// git/rsync (which drop empty directories) loses folders real BD players expect to see,
    /// even though nothing inside them is read by this crate.
    ///
    /// Not called by `align`, `merge` or `remux` — a caller who wants a playable-again disc
    /// tree invokes this explicitly.
    pub fn complete(&self) -> Result<()> {
        let bdmv = self.path.join("BDMV");
        let backup = bdmv.join("BACKUP");

        if backup.is_dir() {
            for entry in std::fs::read_dir(&backup)? {
                let entry = entry?;
                let dest = bdmv.join(entry.file_name());
                if dest.exists() {
                    continue;
                }
                if entry.path().is_dir() {
                    copy_dir_recursive(&entry.path(), &dest)?;
                } else {
                    std::fs::copy(entry.path(), &dest)?;
                }
            }
        }

        for name in ["AUXDATA", "BDJO", "JAR", "META"] {
            let dir = bdmv.join(name);
            if !dir.exists() {
                std::fs::create_dir(&dir)?;
            }
        }

        Ok(())
    }
}

/// Mounts an ISO as a virtual disk and exposes its `BDMV/PLAYLIST` contents as a scratch
/// directory (§6). Platform-specific mounting is explicitly out of scope for this crate; a
/// caller on Windows/macOS/Linux supplies its own implementation over whatever mounting API
/// it has available.
pub trait IsoMountAdapter {
    /// Mounts `iso_path` and copies its `BDMV/PLAYLIST` contents into a scratch directory,
    /// returning the BDMV root under which `PLAYLIST` now lives.
    fn mount(&self, iso_path: &Path) -> Result<PathBuf>;

    /// Releases whatever resources `mount` acquired (unmounting a virtual disk, deleting the
    /// scratch copy).
    fn unmount(&self, mounted_root: &Path) -> Result<()>;
}

fn copy_dir_recursive(src: &Path, dest: &Path) -> Result<()> {
    std::fs::create_dir_all(dest)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let dest_path = dest.join(entry.file_name());
        if entry.path().is_dir() {
            copy_dir_recursive(&entry.path(), &dest_path)?;
        } else {
            std::fs::copy(entry.path(), &dest_path)?;
        }
    }
    Ok(())
}

fn walk(dir: &Path, roots: &mut Vec<BdmvRoot>) -> Result<()> {
    if let Some(root) = BdmvRoot::discover(dir)? {
        roots.push(root);
        return Ok(());
    }

    if !dir.is_dir() {
        return Ok(());
    }

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.path().is_dir() {
            walk(&entry.path(), roots)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn make_bdmv(root: &Path) {
        fs::create_dir_all(root.join("BDMV").join("PLAYLIST")).unwrap();
    }

    #[test]
    fn discovers_a_well_formed_bdmv_root() {
        let tmp = mktemp::Temp::new_dir().unwrap();
        make_bdmv(tmp.as_path());
        fs::write(tmp.as_path().join("BDMV").join("PLAYLIST").join("00001.MPLS"), b"").unwrap();

        let found = BdmvRoot::discover(tmp.as_path()).unwrap().unwrap();
        assert_eq!(found.candidate_playlists.len(), 1);
    }

    #[test]
    fn non_bdmv_directory_is_not_discovered() {
        let tmp = mktemp::Temp::new_dir().unwrap();
        assert!(BdmvRoot::discover(tmp.as_path()).unwrap().is_none());
    }

    #[test]
    fn complete_restores_missing_backup_entries_and_creates_standard_folders() {
        let tmp = mktemp::Temp::new_dir().unwrap();
        make_bdmv(tmp.as_path());
        let backup = tmp.as_path().join("BDMV").join("BACKUP");
        fs::create_dir_all(&backup).unwrap();
        fs::write(backup.join("index.bdmv"), b"data").unwrap();

        let root = BdmvRoot::discover(tmp.as_path()).unwrap().unwrap();
        root.complete().unwrap();

        assert!(tmp.as_path().join("BDMV").join("index.bdmv").exists());
        for name in ["AUXDATA", "BDJO", "JAR", "META"] {
            assert!(tmp.as_path().join("BDMV").join(name).is_dir());
        }
    }

    #[test]
    fn complete_does_not_overwrite_an_existing_entry() {
        let tmp = mktemp::Temp::new_dir().unwrap();
        make_bdmv(tmp.as_path());
        let backup = tmp.as_path().join("BDMV").join("BACKUP");
        fs::create_dir_all(&backup).unwrap();
        fs::write(backup.join("index.bdmv"), b"backup-data").unwrap();
        fs::write(tmp.as_path().join("BDMV").join("index.bdmv"), b"live-data").unwrap();

        let root = BdmvRoot::discover(tmp.as_path()).unwrap().unwrap();
        root.complete().unwrap();

        let contents = fs::read(tmp.as_path().join("BDMV").join("index.bdmv")).unwrap();
        assert_eq!(contents, b"live-data");
    }
}
