// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Resolves paths to the external tool binaries the remux orchestrator drives (§3, §9).
//!
//! Replaces the process-wide lazy-singleton pattern some BD tooling uses for this with a
//! plain value the caller resolves once and passes by reference into every `tools::*` call —
//! easier to test, and usable from multiple threads without synchronization.

use std::path::PathBuf;

use crate::errors::Result;

/// Paths to every external binary the remux path may invoke, plus a scratch directory for
/// intermediate files that are not ephemeral enough for a `mktemp::Temp` guard.
#[derive(Debug, Clone)]
pub struct ToolConfig {
    /// `mkvmerge` — produces new MKVs (splitting by chapters, track reordering).
    pub mkvmerge: PathBuf,
    /// `mkvpropedit` — in-place chapter/tag edits.
    pub mkvpropedit: PathBuf,
    /// `mkvinfo` — human-readable dump used to probe durations and track layout.
    pub mkvinfo: PathBuf,
    /// `tsMuxeR` — remuxes `.m2ts` + subtitle into a new container via a meta-file.
    pub tsmuxer: PathBuf,
    /// `flac` — re-encodes extracted LPCM to FLAC at maximum compression.
    pub flac: PathBuf,
    /// Directory scratch files (chapter text, tsMuxeR meta-files, intermediate WAVs) are
    /// written under.
    pub scratch_dir: PathBuf,
}

impl ToolConfig {
    /// Resolves every binary by name on `PATH`, using `scratch_dir` for intermediates.
    ///
    /// Resolution order for each binary: this function only consults `PATH` (via `which`,
    /// itself a thin wrapper over the platform's executable search) — callers that need an
    /// explicit override should construct `ToolConfig` directly instead of calling this.
    pub fn resolve_from_path(scratch_dir: PathBuf) -> Result<ToolConfig> {
        Ok(ToolConfig {
            mkvmerge: which_binary("mkvmerge")?,
            mkvpropedit: which_binary("mkvpropedit")?,
            mkvinfo: which_binary("mkvinfo")?,
            tsmuxer: which_binary("tsMuxeR")?,
            flac: which_binary("flac")?,
            scratch_dir,
        })
    }
}

fn which_binary(name: &str) -> Result<PathBuf> {
    let path_var = std::env::var_os("PATH").unwrap_or_default();
    for dir in std::env::split_paths(&path_var) {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Ok(candidate);
        }
        #[cfg(windows)]
        {
            let candidate_exe = dir.join(format!("{}.exe", name));
            if candidate_exe.is_file() {
                return Ok(candidate_exe);
            }
        }
    }
    Err(format!("could not find `{}` on PATH", name).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_binary_is_an_error() {
        std::env::set_var("PATH", "/nonexistent-test-path");
        let result = ToolConfig::resolve_from_path(PathBuf::from("/tmp"));
        assert!(result.is_err());
    }

    #[test]
    fn explicit_construction_bypasses_path_lookup() {
        let cfg = ToolConfig {
            mkvmerge: PathBuf::from("/opt/mkvmerge"),
            mkvpropedit: PathBuf::from("/opt/mkvpropedit"),
            mkvinfo: PathBuf::from("/opt/mkvinfo"),
            tsmuxer: PathBuf::from("/opt/tsMuxeR"),
            flac: PathBuf::from("/opt/flac"),
            scratch_dir: PathBuf::from("/tmp/scratch"),
        };
        assert_eq!(cfg.mkvmerge, PathBuf::from("/opt/mkvmerge"));
    }
}
