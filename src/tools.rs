// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Thin adapters over the external binaries the remux orchestrator drives (§4.7).
//!
//! Every adapter builds a `Command`, captures `.output()`, and turns a non-zero exit into a
//! `ToolError` carrying the tool name, exit status and stderr — the same shape
//! `antifuchs-intro_chapter_adder`'s `set_chapters()` uses around `mkvpropedit`. Scratch files
//! (chapter text, tsMuxeR meta-files) are created through `mktemp::Temp` so an early `?` return
//! or a panic unwind still cleans them up.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output};

use mktemp::Temp;

use crate::config::ToolConfig;
use crate::errors::ErrorKind::ToolError;
use crate::errors::*;
use crate::remux::chapters::ogm_chapter_text;

fn run(tool_name: &str, output: std::io::Result<Output>) -> Result<Output> {
    let output = output?;
    if !output.status.success() {
        log::error!("external tool `{}` failed with {}", tool_name, output.status);
        return Err(ToolError(tool_name.to_string(), output.status.to_string(), String::from_utf8_lossy(&output.stderr).into_owned()).into());
    }
    Ok(output)
}

fn write_chapter_scratch_file(offsets_secs: &[f64]) -> Result<Temp> {
    let tmp = Temp::new_file()?;
    let mut f = std::fs::File::create(tmp.as_path())?;
    f.write_all(ogm_chapter_text(offsets_secs).as_bytes())?;
    f.sync_all()?;
    Ok(tmp)
}

/// Probes an MKV's duration in seconds by parsing `mkvinfo`'s `| + Duration:` line.
pub fn mkv_duration(cfg: &ToolConfig, path: &Path) -> Result<f64> {
    let output = run("mkvinfo", Command::new(&cfg.mkvinfo).arg(path).output())?;
    let text = String::from_utf8_lossy(&output.stdout);
    parse_mkvinfo_duration(&text).ok_or_else(|| Error::from(format!("mkvinfo output for {:?} had no `Duration:` line", path)))
}

fn parse_mkvinfo_duration(text: &str) -> Option<f64> {
    for line in text.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("| + Duration:") {
            let rest = rest.trim();
            return parse_hms_millis(rest);
        }
    }
    None
}

fn parse_hms_millis(s: &str) -> Option<f64> {
    let mut parts = s.splitn(3, ':');
    let h: f64 = parts.next()?.trim().parse().ok()?;
    let m: f64 = parts.next()?.trim().parse().ok()?;
    let sec_part = parts.next()?.trim();
    let sec_part = sec_part.split(char::is_whitespace).next().unwrap_or(sec_part);
    let s: f64 = sec_part.parse().ok()?;
    Some(h * 3600.0 + m * 60.0 + s)
}

/// In-place chapter edit via `mkvpropedit --chapters <scratch file>`.
pub fn mkv_set_chapters(cfg: &ToolConfig, path: &Path, chapter_offsets_secs: &[f64]) -> Result<()> {
    let tmp = write_chapter_scratch_file(chapter_offsets_secs)?;
    run("mkvpropedit", Command::new(&cfg.mkvpropedit).arg(path).arg("--chapters").arg(tmp.as_path()).output())?;
    Ok(())
}

/// Produces a new MKV with chapters injected, via `mkvmerge --chapters <scratch file>`.
pub fn mkv_merge_with_chapters(cfg: &ToolConfig, path: &Path, chapter_offsets_secs: &[f64], out_path: &Path) -> Result<()> {
    let tmp = write_chapter_scratch_file(chapter_offsets_secs)?;
    run(
        "mkvmerge",
        Command::new(&cfg.mkvmerge)
            .arg("-o")
            .arg(out_path)
            .arg("--chapters")
            .arg(tmp.as_path())
            .arg(path)
            .output(),
    )?;
    Ok(())
}

/// Splits `path` into one file per entry of `split_chapter_indices` via
/// `mkvmerge --split chapters:<list>`, writing to `out_pattern` (mkvmerge's `%03d`-style
/// pattern).
pub fn mkv_split_by_chapters(cfg: &ToolConfig, path: &Path, split_chapter_indices: &[usize], out_pattern: &Path) -> Result<()> {
    let list = split_chapter_indices.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(",");
    run(
        "mkvmerge",
        Command::new(&cfg.mkvmerge)
            .arg("-o")
            .arg(out_pattern)
            .arg("--split")
            .arg(format!("chapters:{}", list))
            .arg(path)
            .output(),
    )?;
    Ok(())
}

/// Probes `path`'s track layout via `mkvinfo`, returning the total track count and the
/// language tag of every LPCM track, keyed by track number.
pub fn pcm_extract_and_probe(cfg: &ToolConfig, path: &Path) -> Result<(usize, BTreeMap<usize, String>)> {
    let output = run("mkvinfo", Command::new(&cfg.mkvinfo).arg(path).output())?;
    let text = String::from_utf8_lossy(&output.stdout);
    Ok(parse_mkvinfo_tracks(&text))
}

fn parse_mkvinfo_tracks(text: &str) -> (usize, BTreeMap<usize, String>) {
    let mut total = 0;
    let mut lpcm_langs = BTreeMap::new();

    let mut current_track: Option<usize> = None;
    let mut current_is_lpcm = false;
    let mut current_lang = "und".to_string();

    for line in text.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("| + Track number:") {
            if let (Some(track), true) = (current_track, current_is_lpcm) {
                lpcm_langs.insert(track, current_lang.clone());
            }
            total += 1;
            current_track = rest.trim().split_whitespace().next().and_then(|s| s.trim_end_matches(|c: char| !c.is_ascii_digit()).parse().ok());
            current_is_lpcm = false;
            current_lang = "und".to_string();
        } else if let Some(rest) = line.strip_prefix("| + Codec ID:") {
            if rest.trim().starts_with("A_PCM") {
                current_is_lpcm = true;
            }
        } else if let Some(rest) = line.strip_prefix("| + Language:") {
            current_lang = rest.trim().to_string();
        }
    }
    if let (Some(track), true) = (current_track, current_is_lpcm) {
        lpcm_langs.insert(track, current_lang);
    }

    (total, lpcm_langs)
}

/// Re-encodes `wav_path` to FLAC at maximum compression.
pub fn flac_encode(cfg: &ToolConfig, wav_path: &Path, out_path: &Path) -> Result<()> {
    run(
        "flac",
        Command::new(&cfg.flac).arg("--best").arg("--force").arg("-o").arg(out_path).arg(wav_path).output(),
    )?;
    Ok(())
}

/// One LPCM-track-to-FLAC-file substitution for [`remux_with_new_tracks`].
#[derive(Debug, Clone)]
pub struct TrackReplacement {
    /// The original track's number (as reported by `mkvinfo`).
    pub track_id: usize,
    /// Path to the FLAC file that should replace it.
    pub flac_path: std::path::PathBuf,
}

/// Drops `replacements`' original LPCM tracks and `drop_tracks`, appends the FLAC
/// replacements and an optional subtitle, and writes the result to `out_path` preserving
/// `track_order`.
pub fn remux_with_new_tracks(
    cfg: &ToolConfig,
    src: &Path,
    replacements: &[TrackReplacement],
    subtitle: Option<&Path>,
    out_path: &Path,
    track_order: &[usize],
    drop_tracks: &[usize],
) -> Result<()> {
    let mut cmd = Command::new(&cfg.mkvmerge);
    cmd.arg("-o").arg(out_path);

    let mut dropped: Vec<usize> = drop_tracks.to_vec();
    dropped.extend(replacements.iter().map(|r| r.track_id));
    if !dropped.is_empty() {
        let ids = dropped.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(",");
        cmd.arg("-d").arg(ids);
    }
    cmd.arg(src);

    for replacement in replacements {
        cmd.arg(&replacement.flac_path);
    }
    if let Some(sub_path) = subtitle {
        cmd.arg(sub_path);
    }

    if !track_order.is_empty() {
        let order = track_order.iter().map(|i| format!("0:{}", i)).collect::<Vec<_>>().join(",");
        cmd.arg("--track-order").arg(order);
    }

    run("mkvmerge", cmd.output())?;
    Ok(())
}

/// Remuxes `m2ts_in` (plus an optional subtitle) into `out_path` via tsMuxeR, given a
/// pre-built meta-file text (§6).
pub fn ts_mux(cfg: &ToolConfig, meta_text: &str, out_path: &Path) -> Result<()> {
    let tmp = Temp::new_file()?;
    {
        let mut f = std::fs::File::create(tmp.as_path())?;
        f.write_all(meta_text.as_bytes())?;
        f.sync_all()?;
    }
    run("tsMuxeR", Command::new(&cfg.tsmuxer).arg(tmp.as_path()).arg(out_path).output())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mkvinfo_duration_line() {
        let text = "| + Segment information\n| + Duration: 00:24:01.250\n| + Another line\n";
        assert_eq!(parse_mkvinfo_duration(text), Some(1441.25));
    }

    #[test]
    fn missing_duration_line_is_none() {
        assert_eq!(parse_mkvinfo_duration("no duration here\n"), None);
    }

    #[test]
    fn parses_tracks_and_lpcm_languages() {
        let text = "\
| + Track number: 1 (track ID for mkvmerge & mkvextract: 0)
| + Codec ID: V_MPEG4/ISO/AVC
| + Track number: 2 (track ID for mkvmerge & mkvextract: 1)
| + Codec ID: A_PCM/INT/LIT
| + Language: jpn
| + Track number: 3 (track ID for mkvmerge & mkvextract: 2)
| + Codec ID: S_HDMV/PGS
| + Language: chi
";
        let (total, lpcm) = parse_mkvinfo_tracks(text);
        assert_eq!(total, 3);
        assert_eq!(lpcm.get(&2), Some(&"jpn".to_string()));
        assert!(!lpcm.contains_key(&1));
        assert!(!lpcm.contains_key(&3));
    }

    #[test]
    fn a_non_zero_exit_surfaces_as_tool_error() {
        // `false` always exits non-zero and exists on every POSIX system.
        let result = run("false", Command::new("false").output());
        assert!(result.is_err());
        match result.unwrap_err() {
            crate::errors::Error(crate::errors::ErrorKind::ToolError(tool, _, _), _) => assert_eq!(tool, "false"),
            e => panic!("expected ToolError, got {:?}", e),
        }
    }
}
