// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! tsMuxeR meta-file generation (§6).

use std::path::{Path, PathBuf};

const MUXOPT_LINE: &str = "MUXOPT --no-pcr-on-video-pid --new-audio-pes --vbr --vbv-len=500";

/// One non-subtitle track line (video or audio).
#[derive(Debug, Clone)]
pub struct Track {
    /// tsMuxeR's "Stream ID" descriptor, e.g. `"V_MPEG4/ISO/AVC"` or `"A_LPCM"`.
    pub stream_id: String,
    /// Path to the source elementary stream or container.
    pub path: PathBuf,
    /// Language tag, if the source track carried one.
    pub lang: Option<String>,
    /// Explicit track id, if the muxer needs one to disambiguate multiple tracks of a kind.
    pub track_id: Option<u32>,
}

/// A subtitle track appended to the mux, in whichever of the two forms tsMuxeR accepts.
#[derive(Debug, Clone)]
pub enum SubtitleTrack {
    /// PGS bitmap subtitle; `lang` defaults to `"chi"` to match this crate's historical fansub
    /// target, overridable per call.
    Pgs {
        /// Path to the `.sup` file.
        path: PathBuf,
        /// Language tag, e.g. `"chi"`.
        lang: String,
    },
    /// Plain-text subtitle burned in as `S_TEXT/UTF8` with fixed Arial styling.
    Srt {
        /// Path to the `.srt` file.
        path: PathBuf,
        /// Language tag, e.g. `"chi"`.
        lang: String,
    },
}

fn quoted(path: &Path) -> String {
    format!("\"{}\"", path.display())
}

fn track_line(track: &Track) -> String {
    let mut line = format!("{}, {}", track.stream_id, quoted(&track.path));
    if let Some(lang) = &track.lang {
        line.push_str(&format!(", {}", lang));
    }
    if let Some(id) = track.track_id {
        line.push_str(&format!(", track={}", id));
    }
    line
}

fn subtitle_line(subtitle: &SubtitleTrack) -> String {
    match subtitle {
        SubtitleTrack::Pgs { path, lang } => format!("S_HDMV/PGS, {}, fps=23.976, lang={}", quoted(path), lang),
        SubtitleTrack::Srt { path, lang } => format!(
            "S_TEXT/UTF8, {}, font-name=\"Arial\", font-size=65, font-color=0xffffffff, bottom-offset=24, \
             font-border=5, text-align=center, video-width=1920, video-height=1080, fps=23.976, lang={}",
            quoted(path),
            lang
        ),
    }
}

/// Builds the full tsMuxeR meta-file text for `tracks` plus an optional subtitle track.
pub fn build_meta(tracks: &[Track], subtitle: Option<&SubtitleTrack>) -> String {
    let mut lines = vec![MUXOPT_LINE.to_string()];
    lines.extend(tracks.iter().map(track_line));
    if let Some(sub) = subtitle {
        lines.push(subtitle_line(sub));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_meta_with_video_audio_and_pgs_subtitle() {
        let tracks = vec![
            Track { stream_id: "V_MPEG4/ISO/AVC".to_string(), path: PathBuf::from("video.h264"), lang: None, track_id: None },
            Track { stream_id: "A_LPCM".to_string(), path: PathBuf::from("audio.wav"), lang: Some("jpn".to_string()), track_id: Some(1) },
        ];
        let sub = SubtitleTrack::Pgs { path: PathBuf::from("subs.sup"), lang: "chi".to_string() };
        let meta = build_meta(&tracks, Some(&sub));

        let lines: Vec<&str> = meta.lines().collect();
        assert_eq!(lines[0], MUXOPT_LINE);
        assert_eq!(lines[1], "V_MPEG4/ISO/AVC, \"video.h264\"");
        assert_eq!(lines[2], "A_LPCM, \"audio.wav\", jpn, track=1");
        assert_eq!(lines[3], "S_HDMV/PGS, \"subs.sup\", fps=23.976, lang=chi");
    }

    #[test]
    fn builds_meta_with_srt_subtitle() {
        let sub = SubtitleTrack::Srt { path: PathBuf::from("subs.srt"), lang: "chi".to_string() };
        let meta = build_meta(&[], Some(&sub));
        assert!(meta.ends_with(
            "S_TEXT/UTF8, \"subs.srt\", font-name=\"Arial\", font-size=65, font-color=0xffffffff, \
             bottom-offset=24, font-border=5, text-align=center, video-width=1920, video-height=1080, \
             fps=23.976, lang=chi"
        ));
    }

    #[test]
    fn no_subtitle_track_omits_the_last_line() {
        let meta = build_meta(&[], None);
        assert_eq!(meta, MUXOPT_LINE);
    }
}
