// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Advanced SubStation Alpha (`.ass`/`.ssa`) parsing, serialization and merging.
//!
//! Styles and events are kept as row-oriented records (`Vec<String>` aligned to the
//! `Format:` declaration of their section) rather than one struct field per known
//! attribute, because real-world `.ass` files disagree on which optional columns they
//! carry and the merger must preserve whatever columns were actually present.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use crate::subtitle::common::{format_ass_timepoint, parse_ass_timepoint, read_text_file, split_bom, split_fields};
use crate::timetypes::TimePoint;

use self::errors::ErrorKind::*;
use self::errors::*;

/// `.ssa`/`.ass`-parser-specific errors.
#[allow(missing_docs)]
pub mod errors {
    error_chain! {
        errors {
            EventsFormatNotFound {
                description(".ass/.ssa file did not have a `Format:` line in its `[Events]` section")
            }
            MissingField(section: &'static str, field: &'static str) {
                display("the `{}` field is missing from the `Format:` line in the `[{}]` section", field, section)
            }
            TextFieldNotLast {
                description("the `Text` field must be the last field in the `[Events]` `Format:` line")
            }
        }
    }
}

/// Whether the file declares `[V4 Styles]` (SSA) or `[V4+ Styles]` (ASS) headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptType {
    /// `.ssa`, `[V4 Styles]`.
    V4,
    /// `.ass`, `[V4+ Styles]`.
    V4Plus,
}

/// A `Style:` row, values aligned to `AssFile::style_format`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Style {
    raw: Vec<String>,
}

/// An event row (`Dialogue:`, `Comment:`, ...), values aligned to `AssFile::event_format`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// The line kind, e.g. `"Dialogue"` or `"Comment"`.
    pub kind: String,
    raw: Vec<String>,
}

/// A parsed `.ass`/`.ssa` subtitle file.
#[derive(Debug, Clone)]
pub struct AssFile {
    /// Raw lines of the `[Script Info]` section, including the header line, verbatim.
    pub script_header: Vec<String>,

    /// Raw lines of the `[Aegisub Project Garbage]` section, verbatim; empty if absent.
    pub garbage_header: Vec<String>,

    /// `[V4 Styles]` vs `[V4+ Styles]`.
    pub script_type: ScriptType,

    /// The `Format:` declaration for the `[V4(+) Styles]` section.
    pub style_format: Vec<String>,

    /// The `Format:` declaration for the `[Events]` section.
    pub event_format: Vec<String>,

    /// Parsed styles, in file order.
    pub styles: Vec<Style>,

    /// Parsed events, in file order.
    pub events: Vec<Event>,

    /// Indices into `events` that have been soft-deleted (excluded from output but kept for
    /// index stability of whatever external references a caller may hold).
    pub deleted_event_indices: BTreeSet<usize>,

    style_name_idx: Option<usize>,
    event_start_idx: usize,
    event_end_idx: usize,
    event_style_idx: usize,
    event_text_idx: usize,
}

fn find_field(format: &[String], name: &str) -> Option<usize> {
    format.iter().position(|f| f.trim() == name)
}

impl AssFile {
    /// Parse a `.ass`/`.ssa` subtitle from raw file bytes.
    pub fn parse(data: &[u8]) -> Result<AssFile> {
        let text = read_text_file(data);
        let (_, text) = split_bom(&text);
        Self::parse_str(text)
    }

    /// Parse a `.ass`/`.ssa` subtitle from already-decoded text.
    pub fn parse_str(text: &str) -> Result<AssFile> {
        #[derive(PartialEq, Clone, Copy)]
        enum Section {
            None,
            ScriptInfo,
            Garbage,
            Styles,
            Events,
        }

        let mut section = Section::None;
        let mut script_type = ScriptType::V4Plus;

        let mut script_header = Vec::new();
        let mut garbage_header = Vec::new();
        let mut style_format: Option<Vec<String>> = None;
        let mut event_format: Option<Vec<String>> = None;
        let mut styles = Vec::new();
        let mut events = Vec::new();

        for (line_num, line) in text.lines().enumerate() {
            let trimmed = line.trim();

            if trimmed.starts_with('[') && trimmed.ends_with(']') {
                section = match &trimmed[1..trimmed.len() - 1] {
                    "Script Info" => Section::ScriptInfo,
                    "Aegisub Project Garbage" => Section::Garbage,
                    "V4 Styles" => {
                        script_type = ScriptType::V4;
                        Section::Styles
                    }
                    "V4+ Styles" => {
                        script_type = ScriptType::V4Plus;
                        Section::Styles
                    }
                    "Events" => Section::Events,
                    _ => Section::None,
                };
                continue;
            }

            if trimmed.is_empty() || trimmed.starts_with(';') {
                continue;
            }

            match section {
                Section::ScriptInfo => script_header.push(line.to_string()),
                Section::Garbage => garbage_header.push(line.to_string()),
                Section::Styles => {
                    if let Some(rest) = trimmed.strip_prefix("Format:") {
                        if style_format.is_none() {
                            style_format = Some(rest.split(',').map(|s| s.trim().to_string()).collect());
                        }
                    } else if let Some(rest) = trimmed.strip_prefix("Style:") {
                        match &style_format {
                            Some(fmt) => {
                                let fields = split_fields(rest.trim_start(), fmt.len());
                                if fields.len() == fmt.len() {
                                    styles.push(Style { raw: fields });
                                } else {
                                    log::warn!("ass: skipping malformed Style line {}: field count mismatch", line_num + 1);
                                }
                            }
                            None => log::warn!("ass: skipping Style line {} before any Format: line", line_num + 1),
                        }
                    }
                }
                Section::Events => {
                    if let Some(rest) = trimmed.strip_prefix("Format:") {
                        if event_format.is_none() {
                            event_format = Some(rest.split(',').map(|s| s.trim().to_string()).collect());
                        }
                    } else if let Some(colon) = trimmed.find(':') {
                        let kind = trimmed[..colon].trim().to_string();
                        let rest = &trimmed[colon + 1..];
                        match &event_format {
                            Some(fmt) => {
                                let fields = split_fields(rest.trim_start(), fmt.len());
                                if fields.len() == fmt.len() {
                                    events.push(Event { kind, raw: fields });
                                } else {
                                    log::warn!("ass: skipping malformed event line {}: field count mismatch", line_num + 1);
                                }
                            }
                            None => log::warn!("ass: skipping event line {} before any Format: line", line_num + 1),
                        }
                    }
                }
                Section::None => {}
            }
        }

        let event_format = event_format.ok_or_else(|| Error::from(EventsFormatNotFound))?;
        let event_start_idx = find_field(&event_format, "Start").ok_or_else(|| Error::from(MissingField("Events", "Start")))?;
        let event_end_idx = find_field(&event_format, "End").ok_or_else(|| Error::from(MissingField("Events", "End")))?;
        let event_style_idx = find_field(&event_format, "Style").ok_or_else(|| Error::from(MissingField("Events", "Style")))?;
        let event_text_idx = find_field(&event_format, "Text").ok_or_else(|| Error::from(MissingField("Events", "Text")))?;
        if event_text_idx != event_format.len() - 1 {
            return Err(TextFieldNotLast.into());
        }

        let style_format = style_format.unwrap_or_default();
        let style_name_idx = find_field(&style_format, "Name");

        Ok(AssFile {
            script_header,
            garbage_header,
            script_type,
            style_format,
            event_format,
            styles,
            events,
            deleted_event_indices: BTreeSet::new(),
            style_name_idx,
            event_start_idx,
            event_end_idx,
            event_style_idx,
            event_text_idx,
        })
    }

    /// Serialize back to `.ass`/`.ssa` bytes (UTF-8 with BOM, canonical section order).
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = String::new();
        out.push('\u{feff}');

        out.push_str("[Script Info]\n");
        for line in &self.script_header {
            out.push_str(line);
            out.push('\n');
        }
        out.push('\n');

        if !self.garbage_header.is_empty() {
            out.push_str("[Aegisub Project Garbage]\n");
            for line in &self.garbage_header {
                out.push_str(line);
                out.push('\n');
            }
            out.push('\n');
        }

        let styles_header = match self.script_type {
            ScriptType::V4 => "[V4 Styles]",
            ScriptType::V4Plus => "[V4+ Styles]",
        };
        out.push_str(styles_header);
        out.push('\n');
        out.push_str("Format: ");
        out.push_str(&self.style_format.join(", "));
        out.push('\n');
        for style in &self.styles {
            out.push_str("Style: ");
            out.push_str(&style.raw.join(","));
            out.push('\n');
        }
        out.push('\n');

        out.push_str("[Events]\n");
        out.push_str("Format: ");
        out.push_str(&self.event_format.join(", "));
        out.push('\n');
        for (idx, event) in self.events.iter().enumerate() {
            if self.deleted_event_indices.contains(&idx) {
                continue;
            }
            out.push_str(&event.kind);
            out.push_str(": ");
            out.push_str(&event.raw.join(","));
            out.push('\n');
        }

        out.into_bytes()
    }

    /// Mark an event as deleted; it is excluded from `to_bytes()` but keeps its index.
    pub fn delete_event(&mut self, idx: usize) {
        self.deleted_event_indices.insert(idx);
    }

    /// The free-form `Text` field of an event.
    pub fn event_text<'a>(&self, event: &'a Event) -> &'a str {
        &event.raw[self.event_text_idx]
    }

    /// The `Style` field of an event — the name of the style it references.
    pub fn event_style_name<'a>(&self, event: &'a Event) -> &'a str {
        &event.raw[self.event_style_idx]
    }

    /// Shift every (non-deleted) event's start and end time by `delta_secs`.
    pub fn shift(&mut self, delta_secs: f64) {
        let delta = crate::timetypes::TimeDelta::from_secs_f64(delta_secs);
        for (idx, event) in self.events.iter_mut().enumerate() {
            if self.deleted_event_indices.contains(&idx) {
                continue;
            }
            if let Ok(start) = self.event_time(event, self.event_start_idx) {
                self.set_event_time(event, self.event_start_idx, start + delta);
            }
            if let Ok(end) = self.event_time(event, self.event_end_idx) {
                self.set_event_time(event, self.event_end_idx, end + delta);
            }
        }
    }

    /// The largest end time across all (non-deleted) events, in seconds. `0.0` if there are none.
    pub fn max_end_secs(&self) -> f64 {
        self.events
            .iter()
            .enumerate()
            .filter(|(idx, _)| !self.deleted_event_indices.contains(idx))
            .filter_map(|(_, e)| self.event_time(e, self.event_end_idx).ok())
            .map(|t| t.secs_f64())
            .fold(0.0, f64::max)
    }

    /// All (non-deleted) event end times, in seconds — used by the outlier-guarded duration estimator.
    pub fn event_end_times_secs(&self) -> Vec<f64> {
        self.events
            .iter()
            .enumerate()
            .filter(|(idx, _)| !self.deleted_event_indices.contains(idx))
            .filter_map(|(_, e)| self.event_time(e, self.event_end_idx).ok())
            .map(|t| t.secs_f64())
            .collect()
    }

    fn event_time(&self, event: &Event, idx: usize) -> std::result::Result<TimePoint, String> {
        parse_ass_timepoint(event.raw[idx].trim())
    }

    fn set_event_time(&self, event: &mut Event, idx: usize, t: TimePoint) {
        event.raw[idx] = format_ass_timepoint(t);
    }

    fn style_fingerprint(&self, style: &Style) -> BTreeMap<String, String> {
        self.style_format.iter().cloned().zip(style.raw.iter().cloned()).collect()
    }

    fn style_name(&self, style: &Style) -> Option<&str> {
        self.style_name_idx.map(|idx| style.raw[idx].as_str())
    }

    fn set_style_name(&self, style: &mut Style, name: String) {
        if let Some(idx) = self.style_name_idx {
            style.raw[idx] = name;
        }
    }

    /// Reconciles `other`'s styles into `self`, returning the map from `other`'s original
    /// style name to the name it should be referenced by in appended events (§4.3).
    pub(crate) fn reconcile_styles(&mut self, other: &AssFile) -> BTreeMap<String, String> {
        let mut name_map = BTreeMap::new();

        let mut fingerprints: BTreeSet<Vec<String>> = self.styles.iter().map(|s| s.raw.clone()).collect();

        for incoming in &other.styles {
            let old_name = match other.style_name(incoming) {
                Some(n) => n.to_string(),
                None => continue,
            };

            // identical field-by-field representation already present: just map, don't append
            let incoming_fp = other.style_fingerprint(incoming);
            let already_present = self.styles.iter().any(|s| self.style_fingerprint(s) == incoming_fp);
            if already_present {
                name_map.insert(old_name, old_name.clone());
                continue;
            }

            let mut candidate = Style { raw: incoming.raw.clone() };
            let mut candidate_name = old_name.clone();

            loop {
                let name_clashes = self.styles.iter().any(|s| self.style_name(s) == Some(candidate_name.as_str()));
                if !name_clashes {
                    break;
                }
                candidate_name.push('1');
                self.set_style_name(&mut candidate, candidate_name.clone());

                if fingerprints.contains(&candidate.raw) {
                    // a style with this exact renamed representation already exists: drop, map
                    name_map.insert(old_name.clone(), candidate_name.clone());
                    candidate_name.clear();
                    break;
                }
            }

            if candidate_name.is_empty() {
                // dropped above
                continue;
            }

            self.set_style_name(&mut candidate, candidate_name.clone());
            fingerprints.insert(candidate.raw.clone());
            self.styles.push(candidate);
            name_map.insert(old_name, candidate_name);
        }

        name_map
    }

    /// Appends `other`'s (non-deleted) events to `self`, shifting their times by `time_shift_secs`
    /// and rewriting their `Style` reference through `name_map`. `other`'s event format must be
    /// compatible (same `Start`/`End`/`Style`/`Text` columns); extra columns are carried verbatim
    /// if the column counts match, otherwise each incoming row is re-laid-out onto `self`'s format
    /// by name, defaulting missing columns to an empty string.
    pub(crate) fn append_events(&mut self, other: &AssFile, time_shift_secs: f64, name_map: &BTreeMap<String, String>) {
        let delta = crate::timetypes::TimeDelta::from_secs_f64(time_shift_secs);
        let same_format = self.event_format == other.event_format;

        for (idx, event) in other.events.iter().enumerate() {
            if other.deleted_event_indices.contains(&idx) {
                continue;
            }

            let mut raw = if same_format {
                event.raw.clone()
            } else {
                Self::relayout(&other.event_format, &event.raw, &self.event_format)
            };

            if let Ok(start) = parse_ass_timepoint(raw[self.event_start_idx].trim()) {
                raw[self.event_start_idx] = format_ass_timepoint(start + delta);
            }
            if let Ok(end) = parse_ass_timepoint(raw[self.event_end_idx].trim()) {
                raw[self.event_end_idx] = format_ass_timepoint(end + delta);
            }

            let old_style = raw[self.event_style_idx].trim().to_string();
            if let Some(new_style) = name_map.get(&old_style) {
                raw[self.event_style_idx] = new_style.clone();
            }

            self.events.push(Event { kind: event.kind.clone(), raw });
        }
    }

    fn relayout(from_format: &[String], from_raw: &[String], to_format: &[String]) -> Vec<String> {
        let by_name: BTreeMap<&str, &str> = from_format.iter().map(String::as_str).zip(from_raw.iter().map(String::as_str)).collect();
        to_format.iter().map(|f| by_name.get(f.as_str()).map(|v| v.to_string()).unwrap_or_default()).collect()
    }
}
