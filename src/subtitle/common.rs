// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Shared plumbing for the ASS and SRT parsers: BOM/encoding handling, timepoint grammars and
//! the comma-splitting rule a `Text` field needs when it itself contains commas.

use std::str::FromStr;

use combine::char::*;
use combine::combinator::*;
use combine::primitives::{ParseError, ParseResult, Parser, Stream};
use encoding_rs::{UTF_16BE, UTF_16LE};

use crate::timetypes::TimePoint;

/// Returns the string without a leading BOM. Unchanged if `s` does not start with one.
pub fn split_bom(s: &str) -> (&str, &str) {
    if s.as_bytes().iter().take(3).eq([0xEF, 0xBB, 0xBF].iter()) {
        s.split_at(3)
    } else {
        ("", s)
    }
}

/// Reads a text subtitle file, trying UTF-8 (with or without BOM) first and falling back
/// to UTF-16 (BE then LE) — fan-produced subtitles are saved in whatever the author's editor
/// defaulted to, and both encodings show up in the wild.
pub fn read_text_file(data: &[u8]) -> String {
    if let Ok(s) = std::str::from_utf8(data) {
        return s.to_string();
    }

    let (decoded_be, _, had_errors_be) = UTF_16BE.decode(data);
    if !had_errors_be {
        return decoded_be.into_owned();
    }

    let (decoded_le, _, _) = UTF_16LE.decode(data);
    decoded_le.into_owned()
}

/// Parses whitespaces and tabs.
#[inline]
#[allow(trivial_casts)]
pub fn ws<I>() -> Expected<Satisfy<I, fn(char) -> bool>>
where
    I: Stream<Item = char>,
{
    fn f(c: char) -> bool {
        c == ' ' || c == '\t'
    }
    satisfy(f as fn(_) -> _).expected("tab or space")
}

/// Matches a positive or negative integer number.
pub fn number_i64<I>(input: I) -> ParseResult<i64, I>
where
    I: Stream<Item = char>,
{
    (optional(char('-')), many1(digit()))
        .map(|(sign, digits): (Option<_>, String)| {
            let i: i64 = FromStr::from_str(&digits).unwrap();
            if sign.is_some() {
                -i
            } else {
                i
            }
        })
        .expected("positive or negative number")
        .parse_stream(input)
}

/// Create a single-line error string from a `combine` parser error.
pub fn parse_error_to_string<I, R, P>(e: ParseError<I>) -> String
where
    I: Stream<Item = char, Range = R, Position = P>,
    R: PartialEq + Clone + std::fmt::Display,
    P: Ord + std::fmt::Display,
{
    e.to_string().trim().lines().fold(String::new(), |a, b| if a.is_empty() { b.to_string() } else { a + "; " + b })
}

/// Matches an ASS/SSA timepoint like `"0:19:41.99"` (colon-separated, fractional seconds).
pub fn parse_ass_timepoint(s: &str) -> Result<TimePoint, String> {
    let parse_res = (
        parser(number_i64),
        token(':'),
        parser(number_i64),
        token(':'),
        parser(number_i64),
        or(token('.'), token(':')),
        parser(number_i64),
        eof(),
    )
        .map(|(h, _, mm, _, ss, _, frac, _)| TimePoint::from_components(h, mm, ss, frac * 10))
        .parse(s);

    match parse_res {
        Ok((tp, _)) => Ok(tp),
        Err(e) => Err(parse_error_to_string(e)),
    }
}

/// Matches a SubRip timestamp like `"00:24:45,670"`; `,` and `.` are both accepted.
pub fn parse_srt_timepoint(s: &str) -> Result<TimePoint, String> {
    let parse_res = (
        parser(number_i64),
        token(':'),
        parser(number_i64),
        token(':'),
        parser(number_i64),
        or(token(','), token('.')),
        parser(number_i64),
        eof(),
    )
        .map(|(h, _, mm, _, ss, _, ms, _)| TimePoint::from_components(h, mm, ss, ms))
        .parse(s);

    match parse_res {
        Ok((tp, _)) => Ok(tp),
        Err(e) => Err(parse_error_to_string(e)),
    }
}

/// Formats a `TimePoint` as `H:MM:SS.cc` (ASS/SSA style, two centisecond digits).
pub fn format_ass_timepoint(t: TimePoint) -> String {
    let p = if t.msecs() < 0 { -t } else { t };
    format!(
        "{}{}:{:02}:{:02}.{:02}",
        if t.msecs() < 0 { "-" } else { "" },
        p.hours(),
        p.mins_comp(),
        p.secs_comp(),
        p.csecs_comp()
    )
}

/// Formats a `TimePoint` as `HH:MM:SS,mmm` (SubRip style, millisecond precision, comma separator).
pub fn format_srt_timepoint(t: TimePoint) -> String {
    format!("{:02}:{:02}:{:02},{:03}", t.hours(), t.mins_comp(), t.secs_comp(), t.msecs_comp())
}

/// Splits a comma-separated value line into exactly `num_fields` fields, rejoining any
/// fields beyond the format count into the last one (the `Text` field is free-form and may
/// itself contain commas).
pub fn split_fields(line: &str, num_fields: usize) -> Vec<String> {
    let parts: Vec<&str> = line.splitn(num_fields, ',').collect();
    parts.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_bom_strips_utf8_bom() {
        let with_bom = "\u{feff}hello";
        let (bom, rest) = split_bom(with_bom);
        assert_eq!(bom.len(), 3);
        assert_eq!(rest, "hello");
        assert_eq!(split_bom("hello"), ("", "hello"));
    }

    #[test]
    fn ass_timepoint_roundtrips() {
        let t = parse_ass_timepoint("1:02:03.45").unwrap();
        assert_eq!(format_ass_timepoint(t), "1:02:03.45");
    }

    #[test]
    fn srt_timepoint_roundtrips() {
        let t = parse_srt_timepoint("01:02:03,450").unwrap();
        assert_eq!(format_srt_timepoint(t), "01:02:03,450");
    }

    #[test]
    fn split_fields_rejoins_extra_commas_into_last_field() {
        let fields = split_fields("0,0:00:01.00,0:00:02.00,Default,,0,0,0,,hello, world", 9);
        assert_eq!(fields.len(), 9);
        assert_eq!(fields[8], "hello, world");
    }
}
