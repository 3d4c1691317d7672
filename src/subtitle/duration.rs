// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Outlier-guarded duration estimation, shared by all subtitle kinds.

/// The outlier-guard threshold: if the second-largest end time sits more than this many
/// seconds below the largest, the largest is assumed to be a commentary/credits track that
/// overran the episode, and the second-largest is used instead.
pub const OUTLIER_GUARD_SECS: f64 = 300.0;

/// Given every observed "this is where a line/segment ends" timestamp (in seconds), returns
/// the estimated episode duration: the maximum, unless the second-largest value is more than
/// [`OUTLIER_GUARD_SECS`] below it, in which case the second-largest is returned instead.
///
/// Deterministic and total: an empty input yields `0.0`, which callers treat as "no duration
/// information" rather than an error.
pub fn estimate_max_end(end_times_secs: &[f64]) -> f64 {
    if end_times_secs.is_empty() {
        return 0.0;
    }

    let mut sorted: Vec<f64> = end_times_secs.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());

    let max = sorted[sorted.len() - 1];
    if sorted.len() < 2 {
        return max;
    }

    let second = sorted[sorted.len() - 2];
    if second < max - OUTLIER_GUARD_SECS {
        second
    } else {
        max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_zero() {
        assert_eq!(estimate_max_end(&[]), 0.0);
    }

    #[test]
    fn single_value_is_returned_as_is() {
        assert_eq!(estimate_max_end(&[42.0]), 42.0);
    }

    #[test]
    fn close_values_use_the_max() {
        let v = estimate_max_end(&[1380.0, 1390.0]);
        assert_eq!(v, 1390.0);
    }

    #[test]
    fn outlier_commentary_track_falls_back_to_second_largest() {
        let v = estimate_max_end(&[1380.0, 1390.0, 4000.0]);
        assert_eq!(v, 1390.0);
    }
}
