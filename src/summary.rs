// ABOUTME: Running-aggregate accumulator over the sample stream
// ABOUTME: Both encoders feed this sample-by-sample so derived totals agree bit-for-bit
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use crate::models::{RideSummary, Sample};

/// Accumulates whole-activity totals over a single forward pass.
///
/// Distance is a running maximum of every observed value, not the last one:
/// observed source feeds contain non-monotonic and duplicate distances, and
/// the running-maximum policy is the documented contract. Ascent sums only
/// positive deltas between altitude-bearing samples; a sample without
/// altitude leaves the previous-altitude chain untouched.
#[derive(Debug, Clone, Default)]
pub struct SummaryBuilder {
    totals: RideSummary,
    prev_altitude: Option<f64>,
}

impl SummaryBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one sample into the running totals.
    pub fn observe(&mut self, sample: &Sample) {
        if let Some(dist) = sample.distance_m {
            self.totals.total_distance_m = self.totals.total_distance_m.max(dist);
        }
        if let Some(speed) = sample.speed_mps {
            self.totals.max_speed_mps = self.totals.max_speed_mps.max(speed);
        }
        if let Some(alt) = sample.altitude_m {
            if let Some(prev) = self.prev_altitude {
                let delta = alt - prev;
                if delta > 0.0 {
                    self.totals.total_ascent_m += delta;
                }
            }
            self.prev_altitude = Some(alt);
        }
        self.totals.total_elapsed_s = sample.time_offset_s;
    }

    /// Totals accumulated so far. The encoders call this after their
    /// per-sample pass completes.
    #[must_use]
    pub fn finish(self) -> RideSummary {
        self.totals
    }

    /// Read access mid-pass, used when a consumer needs a running value
    /// before the stream ends.
    #[must_use]
    pub fn current(&self) -> &RideSummary {
        &self.totals
    }
}

/// Standalone single-pass aggregation. An empty stream yields all-zero
/// totals and never fails.
pub fn aggregate<'a, I>(samples: I) -> RideSummary
where
    I: IntoIterator<Item = &'a Sample>,
{
    let mut builder = SummaryBuilder::new();
    for sample in samples {
        builder.observe(sample);
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(time_offset_s: f64) -> Sample {
        Sample {
            time_offset_s,
            ..Sample::default()
        }
    }

    fn with_dist(mut s: Sample, d: f64) -> Sample {
        s.distance_m = Some(d);
        s
    }

    fn with_alt(mut s: Sample, a: f64) -> Sample {
        s.altitude_m = Some(a);
        s
    }

    #[test]
    fn test_distance_is_running_maximum_not_last() {
        let samples = vec![
            with_dist(sample(0.0), 50.0),
            with_dist(sample(1.0), 200.0),
            with_dist(sample(2.0), 30.0),
        ];
        let summary = aggregate(&samples);
        assert_eq!(summary.total_distance_m, 200.0);
    }

    #[test]
    fn test_ascent_monotonic_climb() {
        let samples = vec![
            with_alt(sample(0.0), 100.0),
            with_alt(sample(1.0), 105.0),
            with_alt(sample(2.0), 110.0),
        ];
        assert_eq!(aggregate(&samples).total_ascent_m, 10.0);
    }

    #[test]
    fn test_ascent_ignores_descent() {
        // 100 -> 90 contributes nothing; 90 -> 130 is one +40 delta
        let samples = vec![
            with_alt(sample(0.0), 100.0),
            with_alt(sample(1.0), 90.0),
            with_alt(sample(2.0), 130.0),
        ];
        assert_eq!(aggregate(&samples).total_ascent_m, 40.0);
    }

    #[test]
    fn test_altitude_gap_keeps_chain() {
        // The middle sample has no altitude; the chain carries 100 forward
        let samples = vec![
            with_alt(sample(0.0), 100.0),
            sample(1.0),
            with_alt(sample(2.0), 110.0),
        ];
        assert_eq!(aggregate(&samples).total_ascent_m, 10.0);
    }

    #[test]
    fn test_max_speed() {
        let mut a = sample(0.0);
        a.speed_mps = Some(10.0);
        let mut b = sample(1.0);
        b.speed_mps = Some(12.5);
        let mut c = sample(2.0);
        c.speed_mps = Some(11.0);
        assert_eq!(aggregate(&[a, b, c]).max_speed_mps, 12.5);
    }

    #[test]
    fn test_elapsed_is_last_offset() {
        let samples = vec![sample(0.0), sample(30.0), sample(60.0)];
        assert_eq!(aggregate(&samples).total_elapsed_s, 60.0);
    }

    #[test]
    fn test_empty_stream_yields_zeroes() {
        let summary = aggregate(&[]);
        assert_eq!(summary, RideSummary::default());
    }
}
