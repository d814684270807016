#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Outcome aggregation system that maintains the histogram and running statistics.
//!
//! Every completed ball is appended to the outcome list and credited to its
//! bin immediately. The published summary, by contrast, is throttled: it is
//! recomputed from the full outcome list once every [`STATS_REFRESH_INTERVAL`]
//! completions (and on [`StatsAggregator::finalize`]), so readers may observe a
//! summary that trails the histogram by a few balls. Chart regeneration is
//! coalesced into a single latch raised every [`CHART_REFRESH_INTERVAL`]
//! completions.

use galton_board_core::{Event, HistogramView, StatsSummary, TheoreticalStats};
use thiserror::Error;
use tracing::{debug, warn};

/// Completions between two summary recomputations.
pub const STATS_REFRESH_INTERVAL: u32 = 5;

/// Completions between two chart refresh requests.
pub const CHART_REFRESH_INTERVAL: u32 = 10;

/// Failures raised while recording outcomes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum StatsError {
    /// The bin index does not exist in the histogram.
    #[error("bin {bin} lies outside a histogram of {bins} bins")]
    BinOutOfRange {
        /// Offending bin index.
        bin: u32,
        /// Number of bins in the histogram.
        bins: usize,
    },
}

/// Accumulates per-run outcomes and derives the published statistics.
#[derive(Debug)]
pub struct StatsAggregator {
    outcomes: Vec<u32>,
    histogram: Vec<u64>,
    summary: StatsSummary,
    dirty: bool,
    refresh_interval: u32,
    chart_interval: u32,
    since_chart: u32,
    chart_pending: bool,
}

impl StatsAggregator {
    /// Creates an aggregator with `bin_count` empty bins and the default cadences.
    #[must_use]
    pub fn new(bin_count: usize) -> Self {
        Self::with_intervals(bin_count, STATS_REFRESH_INTERVAL, CHART_REFRESH_INTERVAL)
    }

    /// Creates an aggregator with custom refresh cadences; zero is treated as one.
    #[must_use]
    pub fn with_intervals(bin_count: usize, refresh_interval: u32, chart_interval: u32) -> Self {
        Self {
            outcomes: Vec::new(),
            histogram: vec![0; bin_count],
            summary: StatsSummary::default(),
            dirty: false,
            refresh_interval: refresh_interval.max(1),
            chart_interval: chart_interval.max(1),
            since_chart: 0,
            chart_pending: true,
        }
    }

    /// Discards every outcome and resizes the histogram to `bin_count` bins.
    pub fn reset(&mut self, bin_count: usize) {
        self.outcomes.clear();
        self.histogram.clear();
        self.histogram.resize(bin_count, 0);
        self.summary = StatsSummary::default();
        self.dirty = false;
        self.since_chart = 0;
    }

    /// Records the bin a ball settled into.
    ///
    /// Emits [`Event::StatsRefreshed`] when the refresh cadence is reached and
    /// [`Event::ChartRefreshDue`] when the chart cadence is reached.
    pub fn record_outcome(&mut self, bin: u32, out: &mut Vec<Event>) -> Result<(), StatsError> {
        let bins = self.histogram.len();
        let slot = usize::try_from(bin)
            .ok()
            .and_then(|index| self.histogram.get_mut(index));
        let Some(slot) = slot else {
            warn!(bin, bins, "rejected outcome outside the histogram");
            return Err(StatsError::BinOutOfRange { bin, bins });
        };
        *slot += 1;
        self.outcomes.push(bin);
        self.dirty = true;

        let completed = self.outcomes.len();
        if completed % self.refresh_interval as usize == 0 {
            out.push(Event::StatsRefreshed {
                summary: self.refresh(),
            });
        }

        self.since_chart += 1;
        if self.since_chart >= self.chart_interval {
            self.since_chart = 0;
            self.chart_pending = true;
            out.push(Event::ChartRefreshDue);
        }
        Ok(())
    }

    /// Computes the summary over every outcome recorded so far.
    ///
    /// This ignores the throttled cache and always reflects the full list.
    #[must_use]
    pub fn compute_stats(&self) -> StatsSummary {
        summarize(&self.outcomes)
    }

    /// Forces the published summary to catch up with the outcome list.
    pub fn finalize(&mut self) -> StatsSummary {
        if self.dirty {
            let _ = self.refresh();
        }
        self.summary
    }

    /// Most recently published summary.
    #[must_use]
    pub const fn summary(&self) -> StatsSummary {
        self.summary
    }

    /// Reports whether outcomes were recorded since the last published summary.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Outcomes in completion order.
    #[must_use]
    pub fn outcomes(&self) -> &[u32] {
        &self.outcomes
    }

    /// Number of recorded outcomes.
    #[must_use]
    pub fn completed(&self) -> u64 {
        self.outcomes.len() as u64
    }

    /// Snapshot of the per-bin counts.
    #[must_use]
    pub fn histogram(&self) -> HistogramView {
        HistogramView::from_counts(self.histogram.clone())
    }

    /// Number of bins in the histogram.
    #[must_use]
    pub fn bin_count(&self) -> usize {
        self.histogram.len()
    }

    /// Reports whether a chart refresh is waiting to be consumed.
    #[must_use]
    pub const fn chart_refresh_pending(&self) -> bool {
        self.chart_pending
    }

    /// Raises the chart refresh latch outside the regular cadence.
    pub fn request_chart_refresh(&mut self, out: &mut Vec<Event>) {
        self.since_chart = 0;
        self.chart_pending = true;
        out.push(Event::ChartRefreshDue);
    }

    /// Consumes the chart refresh latch, returning whether it was raised.
    pub fn take_chart_refresh(&mut self) -> bool {
        std::mem::replace(&mut self.chart_pending, false)
    }

    fn refresh(&mut self) -> StatsSummary {
        self.summary = summarize(&self.outcomes);
        self.dirty = false;
        debug!(
            count = self.summary.count,
            mean = self.summary.mean,
            std_dev = self.summary.std_dev,
            "refreshed outcome summary"
        );
        self.summary
    }
}

/// Summarizes `outcomes` with the population standard deviation.
///
/// An empty list yields zeros; a single outcome has zero spread.
#[must_use]
pub fn summarize(outcomes: &[u32]) -> StatsSummary {
    let count = outcomes.len();
    if count == 0 {
        return StatsSummary::default();
    }
    let n = count as f64;
    let mean = outcomes.iter().map(|&bin| f64::from(bin)).sum::<f64>() / n;
    let std_dev = if count > 1 {
        let squared = outcomes
            .iter()
            .map(|&bin| (f64::from(bin) - mean).powi(2))
            .sum::<f64>();
        (squared / n).sqrt()
    } else {
        0.0
    };
    StatsSummary {
        count: count as u64,
        mean,
        std_dev,
    }
}

/// Binomial mean and standard deviation for `row_count` trials with probability `p`.
#[must_use]
pub fn theoretical(row_count: u32, probability: f64) -> TheoreticalStats {
    let rows = f64::from(row_count);
    TheoreticalStats {
        mean: rows * probability,
        std_dev: (rows * probability * (1.0 - probability)).max(0.0).sqrt(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_all(stats: &mut StatsAggregator, bins: &[u32]) -> Vec<Event> {
        let mut events = Vec::new();
        for &bin in bins {
            stats.record_outcome(bin, &mut events).expect("bin in range");
        }
        events
    }

    #[test]
    fn population_deviation_matches_reference_data() {
        let summary = summarize(&[2, 4, 4, 4, 5, 5, 7, 9]);
        assert_eq!(summary.count, 8);
        assert!((summary.mean - 5.0).abs() < 1e-12);
        assert!((summary.std_dev - 2.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_lists_have_no_spread() {
        assert_eq!(summarize(&[]), StatsSummary::default());
        let single = summarize(&[7]);
        assert_eq!(single.count, 1);
        assert!((single.mean - 7.0).abs() < f64::EPSILON);
        assert!(single.std_dev.abs() < f64::EPSILON);
    }

    #[test]
    fn summary_is_throttled_until_the_cadence_is_reached() {
        let mut stats = StatsAggregator::new(5);
        let events = record_all(&mut stats, &[1, 2, 3, 4]);
        assert!(events.is_empty());
        assert_eq!(stats.summary().count, 0);
        assert!(stats.is_dirty());
        assert_eq!(stats.compute_stats().count, 4);

        let events = record_all(&mut stats, &[0]);
        assert_eq!(stats.summary().count, 5);
        assert!(!stats.is_dirty());
        assert!(matches!(
            events.as_slice(),
            [Event::StatsRefreshed { summary }] if summary.count == 5
        ));
    }

    #[test]
    fn histogram_always_matches_the_outcome_list() {
        let mut stats = StatsAggregator::new(4);
        let _ = record_all(&mut stats, &[0, 3, 3, 1, 3, 2, 2]);
        let histogram = stats.histogram();
        assert_eq!(histogram.as_slice(), &[1, 1, 2, 3]);
        assert_eq!(histogram.total(), stats.completed());
    }

    #[test]
    fn finalize_catches_up_with_pending_outcomes() {
        let mut stats = StatsAggregator::new(4);
        let _ = record_all(&mut stats, &[1, 1, 3]);
        let summary = stats.finalize();
        assert_eq!(summary, stats.compute_stats());
        assert_eq!(stats.summary().count, 3);
    }

    #[test]
    fn out_of_range_bins_are_rejected_without_side_effects() {
        let mut stats = StatsAggregator::new(3);
        let mut events = Vec::new();
        assert_eq!(
            stats.record_outcome(3, &mut events),
            Err(StatsError::BinOutOfRange { bin: 3, bins: 3 })
        );
        assert!(events.is_empty());
        assert_eq!(stats.completed(), 0);
        assert_eq!(stats.histogram().total(), 0);
    }

    #[test]
    fn chart_latch_raises_every_ten_completions() {
        let mut stats = StatsAggregator::new(2);
        assert!(stats.take_chart_refresh(), "fresh boards draw once");
        assert!(!stats.take_chart_refresh());

        let events = record_all(&mut stats, &[0; 9]);
        assert!(!events.contains(&Event::ChartRefreshDue));
        assert!(!stats.chart_refresh_pending());

        let events = record_all(&mut stats, &[1]);
        assert!(events.contains(&Event::ChartRefreshDue));
        assert!(stats.take_chart_refresh());
        assert!(!stats.take_chart_refresh());
    }

    #[test]
    fn reset_resizes_and_clears() {
        let mut stats = StatsAggregator::new(3);
        let _ = record_all(&mut stats, &[0, 1, 2, 2, 1]);
        stats.reset(6);
        assert_eq!(stats.bin_count(), 6);
        assert_eq!(stats.completed(), 0);
        assert_eq!(stats.summary(), StatsSummary::default());
        assert_eq!(stats.histogram().total(), 0);
    }

    #[test]
    fn explicit_chart_requests_restart_the_cadence() {
        let mut stats = StatsAggregator::new(2);
        let _ = stats.take_chart_refresh();
        let _ = record_all(&mut stats, &[0; 7]);

        let mut events = Vec::new();
        stats.request_chart_refresh(&mut events);
        assert_eq!(events, vec![Event::ChartRefreshDue]);
        assert!(stats.take_chart_refresh());

        let events = record_all(&mut stats, &[1; 9]);
        assert!(!events.contains(&Event::ChartRefreshDue));
        let events = record_all(&mut stats, &[1]);
        assert!(events.contains(&Event::ChartRefreshDue));
    }

    #[test]
    fn theoretical_values_follow_the_binomial() {
        let symmetric = theoretical(12, 0.5);
        assert!((symmetric.mean - 6.0).abs() < 1e-12);
        assert!((symmetric.std_dev - 3.0f64.sqrt()).abs() < 1e-12);

        let pinned = theoretical(8, 1.0);
        assert!((pinned.mean - 8.0).abs() < 1e-12);
        assert!(pinned.std_dev.abs() < 1e-12);
    }
}
