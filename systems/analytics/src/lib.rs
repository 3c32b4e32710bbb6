#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic analytics system that tallies movement and trigger activity.

use std::time::Duration;

use tilewalk_core::{Event, TravelReport};

/// Configuration parameters required to construct the analytics system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    report_interval: Duration,
}

impl Config {
    /// Creates a new configuration using the provided publish cadence.
    #[must_use]
    pub const fn new(report_interval: Duration) -> Self {
        Self { report_interval }
    }
}

/// Pure system that counts world events and periodically publishes a report.
#[derive(Debug)]
pub struct Analytics {
    report_interval: Duration,
    accumulator: Duration,
    report: TravelReport,
}

impl Analytics {
    /// Creates a new analytics system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            report_interval: config.report_interval,
            accumulator: Duration::ZERO,
            report: TravelReport::default(),
        }
    }

    /// Returns the counters accumulated so far.
    #[must_use]
    pub fn report(&self) -> TravelReport {
        self.report
    }

    /// Consumes world events to update counters and publish reports.
    ///
    /// A report event is appended to `out` at most once per call, whenever
    /// the configured interval of simulated time has elapsed since the last
    /// publication.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Event>) {
        let mut accumulated = Duration::ZERO;

        for event in events {
            match event {
                Event::TimeAdvanced { dt } => {
                    accumulated = accumulated.saturating_add(*dt);
                }
                Event::StepCommitted { .. } => {
                    self.report.steps_committed += 1;
                }
                Event::StepCompleted { .. } => {
                    self.report.steps_completed += 1;
                }
                Event::StepRejected { .. } => {
                    self.report.steps_rejected += 1;
                }
                Event::PropInteracted { .. } => {
                    self.report.interactions += 1;
                }
                Event::ZoneEntered { .. } => {
                    self.report.zone_entries += 1;
                }
                Event::ZoneExited { .. } => {
                    self.report.zone_exits += 1;
                }
                _ => {}
            }
        }

        if accumulated.is_zero() || self.report_interval.is_zero() {
            return;
        }

        self.accumulator = self.accumulator.saturating_add(accumulated);
        if self.accumulator >= self.report_interval {
            while self.accumulator >= self.report_interval {
                self.accumulator -= self.report_interval;
            }
            out.push(Event::AnalyticsUpdated {
                report: self.report,
            });
        }
    }
}
