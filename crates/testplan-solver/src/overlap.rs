//! Detect overlapping tests on the same vehicle.
//!
//! Performs a pairwise scan over each vehicle's scheduled tests. Ranges are
//! closed: two tests sharing a single day DO overlap, while a test starting
//! the day after another ends does not.

use testplan_core::{Overlap, Schedule, ScheduledTest};
use tracing::debug;

/// Whether two scheduled tests on the same vehicle share at least one day
pub fn overlaps(a: &ScheduledTest, b: &ScheduledTest) -> bool {
    a.vehicle_id == b.vehicle_id && a.start <= b.end && b.start <= a.end
}

/// Pairwise overlap detector
#[derive(Clone, Copy, Debug, Default)]
pub struct OverlapDetector;

impl OverlapDetector {
    pub fn new() -> Self {
        Self
    }

    /// Find all overlapping pairs, in discovery order: vehicle order, then
    /// first test, then second test.
    pub fn detect(&self, schedule: &Schedule) -> Vec<Overlap> {
        let mut found = Vec::new();

        for vehicle_id in schedule.vehicles() {
            let tests: Vec<&ScheduledTest> = schedule.for_vehicle(vehicle_id).collect();
            for (i, a) in tests.iter().enumerate() {
                for b in &tests[i + 1..] {
                    if overlaps(a, b) {
                        found.push(Overlap {
                            vehicle_id: vehicle_id.to_string(),
                            test_a: a.test_name.clone(),
                            range_a: a.range(),
                            test_b: b.test_name.clone(),
                            range_b: b.range(),
                            shared_days: a.range().shared_days(&b.range()),
                        });
                    }
                }
            }
        }

        debug!(overlaps = found.len(), "overlap scan complete");
        found
    }
}

/// Convenience wrapper around [`OverlapDetector::detect`]
pub fn find_overlaps(schedule: &Schedule) -> Vec<Overlap> {
    OverlapDetector::new().detect(schedule)
}
