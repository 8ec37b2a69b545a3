// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::error::SampleError;
use crate::sampler::MapSampler;
use crate::tracker::EntropyTracker;
use std::sync::atomic::{AtomicBool, Ordering::SeqCst};
use std::sync::Arc;
use tracing::{debug, info};

/// Shared cancellation flag for the observation loop. Cloning shares the
/// underlying flag; a store through any clone is seen by all.
///
/// The setter side is expected to be a signal handler, so the flag is a
/// bare atomic: setting it allocates nothing and takes no lock.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(SeqCst)
    }
}

/// Drives the sample/record/report cycle until cancelled or until the
/// sampler fails. Owns the tracker exclusively; there is exactly one
/// mutator and no concurrent reader, so no locking.
pub struct ObservationLoop {
    sampler: MapSampler,
    tracker: EntropyTracker,
    cancel: CancellationFlag,
}

impl ObservationLoop {
    pub fn new(sampler: MapSampler, cancel: CancellationFlag) -> Self {
        Self {
            sampler,
            tracker: EntropyTracker::new(),
            cancel,
        }
    }

    /// Runs cycles until the cancellation flag is observed. The flag is
    /// checked between cycles only: a cycle in flight finishes its sample
    /// (the child is waited to completion) before cancellation takes
    /// effect, so no child is ever orphaned.
    ///
    /// Every completed cycle reports the running distinct-count through
    /// `report`, including no-match cycles. A [`SampleError`] ends the run
    /// immediately; cancellation ends it with `Ok(())`.
    pub fn run(&mut self, mut report: impl FnMut(usize)) -> Result<(), SampleError> {
        let mut cycles = 0u64;
        while !self.cancel.is_cancelled() {
            let key = self.sampler.sample()?;
            self.tracker.record(key);
            cycles += 1;
            report(self.tracker.count());
        }
        debug!(cycles, "cancellation observed between cycles");
        info!(
            cycles,
            distinct = self.tracker.count(),
            "observation run complete"
        );
        Ok(())
    }

    /// Distinct-count accumulated so far.
    pub fn distinct_count(&self) -> usize {
        self.tracker.count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::{LookupNames, Selector};

    #[test]
    fn cancelled_flag_stops_loop_before_first_cycle() {
        let cancel = CancellationFlag::new();
        cancel.cancel();
        // The target does not exist; if a cycle ran, the loop would fail
        // with a spawn error instead of returning cleanly.
        let sampler = MapSampler::new(
            "./definitely-not-a-real-binary",
            Selector::Stack,
            &LookupNames::default(),
        );
        let mut observation = ObservationLoop::new(sampler, cancel);
        let mut reports = 0;
        observation.run(|_| reports += 1).unwrap();
        assert_eq!(reports, 0);
        assert_eq!(observation.distinct_count(), 0);
    }

    #[test]
    fn sampler_failure_is_fatal_to_the_loop() {
        let sampler = MapSampler::new(
            "./definitely-not-a-real-binary",
            Selector::Stack,
            &LookupNames::default(),
        );
        let mut observation = ObservationLoop::new(sampler, CancellationFlag::new());
        let err = observation.run(|_| {}).unwrap_err();
        assert!(matches!(err, SampleError::Spawn { .. }), "got {err:?}");
    }

    #[test]
    fn cancellation_flag_is_shared_across_clones() {
        let flag = CancellationFlag::new();
        let clone = flag.clone();
        assert!(!clone.is_cancelled());
        flag.cancel();
        assert!(clone.is_cancelled());
    }
}
