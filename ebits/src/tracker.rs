// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::sampler::AddressKey;
use std::collections::HashSet;
use tracing::debug;

/// Accumulates the distinct address keys seen across all samples of one
/// run. The set is owned here and only here; it starts empty, grows
/// monotonically, and is discarded at process exit. Nothing is persisted.
#[derive(Debug, Default)]
pub struct EntropyTracker {
    seen: HashSet<AddressKey>,
}

impl EntropyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one sample outcome. A key already present and a `None`
    /// (no-match cycle) both leave the set unchanged; recording never
    /// fails.
    pub fn record(&mut self, key: Option<AddressKey>) {
        if let Some(key) = key {
            if self.seen.insert(key) {
                debug!(distinct = self.seen.len(), "new distinct address observed");
            }
        }
    }

    /// Current number of distinct addresses observed. Non-decreasing over
    /// the tracker's lifetime.
    pub fn count(&self) -> usize {
        self.seen.len()
    }
}
