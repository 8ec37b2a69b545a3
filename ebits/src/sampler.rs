// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::error::SampleError;
use crate::selector::{LookupNames, Selector};
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::{debug, trace};

/// Canonical identity of an observed region base address. Two keys are
/// equal iff their textual representations are equal; the token is never
/// parsed as a number.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AddressKey(String);

impl AddressKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AddressKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AddressKey {
    fn from(s: &str) -> Self {
        AddressKey(s.to_owned())
    }
}

/// Which matching map line contributes the sample's address key.
///
/// The original tool stopped at the first line containing the lookup
/// substring without checking whether later lines also matched. That
/// behavior is kept as the explicit default rather than buried control
/// flow; `LastMatch` is the alternative for targets whose map lists the
/// interesting mapping last.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchPolicy {
    #[default]
    FirstMatch,
    LastMatch,
}

/// Launches the target once per [`sample`](MapSampler::sample) call and
/// extracts the base address of the selected region from its map output.
#[derive(Debug, Clone)]
pub struct MapSampler {
    target: PathBuf,
    needle: String,
    policy: MatchPolicy,
}

impl MapSampler {
    pub fn new(target: impl Into<PathBuf>, selector: Selector, names: &LookupNames) -> Self {
        Self {
            target: target.into(),
            needle: selector.lookup_key(names).to_owned(),
            policy: MatchPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Runs the target to completion, capturing its full stdout, and scans
    /// it for the selected region's address key.
    ///
    /// Returns `Ok(None)` when no line contains the lookup substring, or
    /// when the matched line carries no `-` delimiter (a malformed record
    /// never yields a partial key). Both are routine per-cycle outcomes,
    /// not errors. The child is always waited to completion, so no sample
    /// leaves an orphaned process behind.
    pub fn sample(&self) -> Result<Option<AddressKey>, SampleError> {
        let child = Command::new(&self.target)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| SampleError::Spawn {
                target: self.target.clone(),
                source,
            })?;

        // Blocks until the target exits; its output is bounded and small,
        // so no streaming is needed.
        let output = child
            .wait_with_output()
            .map_err(|source| SampleError::Read {
                target: self.target.clone(),
                source,
            })?;

        if !output.status.success() {
            debug!(status = %output.status, "target exited with non-zero status");
        }

        let stdout = String::from_utf8(output.stdout).map_err(|e| SampleError::Read {
            target: self.target.clone(),
            source: io::Error::new(io::ErrorKind::InvalidData, e),
        })?;

        let key = extract_address_key(&stdout, &self.needle, self.policy);
        trace!(needle = %self.needle, key = ?key, "sample extracted");
        Ok(key)
    }
}

/// Scans captured map output for a line containing `needle` and takes the
/// portion of that line before the first `-` as the address key.
///
/// Under `FirstMatch` the scan stops at the first matching line even if it
/// is malformed; under `LastMatch` the last matching line wins, with the
/// same malformed-line semantics applied to it.
fn extract_address_key(output: &str, needle: &str, policy: MatchPolicy) -> Option<AddressKey> {
    let mut found = None;
    for line in output.lines() {
        if !line.contains(needle) {
            continue;
        }
        let key = line.split_once('-').map(|(addr, _)| AddressKey::from(addr));
        match policy {
            MatchPolicy::FirstMatch => return key,
            MatchPolicy::LastMatch => found = key,
        }
    }
    found
}
