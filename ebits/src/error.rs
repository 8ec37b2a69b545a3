// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;
use thiserror::Error;

/// Fatal sampling failures. Both variants mean the target environment is
/// broken (missing binary, permissions, broken pipe), so the observation
/// loop stops rather than retrying blindly.
///
/// A sample that finds no matching map line is *not* an error; it is the
/// `Ok(None)` outcome of [`crate::MapSampler::sample`].
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("failed to spawn target process {}: {source}", .target.display())]
    Spawn {
        target: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read stdout of target process {}: {source}", .target.display())]
    Read {
        target: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SampleError {
    /// The target executable the failed sample was launched from.
    pub fn target(&self) -> &PathBuf {
        match self {
            SampleError::Spawn { target, .. } | SampleError::Read { target, .. } => target,
        }
    }
}
