// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Empirical ASLR entropy measurement.
//!
//! The measurement is a sampling loop: launch the target executable, capture
//! its memory-map output, extract the base address of one region (a shared
//! library, the executable image, or the stack), and track how many distinct
//! base addresses have been observed across launches. The growth curve and
//! eventual plateau of the distinct-address count estimate the effective
//! randomization entropy of the targeted region.
//!
//! The target is a black box: any executable which, invoked with no
//! arguments, terminates on its own and writes newline-separated map lines
//! to stdout, each optionally a `-`-delimited record whose leading field is
//! an address token.

mod error;
mod observer;
mod sampler;
mod selector;
mod tracker;

pub use error::SampleError;
pub use observer::{CancellationFlag, ObservationLoop};
pub use sampler::{AddressKey, MapSampler, MatchPolicy};
pub use selector::{LookupNames, Selector, DEFAULT_EXECUTABLE_NAME, DEFAULT_LIBRARY_NAME};
pub use tracker::EntropyTracker;
