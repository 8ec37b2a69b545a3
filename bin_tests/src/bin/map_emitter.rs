// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Stand-in for the target executable: prints a small memory map in the
//! line-oriented `base-end perms name` format the sampler scans.
//!
//! By default every run prints the same fixed bases. With
//! `MAP_EMITTER_STATE_FILE` set, the library base is drawn from a fixed
//! rotation keyed by a run counter kept in that file, so consecutive runs
//! look like launches under ASLR with a known, repeatable address sequence.
//! With `MAP_EMITTER_DUP_LIB=1` a second, different library mapping is
//! printed after the first one, for exercising match-policy differences.

use std::env;
use std::fs;

const LIBRARY_BASE_ROTATION: &[&str] = &["7f3a00000000", "7f3b11110000", "7f3a00000000"];

fn rotating_library_base() -> anyhow::Result<&'static str> {
    let Ok(state_file) = env::var("MAP_EMITTER_STATE_FILE") else {
        return Ok(LIBRARY_BASE_ROTATION[0]);
    };
    let runs: usize = fs::read_to_string(&state_file)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0);
    fs::write(&state_file, format!("{}", runs + 1))?;
    Ok(LIBRARY_BASE_ROTATION[runs % LIBRARY_BASE_ROTATION.len()])
}

fn main() -> anyhow::Result<()> {
    let library_base = rotating_library_base()?;

    println!("55d0a1b20000-55d0a1b21000 r-xp where");
    println!("{library_base}-7f3a00100000 r-xp libssl.so.3");
    if env::var("MAP_EMITTER_DUP_LIB").as_deref() == Ok("1") {
        println!("deadbeef0000-deadbeef1000 r-xp libssl.so.3");
    }
    println!("7ffc00000000-7ffc00021000 rw-p [stack]");
    Ok(())
}
