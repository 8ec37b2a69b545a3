// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::env;
use std::path::PathBuf;
use std::sync::Mutex;

use bin_tests::{build_artifact, ArtifactsBuild, BuildProfile};
use ebits::{
    CancellationFlag, LookupNames, MapSampler, MatchPolicy, ObservationLoop, Selector,
};

// The emitter is configured through process-global environment variables,
// so tests that touch or depend on them must not interleave.
static ENV_LOCK: Mutex<()> = Mutex::new(());

fn map_emitter() -> PathBuf {
    build_artifact(&ArtifactsBuild {
        name: "map_emitter".to_owned(),
        build_profile: BuildProfile::Debug,
    })
    .unwrap()
}

#[test]
fn sampler_extracts_library_base_from_real_child() {
    let _guard = ENV_LOCK.lock().unwrap();
    let sampler = MapSampler::new(map_emitter(), Selector::Library, &LookupNames::default());
    let key = sampler.sample().unwrap().unwrap();
    assert_eq!(key.as_str(), "7f3a00000000");
}

#[test]
fn sampler_covers_all_region_selectors() {
    let _guard = ENV_LOCK.lock().unwrap();
    let emitter = map_emitter();
    let names = LookupNames::default();

    let exe = MapSampler::new(&emitter, Selector::Executable, &names);
    assert_eq!(exe.sample().unwrap().unwrap().as_str(), "55d0a1b20000");

    let stack = MapSampler::new(&emitter, Selector::Stack, &names);
    assert_eq!(stack.sample().unwrap().unwrap().as_str(), "7ffc00000000");
}

#[test]
fn match_policy_selects_first_or_last_mapping() {
    let _guard = ENV_LOCK.lock().unwrap();
    let emitter = map_emitter();
    let names = LookupNames::default();
    env::set_var("MAP_EMITTER_DUP_LIB", "1");

    let first = MapSampler::new(&emitter, Selector::Library, &names);
    assert_eq!(first.sample().unwrap().unwrap().as_str(), "7f3a00000000");

    let last = MapSampler::new(&emitter, Selector::Library, &names)
        .with_policy(MatchPolicy::LastMatch);
    assert_eq!(last.sample().unwrap().unwrap().as_str(), "deadbeef0000");

    env::remove_var("MAP_EMITTER_DUP_LIB");
}

#[test]
fn observation_loop_reports_running_distinct_count() {
    let _guard = ENV_LOCK.lock().unwrap();
    let tmpdir = tempfile::TempDir::new().unwrap();
    let state_file = tmpdir.path().join("emitter_runs");
    env::set_var("MAP_EMITTER_STATE_FILE", &state_file);

    // The emitter rotates its library base A, B, A across runs, so three
    // cycles must report 1, 2, 2.
    let sampler = MapSampler::new(map_emitter(), Selector::Library, &LookupNames::default());
    let cancel = CancellationFlag::new();
    let mut observation = ObservationLoop::new(sampler, cancel.clone());

    let mut counts = vec![];
    observation
        .run(|count| {
            counts.push(count);
            if counts.len() == 3 {
                cancel.cancel();
            }
        })
        .unwrap();

    env::remove_var("MAP_EMITTER_STATE_FILE");
    assert_eq!(counts, vec![1, 2, 2]);
    assert_eq!(observation.distinct_count(), 2);
}

#[test]
fn no_match_cycles_keep_the_loop_running() {
    let _guard = ENV_LOCK.lock().unwrap();
    // A lookup name no emitter line contains: every cycle is a no-match,
    // recorded as a no-op with the count still reported.
    let names = LookupNames {
        library: "libnotloaded".to_owned(),
        executable: "where".to_owned(),
    };
    let sampler = MapSampler::new(map_emitter(), Selector::Library, &names);
    let cancel = CancellationFlag::new();
    let mut observation = ObservationLoop::new(sampler, cancel.clone());

    let mut counts = vec![];
    observation
        .run(|count| {
            counts.push(count);
            if counts.len() == 2 {
                cancel.cancel();
            }
        })
        .unwrap();

    assert_eq!(counts, vec![0, 0]);
}
