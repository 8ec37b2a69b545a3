// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Builds test binaries with cargo so integration tests can exercise the
//! sampler against real child processes instead of canned strings.
//!
//! Builds are cached between invocations so multiple tests can use the same
//! artifact without doing expensive work twice. Functions here assume they
//! run in the context of a cargo `#[test]` item, so the cargo target
//! directory can be located from the current binary's own path.

use std::{collections::HashMap, env, path::PathBuf, process, sync::Mutex};

use once_cell::sync::OnceCell;

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum BuildProfile {
    Debug,
    Release,
}

#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct ArtifactsBuild {
    pub name: String,
    pub build_profile: BuildProfile,
}

fn inner_build_artifact(c: &ArtifactsBuild) -> anyhow::Result<PathBuf> {
    let mut build_cmd = process::Command::new(env!("CARGO"));
    build_cmd.arg("build");
    if let BuildProfile::Release = c.build_profile {
        build_cmd.arg("--release");
    }
    build_cmd.arg("--bin").arg(&c.name);

    let output = build_cmd.output()?;
    if !output.status.success() {
        anyhow::bail!(
            "Cargo build failed: status code {:?}\nstderr:\n {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stderr)
        );
    }

    // Cargo puts build artifacts under the `target` directory that also
    // contains the currently running test binary, which is assumed not to
    // have been moved out of its build location.
    static ARTIFACT_DIR: OnceCell<PathBuf> = OnceCell::new();
    let artifact_dir = ARTIFACT_DIR.get_or_init(|| {
        let test_bin_location = PathBuf::from(env::args().next().unwrap());
        let mut location_components = test_bin_location.components().rev().peekable();
        loop {
            let Some(c) = location_components.peek() else {
                break;
            };
            if c.as_os_str() == "target" {
                break;
            }
            location_components.next();
        }
        location_components.rev().collect::<PathBuf>()
    });

    let mut artifact_path = artifact_dir.clone();
    artifact_path.push(match c.build_profile {
        BuildProfile::Debug => "debug",
        BuildProfile::Release => "release",
    });
    artifact_path.push(&c.name);
    Ok(artifact_path)
}

/// Builds (or fetches from cache) the given test binary and returns its
/// path. Only call from cargo tests.
pub fn build_artifact(c: &ArtifactsBuild) -> anyhow::Result<PathBuf> {
    static ARTIFACTS: OnceCell<Mutex<HashMap<ArtifactsBuild, PathBuf>>> = OnceCell::new();

    let artifacts = ARTIFACTS.get_or_init(|| Mutex::new(HashMap::new()));
    let mut artifacts = artifacts.lock().unwrap();

    if let Some(path) = artifacts.get(c) {
        return Ok(path.clone());
    }
    let path = inner_build_artifact(c)?;
    artifacts.insert(c.clone(), path.clone());
    Ok(path)
}
