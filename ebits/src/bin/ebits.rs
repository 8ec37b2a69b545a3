// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

#[cfg(not(unix))]
fn main() {}

#[cfg(unix)]
fn main() -> anyhow::Result<()> {
    unix::main()
}

#[cfg(unix)]
mod unix {
    use anyhow::Context;
    use clap::{command, Arg, ArgAction, ArgGroup};
    use ebits::{
        CancellationFlag, LookupNames, MapSampler, MatchPolicy, ObservationLoop, Selector,
        DEFAULT_EXECUTABLE_NAME, DEFAULT_LIBRARY_NAME,
    };
    use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet};
    use std::io::{self, Write};
    use std::sync::OnceLock;
    use tracing::info;
    use tracing_subscriber::EnvFilter;

    static SHUTDOWN_FLAG: OnceLock<CancellationFlag> = OnceLock::new();

    extern "C" fn handle_shutdown_signal(_signum: libc::c_int) {
        // Only an atomic store happens here; anything more is not
        // async-signal-safe.
        if let Some(flag) = SHUTDOWN_FLAG.get() {
            flag.cancel();
        }
    }

    /// Installs SIGINT/SIGTERM handlers that request cooperative shutdown.
    /// SA_RESTART keeps the in-flight child wait intact so cancellation is
    /// only ever observed between cycles and no child is left orphaned.
    fn register_shutdown_handlers(cancel: &CancellationFlag) -> anyhow::Result<()> {
        anyhow::ensure!(
            SHUTDOWN_FLAG.set(cancel.clone()).is_ok(),
            "shutdown handlers already registered"
        );
        let action = SigAction::new(
            SigHandler::Handler(handle_shutdown_signal),
            SaFlags::SA_RESTART,
            SigSet::empty(),
        );
        for sig in [signal::SIGINT, signal::SIGTERM] {
            // SAFETY: the handler performs only an atomic store.
            unsafe { signal::sigaction(sig, &action) }
                .with_context(|| format!("failed to install handler for {sig}"))?;
        }
        Ok(())
    }

    /// Exactly one of the three mode flags must be supplied; the group
    /// rejects both zero and more than one with a usage error before any
    /// cycle runs.
    fn cli() -> clap::Command {
        command!()
            .about("Estimates effective ASLR entropy by repeatedly launching a target and counting distinct region base addresses")
            .arg(
                Arg::new("dso")
                    .short('d')
                    .action(ArgAction::SetTrue)
                    .help("DSO mode: sample the shared library's base address"),
            )
            .arg(
                Arg::new("executable")
                    .short('e')
                    .action(ArgAction::SetTrue)
                    .help("executable mode: sample the main image's base address"),
            )
            .arg(
                Arg::new("stack")
                    .short('s')
                    .action(ArgAction::SetTrue)
                    .help("stack mode: sample the stack's base address"),
            )
            .group(
                ArgGroup::new("mode")
                    .args(["dso", "executable", "stack"])
                    .required(true),
            )
            .arg(
                Arg::new("target")
                    .long("target")
                    .default_value("./where")
                    .help("path to the target executable whose map is sampled"),
            )
            .arg(
                Arg::new("lib-name")
                    .long("lib-name")
                    .default_value(DEFAULT_LIBRARY_NAME)
                    .help("lookup substring for DSO mode"),
            )
            .arg(
                Arg::new("exe-name")
                    .long("exe-name")
                    .default_value(DEFAULT_EXECUTABLE_NAME)
                    .help("lookup substring for executable mode"),
            )
            .arg(
                Arg::new("prefer-last")
                    .long("prefer-last")
                    .action(ArgAction::SetTrue)
                    .help("take the last matching map line instead of the first"),
            )
    }

    pub fn main() -> anyhow::Result<()> {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(io::stderr)
            .init();

        let matches = cli().get_matches();

        let selector = if matches.get_flag("dso") {
            Selector::Library
        } else if matches.get_flag("executable") {
            Selector::Executable
        } else {
            Selector::Stack
        };
        let policy = if matches.get_flag("prefer-last") {
            MatchPolicy::LastMatch
        } else {
            MatchPolicy::FirstMatch
        };
        let names = LookupNames {
            library: matches
                .get_one::<String>("lib-name")
                .map(String::clone)
                .unwrap_or_else(|| DEFAULT_LIBRARY_NAME.to_owned()),
            executable: matches
                .get_one::<String>("exe-name")
                .map(String::clone)
                .unwrap_or_else(|| DEFAULT_EXECUTABLE_NAME.to_owned()),
        };
        let target = matches
            .get_one::<String>("target")
            .map(String::clone)
            .unwrap_or_else(|| "./where".to_owned());

        let cancel = CancellationFlag::new();
        register_shutdown_handlers(&cancel)?;

        info!(%target, ?selector, ?policy, "starting observation run");
        let sampler = MapSampler::new(target, selector, &names).with_policy(policy);
        let mut observation = ObservationLoop::new(sampler, cancel.clone());

        // The running distinct-count, one integer per cycle, is the sole
        // data product; diagnostics go to stderr via tracing.
        let mut out = io::stdout().lock();
        observation.run(|count| {
            if writeln!(out, "{count}").and_then(|()| out.flush()).is_err() {
                // The consumer of our output went away; treat it like an
                // operator shutdown request.
                cancel.cancel();
            }
        })?;

        Ok(())
    }

}
