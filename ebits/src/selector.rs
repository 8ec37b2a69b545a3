// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

/// Default lookup substring for [`Selector::Library`].
pub const DEFAULT_LIBRARY_NAME: &str = "libssl";

/// Default lookup substring for [`Selector::Executable`].
pub const DEFAULT_EXECUTABLE_NAME: &str = "where";

const STACK_NAME: &str = "stack";

/// The region category whose base address is being sampled. Chosen once at
/// startup from the CLI mode flag and immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    /// A shared library (DSO) mapping.
    Library,
    /// The main executable image.
    Executable,
    /// The stack region.
    Stack,
}

/// Lookup names for the region categories that are target-specific. The
/// stack lookup is always the literal `"stack"` and is not configurable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupNames {
    pub library: String,
    pub executable: String,
}

impl Default for LookupNames {
    fn default() -> Self {
        Self {
            library: DEFAULT_LIBRARY_NAME.to_owned(),
            executable: DEFAULT_EXECUTABLE_NAME.to_owned(),
        }
    }
}

impl Selector {
    /// The substring a map line must contain to be the line sampled for
    /// this region category.
    pub fn lookup_key<'a>(self, names: &'a LookupNames) -> &'a str {
        match self {
            Selector::Library => &names.library,
            Selector::Executable => &names.executable,
            Selector::Stack => STACK_NAME,
        }
    }
}
