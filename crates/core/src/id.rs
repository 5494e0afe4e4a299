// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifier newtypes for timers and groups

/// Define a newtype ID wrapper around a random UUID string.
///
/// Generates `generate()`, `as_str()`, `short()` and `Display`.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh random (UUID v4) identifier.
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns a string slice truncated to at most `n` characters.
            pub fn short(&self, n: usize) -> &str {
                truncate(&self.0, n)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

/// Truncate to at most `n` characters without splitting a UTF-8 sequence.
fn truncate(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

define_id! {
    /// Unique identifier for a timer instance.
    ///
    /// Two timer handles are the same timer exactly when their ids match.
    pub struct TimerId;
}

define_id! {
    /// Unique identifier for a timer group.
    ///
    /// Group names are not required to be unique, so registries key groups by id.
    pub struct GroupId;
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
