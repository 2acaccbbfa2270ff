//! Newtype string identifiers shared across the orchestrator.

use std::borrow::Borrow;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shorten an identifier for log output without losing uniqueness in practice.
pub trait ShortId {
    fn short(&self, len: usize) -> &str;
}

impl ShortId for str {
    fn short(&self, len: usize) -> &str {
        let end = self.char_indices().nth(len).map(|(i, _)| i).unwrap_or(self.len());
        &self[..end]
    }
}

/// Defines a newtype wrapper around `String` with the conversions and trait
/// impls every ID type in this crate needs: `Display`, `From<String>`,
/// `From<&str>`, equality against borrowed string types, and `Borrow<str>`
/// so the type can key a `HashMap` and be looked up by `&str`.
macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn short(&self, len: usize) -> &str {
                crate::id::ShortId::short(self.0.as_str(), len)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

pub(crate) use define_id;

/// Generates fresh IDs. Production uses random UUIDs; tests use a
/// deterministic sequential generator so scenario assertions don't need to
/// thread randomness through.
pub trait IdGen: Send + Sync {
    fn next(&self) -> String;
}

#[derive(Debug, Default)]
pub struct UuidIdGen;

impl IdGen for UuidIdGen {
    fn next(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Deterministic ID generator for tests: `seq-1`, `seq-2`, ...
#[derive(Debug, Clone)]
pub struct SequentialIdGen {
    counter: Arc<AtomicU64>,
    prefix: &'static str,
}

impl SequentialIdGen {
    pub fn new(prefix: &'static str) -> Self {
        Self {
            counter: Arc::new(AtomicU64::new(0)),
            prefix,
        }
    }
}

impl IdGen for SequentialIdGen {
    fn next(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}-{}", self.prefix, n)
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
