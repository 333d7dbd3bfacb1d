//! Surrogate identifiers for projects and tasks.
//!
//! The store assigns integer keys, but every identifier that crosses a
//! boundary (HTTP body, IPC message, client state) is a decimal string.
//! [`Pid`] and [`Tid`] keep the integer internally and always serialize as
//! strings; deserialization accepts either form so a client may send
//! `"25"` or `25`.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

macro_rules! surrogate_id {
    ($(#[$doc:meta])* $name:ident, $label:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw store key.
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Returns the raw store key.
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = InvalidId;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<i64>().map(Self).map_err(|_| InvalidId {
                    kind: $label,
                    value: s.to_string(),
                })
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.to_string()
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                deserializer.deserialize_any(IdVisitor($label)).map(Self)
            }
        }
    };
}

surrogate_id!(
    /// Project identifier (`pid`).
    Pid,
    "pid"
);

surrogate_id!(
    /// Task identifier (`tid`).
    Tid,
    "tid"
);

/// A path parameter or payload field that is not an integer identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} must be an integer, got {value:?}")]
pub struct InvalidId {
    /// Which identifier was being parsed (`pid` or `tid`).
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

struct IdVisitor(&'static str);

impl<'de> Visitor<'de> for IdVisitor {
    type Value = i64;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} as an integer or a decimal string", self.0)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
        Ok(v)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
        i64::try_from(v).map_err(|_| E::custom(format!("{} out of range", self.0)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<i64, E> {
        v.trim()
            .parse()
            .map_err(|_| E::custom(format!("{} must be an integer, got {v:?}", self.0)))
    }
}
