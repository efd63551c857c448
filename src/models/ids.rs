//! Strongly-typed ID wrappers for all entity types
//!
//! Using newtype wrappers prevents accidentally mixing up IDs from different
//! entity types at compile time. IDs are opaque strings: fresh IDs are UUIDs,
//! but records written under earlier schemas may carry arbitrary text (a
//! legacy expense uses its category *name* as the category id).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Error returned when parsing an empty identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyIdError(pub &'static str);

impl fmt::Display for EmptyIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} cannot be empty", self.0)
    }
}

impl std::error::Error for EmptyIdError {}

/// Macro to generate ID newtype wrappers
macro_rules! define_id {
    ($name:ident, $label:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new random ID
            pub fn new() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            /// Get the raw string form
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Whether this ID was minted as a UUID
            pub fn is_uuid(&self) -> bool {
                Uuid::parse_str(&self.0).is_ok()
            }

            /// Short form for terminal display
            pub fn short(&self) -> &str {
                match self.0.char_indices().nth(8) {
                    Some((idx, _)) if self.is_uuid() => &self.0[..idx],
                    _ => &self.0,
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid.to_string())
            }
        }

        impl FromStr for $name {
            type Err = EmptyIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                if s.is_empty() {
                    return Err(EmptyIdError($label));
                }
                Ok(Self(s.to_string()))
            }
        }
    };
}

define_id!(ExpenseId, "Expense id");
define_id!(CategoryId, "Category id");

/// Sentinel id for expenses whose category could not be resolved
pub const UNCATEGORIZED_ID: &str = "uncategorized";

/// Display name paired with [`UNCATEGORIZED_ID`]
pub const UNCATEGORIZED_NAME: &str = "Uncategorized";

impl CategoryId {
    /// The "uncategorized" sentinel
    pub fn uncategorized() -> Self {
        Self(UNCATEGORIZED_ID.to_string())
    }

    /// Check if this is the sentinel id
    pub fn is_uncategorized(&self) -> bool {
        self.0 == UNCATEGORIZED_ID
    }
}

/// Stable user identifier supplied by the authentication boundary
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Parse a user id, rejecting blank input
    pub fn parse(s: &str) -> Result<Self, EmptyIdError> {
        s.parse()
    }

    /// Get the raw string form
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for UserId {
    type Err = EmptyIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(EmptyIdError("User id"));
        }
        Ok(Self(s.to_string()))
    }
}
