//! Strong identifier types for the Herald runtime.
//!
//! All identifiers are 64-bit snowflakes: the high 42 bits encode creation
//! time, so ids are time-ordered and usable for deterministic partitioning.
//! Each entity gets its own newtype to prevent misuse at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

macro_rules! snowflake_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Create an id from a raw snowflake.
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            /// Get the raw snowflake value.
            pub const fn get(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                s.parse::<u64>().map(Self)
            }
        }
    };
}

snowflake_id! {
    /// Identifier of a guild (community container).
    GuildId
}

snowflake_id! {
    /// Identifier of a channel within a guild.
    ChannelId
}

snowflake_id! {
    /// Identifier of a user account.
    UserId
}

snowflake_id! {
    /// Identifier of a role within a guild.
    ///
    /// The role whose id equals its guild's id is the implicit everyone role.
    RoleId
}

impl GuildId {
    /// The everyone role of this guild shares its identifier.
    pub const fn everyone_role(&self) -> RoleId {
        RoleId(self.0)
    }
}
