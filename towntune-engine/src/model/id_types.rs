//! Identity types for groups and voice channels

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to generate common ID type implementations
macro_rules! impl_id_type {
    ($name:ident) => {
        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name::new(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name::new(s)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                $name::new(id.to_string())
            }
        }
    };
}

/// Unique identifier for a chat group (guild / server)
///
/// Opaque to the engine; usually the platform's snowflake rendered as a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(String);

impl_id_type!(GroupId);

/// Identifier of a voice channel inside a group
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(String);

impl_id_type!(ChannelId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_id() {
        let id = GroupId::new("81384788765712384");
        assert_eq!(id.as_str(), "81384788765712384");
        assert_eq!(GroupId::from(81384788765712384u64), id);
        assert_eq!(format!("{}", id), "81384788765712384");
    }

    #[test]
    fn test_channel_id_equality() {
        assert_eq!(ChannelId::from("lobby"), ChannelId::new("lobby".to_string()));
        assert_ne!(ChannelId::from("lobby"), ChannelId::from("music"));
    }
}
