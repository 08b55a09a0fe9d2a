//! Content domains.
//!
//! A domain is the unit of independent fetch, persist and diff. The three
//! domains never share rows in the store and never block one another.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the independently synced sections of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentDomain {
    Movies,
    Series,
    LiveChannels,
}

impl ContentDomain {
    /// All domains, in the order a sync cycle processes them.
    pub const ALL: [ContentDomain; 3] = [
        ContentDomain::Movies,
        ContentDomain::Series,
        ContentDomain::LiveChannels,
    ];

    /// Stable storage key for this domain.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Movies => "movies",
            Self::Series => "series",
            Self::LiveChannels => "live_channels",
        }
    }
}

impl fmt::Display for ContentDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentDomain {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movies" => Ok(Self::Movies),
            "series" => Ok(Self::Series),
            "live_channels" | "live" => Ok(Self::LiveChannels),
            other => Err(Error::UnknownDomain(other.to_string())),
        }
    }
}
