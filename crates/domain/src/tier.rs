//! Endpoint tiers: groups of endpoints with increasing access to low-level
//! functionality.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{NotFoundError, TargetKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    Basic,
    Advanced,
    Raw,
}

impl Tier {
    pub const ALL: [Self; 3] = [Self::Basic, Self::Advanced, Self::Raw];

    /// Path segment used by the REST API.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "Basic",
            Self::Advanced => "Advanced",
            Self::Raw => "Raw",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = NotFoundError;

    /// Path segments are matched exactly, like the device does.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tier| tier.as_str() == s)
            .ok_or_else(|| NotFoundError {
                kind: TargetKind::Tier,
                name: s.to_string(),
                tier: None,
            })
    }
}
