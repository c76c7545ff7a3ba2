use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::error::DomainError;

/// Garment face a design is printed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DesignSide {
    Front,
    Back,
}

impl DesignSide {
    pub const ALL: [DesignSide; 2] = [DesignSide::Front, DesignSide::Back];

    pub fn as_str(&self) -> &'static str {
        match self {
            DesignSide::Front => "front",
            DesignSide::Back => "back",
        }
    }
}

impl fmt::Display for DesignSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DesignSide {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "front" => Ok(DesignSide::Front),
            "back" => Ok(DesignSide::Back),
            other => Err(DomainError::InvalidInput(format!("unknown design side: {}", other))),
        }
    }
}
