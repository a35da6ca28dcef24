//! Healthy/Danger status classification
//!
//! Raw monitoring records carry boolean flags; every table and chart
//! renders them as a two-state status with a display label and a color
//! tag. Classification is pure and total; multi-flag records classify
//! each flag independently.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Display status derived from a raw boolean flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Healthy,
    Danger,
}

impl Status {
    /// Classify a raw flag: `true` is healthy, `false` is danger.
    pub fn from_flag(flag: bool) -> Self {
        if flag {
            Status::Healthy
        } else {
            Status::Danger
        }
    }

    /// Display label shown in tables and badges.
    pub fn label(self) -> &'static str {
        match self {
            Status::Healthy => "Healthy",
            Status::Danger => "Danger",
        }
    }

    /// Badge color tag.
    pub fn color(self) -> &'static str {
        match self {
            Status::Healthy => "green",
            Status::Danger => "red",
        }
    }

    pub fn is_healthy(self) -> bool {
        matches!(self, Status::Healthy)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
