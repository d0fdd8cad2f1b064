//! Subscription plan types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique plan identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlanId(pub Uuid);

impl PlanId {
    /// Create a new random plan ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a plan ID from a string
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for PlanId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PlanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for PlanId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// A purchasable subscription offering
///
/// Plans are created and maintained by the administrator. A plan can be
/// purchased only while `is_active` is true and at least one of its codes
/// remains unused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// Unique identifier
    pub id: PlanId,
    /// Display name
    pub name: String,
    /// Marketing description
    pub description: String,
    /// Price, non-negative
    pub price: f64,
    /// Free-text duration label ("1 month", "12 meses", ...)
    pub duration: String,
    /// Ordered feature bullet points
    pub features: Vec<String>,
    /// Loyalty points awarded per purchase
    pub points_reward: i64,
    /// Purchasability gate
    pub is_active: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}
