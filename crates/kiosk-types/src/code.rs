//! Redemption code types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{PlanId, UserId};

/// Unique code identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodeId(pub Uuid);

impl CodeId {
    /// Create a new random code ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a code ID from a string
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for CodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for CodeId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// A single-use redemption token bound to one plan
///
/// Once consumed by a purchase, `used_by` and `used_at` are present and
/// the code never returns to the pool (except through the transaction's
/// own compensation path).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Code {
    /// Unique identifier
    pub id: CodeId,
    /// Owning plan
    pub plan_id: PlanId,
    /// Opaque redemption string
    pub code: String,
    /// Whether the code has been consumed
    pub is_used: bool,
    /// Consuming client, present iff `is_used`
    pub used_by: Option<UserId>,
    /// Consumption timestamp, present iff `is_used`
    pub used_at: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Code {
    /// Whether this code can still be sold
    pub fn is_available(&self) -> bool {
        !self.is_used
    }
}
