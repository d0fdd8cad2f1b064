//! Purchase record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CodeId, PlanId, UserId};

/// Unique purchase identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PurchaseId(pub Uuid);

impl PurchaseId {
    /// Create a new random purchase ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a purchase ID from a string
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for PurchaseId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PurchaseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for PurchaseId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Purchase settlement status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseStatus {
    /// Settled; points have been earned
    Completed,
    /// Awaiting settlement
    Pending,
    /// Settlement failed
    Failed,
}

impl std::fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Pending => write!(f, "pending"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for PurchaseStatus {
    type Err = PurchaseStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "completed" => Ok(Self::Completed),
            "pending" => Ok(Self::Pending),
            "failed" => Ok(Self::Failed),
            _ => Err(PurchaseStatusParseError(s.to_string())),
        }
    }
}

/// Error parsing a purchase status string
#[derive(Debug, Clone)]
pub struct PurchaseStatusParseError(pub String);

impl std::fmt::Display for PurchaseStatusParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid purchase status: {}", self.0)
    }
}

impl std::error::Error for PurchaseStatusParseError {}

/// An immutable record of one client redeeming one code under one plan
///
/// `amount` and `points_earned` are snapshots of the plan's price and
/// reward at purchase time; later plan edits do not rewrite history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    /// Unique identifier
    pub id: PurchaseId,
    /// Buying client
    pub client_id: UserId,
    /// Purchased plan
    pub plan_id: PlanId,
    /// The specific code consumed
    pub code_id: CodeId,
    /// Price snapshot
    pub amount: f64,
    /// Reward snapshot
    pub points_earned: i64,
    /// Settlement status
    pub status: PurchaseStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}
