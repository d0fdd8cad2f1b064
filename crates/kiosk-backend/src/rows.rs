//! Storage row models
//!
//! These types map one-to-one onto the backend's table rows: snake_case
//! field names, nullable columns as `Option`. They derive serde in both
//! directions because the wire is JSON. Unknown or malformed payloads are
//! rejected at deserialization; nothing here substitutes defaults.

use chrono::{DateTime, Utc};
use kiosk_types::{PurchaseStatus, Role};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User row from the `users` table
///
/// The role column is named `type` in the schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(rename = "type")]
    pub role: Role,
    pub points: i64,
    pub created_at: DateTime<Utc>,
}

/// Plan row from the `plans` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub duration: String,
    pub features: Vec<String>,
    pub points_reward: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Code row from the `codes` table
///
/// `used_by` and `used_at` are nullable and populated together when the
/// code is consumed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeRow {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub code: String,
    pub is_used: bool,
    pub used_by: Option<Uuid>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Purchase row from the `purchases` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseRow {
    pub id: Uuid,
    pub client_id: Uuid,
    pub plan_id: Uuid,
    pub code_id: Uuid,
    pub amount: f64,
    pub points_earned: i64,
    pub status: PurchaseStatus,
    pub created_at: DateTime<Utc>,
}
