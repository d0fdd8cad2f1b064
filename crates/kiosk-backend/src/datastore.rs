//! Datastore trait
//!
//! Async interface over the backend's four collections. Implementations
//! return storage rows; callers map them to domain entities with
//! [`crate::mapper`]. All list reads are ordered by creation time,
//! descending.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kiosk_types::{PurchaseStatus, Role};
use serde::Serialize;
use uuid::Uuid;

use crate::error::BackendResult;
use crate::rows::{CodeRow, PlanRow, PurchaseRow, UserRow};

/// Datastore over the backend's collections
#[async_trait]
pub trait Datastore: Send + Sync {
    /// List all user profiles, newest first
    async fn list_users(&self) -> BackendResult<Vec<UserRow>>;

    /// Find a user profile by principal id
    async fn find_user(&self, id: Uuid) -> BackendResult<Option<UserRow>>;

    /// Insert a user profile
    async fn insert_user(&self, user: NewUser) -> BackendResult<UserRow>;

    /// Overwrite a user's point balance
    async fn set_user_points(&self, id: Uuid, points: i64) -> BackendResult<UserRow>;

    /// List all plans, newest first
    async fn list_plans(&self) -> BackendResult<Vec<PlanRow>>;

    /// Insert a plan
    async fn insert_plan(&self, plan: NewPlan) -> BackendResult<PlanRow>;

    /// Partially update a plan
    async fn update_plan(&self, id: Uuid, changes: PlanChanges) -> BackendResult<PlanRow>;

    /// Delete a plan; the backend cascades to its codes
    async fn delete_plan(&self, id: Uuid) -> BackendResult<()>;

    /// List all codes, newest first
    async fn list_codes(&self) -> BackendResult<Vec<CodeRow>>;

    /// Bulk-insert codes
    async fn insert_codes(&self, codes: Vec<NewCode>) -> BackendResult<Vec<CodeRow>>;

    /// Conditionally mark a code as used
    ///
    /// Succeeds only if the code is currently unused; a code consumed by
    /// a concurrent buyer fails with [`BackendError::CodeTaken`].
    ///
    /// [`BackendError::CodeTaken`]: crate::BackendError::CodeTaken
    async fn claim_code(
        &self,
        id: Uuid,
        used_by: Uuid,
        used_at: DateTime<Utc>,
    ) -> BackendResult<CodeRow>;

    /// Return a claimed code to the pool
    ///
    /// Compensating action for a purchase insert that failed after the
    /// claim succeeded.
    async fn release_code(&self, id: Uuid) -> BackendResult<()>;

    /// List all purchases, newest first
    async fn list_purchases(&self) -> BackendResult<Vec<PurchaseRow>>;

    /// Insert a purchase record
    async fn insert_purchase(&self, purchase: NewPurchase) -> BackendResult<PurchaseRow>;
}

/// Insert shape for a user profile
///
/// The id is the auth principal's id, not backend-generated.
#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(rename = "type")]
    pub role: Role,
    pub points: i64,
}

/// Insert shape for a plan
#[derive(Debug, Clone, Serialize)]
pub struct NewPlan {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub duration: String,
    pub features: Vec<String>,
    pub points_reward: i64,
    pub is_active: bool,
}

/// Partial update for a plan; unset fields are left untouched
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlanChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points_reward: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl PlanChanges {
    /// Whether the patch carries no changes at all
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.duration.is_none()
            && self.features.is_none()
            && self.points_reward.is_none()
            && self.is_active.is_none()
    }
}

/// Insert shape for a code
#[derive(Debug, Clone, Serialize)]
pub struct NewCode {
    pub plan_id: Uuid,
    pub code: String,
    pub is_used: bool,
}

/// Insert shape for a purchase
#[derive(Debug, Clone, Serialize)]
pub struct NewPurchase {
    pub client_id: Uuid,
    pub plan_id: Uuid,
    pub code_id: Uuid,
    pub amount: f64,
    pub points_earned: i64,
    pub status: PurchaseStatus,
}
