//! PostgREST datastore implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::datastore::{Datastore, NewCode, NewPlan, NewPurchase, NewUser, PlanChanges};
use crate::error::{BackendError, BackendResult};
use crate::rows::{CodeRow, PlanRow, PurchaseRow, UserRow};

use super::RestBackend;

/// `Prefer` header asking PostgREST to return the affected rows
const RETURN_REPRESENTATION: &str = "return=representation";

impl RestBackend {
    /// Fetch a whole collection, newest first
    async fn list_table<T: DeserializeOwned>(&self, table: &str) -> BackendResult<Vec<T>> {
        let response = self
            .request(Method::GET, &self.config().rest_url(table))
            .await
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .send()
            .await?;
        Self::read_json(response).await
    }

    /// Insert one or more rows and return the backend's representation
    async fn insert_rows<B: Serialize, T: DeserializeOwned>(
        &self,
        table: &str,
        body: &B,
    ) -> BackendResult<Vec<T>> {
        let response = self
            .request(Method::POST, &self.config().rest_url(table))
            .await
            .header("Prefer", RETURN_REPRESENTATION)
            .json(body)
            .send()
            .await?;
        Self::read_json(response).await
    }

    /// Patch rows matched by an id filter and return the representation
    async fn patch_by_id<B: Serialize, T: DeserializeOwned>(
        &self,
        table: &str,
        id: Uuid,
        body: &B,
    ) -> BackendResult<Vec<T>> {
        let response = self
            .request(Method::PATCH, &self.config().rest_url(table))
            .await
            .query(&[("id", Self::eq_filter(id))])
            .header("Prefer", RETURN_REPRESENTATION)
            .json(body)
            .send()
            .await?;
        Self::read_json(response).await
    }
}

#[async_trait]
impl Datastore for RestBackend {
    async fn list_users(&self) -> BackendResult<Vec<UserRow>> {
        self.list_table("users").await
    }

    async fn find_user(&self, id: Uuid) -> BackendResult<Option<UserRow>> {
        let response = self
            .request(Method::GET, &self.config().rest_url("users"))
            .await
            .query(&[("select", "*".to_string()), ("id", Self::eq_filter(id))])
            .send()
            .await?;
        let rows: Vec<UserRow> = Self::read_json(response).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_user(&self, user: NewUser) -> BackendResult<UserRow> {
        let rows: Vec<UserRow> = self.insert_rows("users", &user).await?;
        rows.into_iter().next().ok_or(BackendError::NotFound)
    }

    async fn set_user_points(&self, id: Uuid, points: i64) -> BackendResult<UserRow> {
        let rows: Vec<UserRow> = self
            .patch_by_id("users", id, &json!({ "points": points }))
            .await?;
        rows.into_iter().next().ok_or(BackendError::NotFound)
    }

    async fn list_plans(&self) -> BackendResult<Vec<PlanRow>> {
        self.list_table("plans").await
    }

    async fn insert_plan(&self, plan: NewPlan) -> BackendResult<PlanRow> {
        let rows: Vec<PlanRow> = self.insert_rows("plans", &plan).await?;
        rows.into_iter().next().ok_or(BackendError::NotFound)
    }

    async fn update_plan(&self, id: Uuid, changes: PlanChanges) -> BackendResult<PlanRow> {
        let rows: Vec<PlanRow> = self.patch_by_id("plans", id, &changes).await?;
        rows.into_iter().next().ok_or(BackendError::NotFound)
    }

    async fn delete_plan(&self, id: Uuid) -> BackendResult<()> {
        let response = self
            .request(Method::DELETE, &self.config().rest_url("plans"))
            .await
            .query(&[("id", Self::eq_filter(id))])
            .send()
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn list_codes(&self) -> BackendResult<Vec<CodeRow>> {
        self.list_table("codes").await
    }

    async fn insert_codes(&self, codes: Vec<NewCode>) -> BackendResult<Vec<CodeRow>> {
        if codes.is_empty() {
            return Ok(Vec::new());
        }
        self.insert_rows("codes", &codes).await
    }

    async fn claim_code(
        &self,
        id: Uuid,
        used_by: Uuid,
        used_at: DateTime<Utc>,
    ) -> BackendResult<CodeRow> {
        // The filter doubles as the precondition: a code that is already
        // used matches zero rows, and the empty representation tells us
        // a concurrent buyer won the claim.
        let response = self
            .request(Method::PATCH, &self.config().rest_url("codes"))
            .await
            .query(&[
                ("id", Self::eq_filter(id)),
                ("is_used", "eq.false".to_string()),
            ])
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&json!({
                "is_used": true,
                "used_by": used_by,
                "used_at": used_at.to_rfc3339(),
            }))
            .send()
            .await?;
        let rows: Vec<CodeRow> = Self::read_json(response).await?;
        rows.into_iter().next().ok_or(BackendError::CodeTaken)
    }

    async fn release_code(&self, id: Uuid) -> BackendResult<()> {
        let response = self
            .request(Method::PATCH, &self.config().rest_url("codes"))
            .await
            .query(&[("id", Self::eq_filter(id))])
            .json(&json!({
                "is_used": false,
                "used_by": null,
                "used_at": null,
            }))
            .send()
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn list_purchases(&self) -> BackendResult<Vec<PurchaseRow>> {
        self.list_table("purchases").await
    }

    async fn insert_purchase(&self, purchase: NewPurchase) -> BackendResult<PurchaseRow> {
        let rows: Vec<PurchaseRow> = self.insert_rows("purchases", &purchase).await?;
        rows.into_iter().next().ok_or(BackendError::NotFound)
    }
}
