//! Catalog store - cached collections and the purchase transaction
//!
//! Caches the four backend collections and exposes every mutating
//! operation the storefront performs: plan administration, bulk code
//! import, the plan purchase, and loyalty point credits.
//!
//! Mutations update the caches optimistically from the backend's returned
//! representation, then await a reconciling refresh of the collections
//! they touched, so callers observe settled state when an operation
//! returns. A failed refresh keeps the previous (stale) contents.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use futures::join;
use kiosk_backend::{
    mapper::{code_from_row, plan_from_row, purchase_from_row, user_from_row},
    Datastore, NewCode, NewPlan, NewPurchase, PlanChanges,
};
use kiosk_types::{Code, Plan, PlanId, Purchase, PurchaseStatus, User, UserId};
use tracing::instrument;

use crate::session::SessionContext;

/// Catalog and transaction store
pub struct CatalogStore<D: Datastore> {
    backend: Arc<D>,
    session: Arc<SessionContext>,
    users: tokio::sync::RwLock<Vec<User>>,
    plans: tokio::sync::RwLock<Vec<Plan>>,
    codes: tokio::sync::RwLock<Vec<Code>>,
    purchases: tokio::sync::RwLock<Vec<Purchase>>,
    loading: AtomicBool,
}

impl<D: Datastore> CatalogStore<D> {
    /// Create a new catalog store
    pub fn new(backend: Arc<D>, session: Arc<SessionContext>) -> Self {
        Self {
            backend,
            session,
            users: tokio::sync::RwLock::new(Vec::new()),
            plans: tokio::sync::RwLock::new(Vec::new()),
            codes: tokio::sync::RwLock::new(Vec::new()),
            purchases: tokio::sync::RwLock::new(Vec::new()),
            loading: AtomicBool::new(false),
        }
    }

    // =========================================================================
    // Collection access
    // =========================================================================

    /// Snapshot of the cached users
    pub async fn users(&self) -> Vec<User> {
        self.users.read().await.clone()
    }

    /// Snapshot of the cached plans
    pub async fn plans(&self) -> Vec<Plan> {
        self.plans.read().await.clone()
    }

    /// Cached plans currently open for purchase
    pub async fn active_plans(&self) -> Vec<Plan> {
        self.plans
            .read()
            .await
            .iter()
            .filter(|p| p.is_active)
            .cloned()
            .collect()
    }

    /// Snapshot of the cached codes
    pub async fn codes(&self) -> Vec<Code> {
        self.codes.read().await.clone()
    }

    /// Snapshot of the cached purchases
    pub async fn purchases(&self) -> Vec<Purchase> {
        self.purchases.read().await.clone()
    }

    /// Whether a whole-batch load is in flight
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Relaxed)
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Fetch all four collections concurrently
    ///
    /// Each fetch is independently fault-tolerant: one collection failing
    /// to load is logged and keeps its previous contents, the others
    /// still refresh. A single flag covers the whole batch.
    pub async fn load_all(&self) {
        self.loading.store(true, Ordering::Relaxed);
        join!(
            self.refresh_users(),
            self.refresh_plans(),
            self.refresh_codes(),
            self.refresh_purchases(),
        );
        self.loading.store(false, Ordering::Relaxed);
    }

    async fn refresh_users(&self) {
        match self.backend.list_users().await {
            Ok(rows) => {
                *self.users.write().await = rows.into_iter().map(user_from_row).collect();
            }
            Err(err) => {
                metrics::counter!("kiosk_refresh_failures", "collection" => "users").increment(1);
                tracing::warn!("failed to load users: {err}");
            }
        }
    }

    async fn refresh_plans(&self) {
        match self.backend.list_plans().await {
            Ok(rows) => {
                *self.plans.write().await = rows.into_iter().map(plan_from_row).collect();
            }
            Err(err) => {
                metrics::counter!("kiosk_refresh_failures", "collection" => "plans").increment(1);
                tracing::warn!("failed to load plans: {err}");
            }
        }
    }

    async fn refresh_codes(&self) {
        match self.backend.list_codes().await {
            Ok(rows) => {
                *self.codes.write().await = rows.into_iter().map(code_from_row).collect();
            }
            Err(err) => {
                metrics::counter!("kiosk_refresh_failures", "collection" => "codes").increment(1);
                tracing::warn!("failed to load codes: {err}");
            }
        }
    }

    async fn refresh_purchases(&self) {
        match self.backend.list_purchases().await {
            Ok(rows) => {
                *self.purchases.write().await = rows.into_iter().map(purchase_from_row).collect();
            }
            Err(err) => {
                metrics::counter!("kiosk_refresh_failures", "collection" => "purchases")
                    .increment(1);
                tracing::warn!("failed to load purchases: {err}");
            }
        }
    }

    // =========================================================================
    // Plan administration
    // =========================================================================

    /// Create a plan
    ///
    /// Validation is the caller's concern; the store inserts what it is
    /// given. The created plan is prepended to the cache and the plans
    /// collection reconciled before returning.
    #[instrument(skip(self, plan), level = "debug")]
    pub async fn create_plan(&self, plan: NewPlan) -> bool {
        match self.backend.insert_plan(plan).await {
            Ok(row) => {
                let created = plan_from_row(row);
                self.plans.write().await.insert(0, created);
                self.refresh_plans().await;
                true
            }
            Err(err) => {
                tracing::error!("failed to create plan: {err}");
                false
            }
        }
    }

    /// Partially update a plan
    #[instrument(skip(self, changes), level = "debug")]
    pub async fn update_plan(&self, id: PlanId, changes: PlanChanges) -> bool {
        match self.backend.update_plan(id.0, changes).await {
            Ok(row) => {
                let updated = plan_from_row(row);
                {
                    let mut plans = self.plans.write().await;
                    if let Some(slot) = plans.iter_mut().find(|p| p.id == id) {
                        *slot = updated;
                    }
                }
                self.refresh_plans().await;
                true
            }
            Err(err) => {
                tracing::error!("failed to update plan: {err}");
                false
            }
        }
    }

    /// Delete a plan and, with it, all of its codes
    ///
    /// The backend cascades the code deletion; the caches drop both
    /// sides locally. Failure is logged only — callers get no signal.
    #[instrument(skip(self), level = "debug")]
    pub async fn delete_plan(&self, id: PlanId) {
        if let Err(err) = self.backend.delete_plan(id.0).await {
            tracing::error!("failed to delete plan: {err}");
            return;
        }

        self.plans.write().await.retain(|p| p.id != id);
        self.codes.write().await.retain(|c| c.plan_id != id);
        join!(self.refresh_plans(), self.refresh_codes());
    }

    /// Bulk-import redemption codes for a plan
    ///
    /// One code per input line; lines are trimmed and blank lines
    /// discarded.
    #[instrument(skip(self, codes), level = "debug")]
    pub async fn add_codes(&self, plan_id: PlanId, codes: &[String]) {
        let batch: Vec<NewCode> = codes
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .map(|c| NewCode {
                plan_id: plan_id.0,
                code: c.to_string(),
                is_used: false,
            })
            .collect();
        if batch.is_empty() {
            return;
        }

        match self.backend.insert_codes(batch).await {
            Ok(rows) => {
                let mut inserted: Vec<Code> = rows.into_iter().map(code_from_row).collect();
                {
                    let mut cache = self.codes.write().await;
                    inserted.extend(cache.drain(..));
                    *cache = inserted;
                }
                self.refresh_codes().await;
            }
            Err(err) => {
                tracing::error!("failed to add codes: {err}");
            }
        }
    }

    // =========================================================================
    // The purchase transaction
    // =========================================================================

    /// Purchase a plan for a client
    ///
    /// Reserves one unused code (a conditional claim the backend rejects
    /// if a concurrent buyer got there first), records the purchase with
    /// price and reward snapshots, credits the buyer's points, and
    /// reconciles the touched collections. Any failure before the
    /// purchase insert aborts with no downstream effects; a failed
    /// insert releases the claimed code back to the pool.
    ///
    /// Returns `None` when the plan is unknown or inactive, when no code
    /// is available, or when a backend call fails.
    #[instrument(skip(self), level = "debug")]
    pub async fn purchase_plan(&self, client_id: UserId, plan_id: PlanId) -> Option<Purchase> {
        let plan = {
            let plans = self.plans.read().await;
            plans.iter().find(|p| p.id == plan_id).cloned()
        };
        let Some(plan) = plan else {
            tracing::warn!(%plan_id, "purchase refused: plan not found");
            metrics::counter!("kiosk_purchases", "outcome" => "plan_missing").increment(1);
            return None;
        };
        if !plan.is_active {
            tracing::warn!(%plan_id, "purchase refused: plan inactive");
            metrics::counter!("kiosk_purchases", "outcome" => "plan_inactive").increment(1);
            return None;
        }

        let code = {
            let codes = self.codes.read().await;
            codes
                .iter()
                .find(|c| c.plan_id == plan_id && c.is_available())
                .cloned()
        };
        let Some(code) = code else {
            tracing::warn!(%plan_id, "purchase refused: no codes available");
            metrics::counter!("kiosk_purchases", "outcome" => "sold_out").increment(1);
            return None;
        };

        let claimed = match self
            .backend
            .claim_code(code.id.0, client_id.0, Utc::now())
            .await
        {
            Ok(row) => code_from_row(row),
            Err(err) => {
                tracing::error!(code = %code.id, "code claim failed: {err}");
                metrics::counter!("kiosk_purchases", "outcome" => "claim_failed").increment(1);
                return None;
            }
        };

        let purchase = match self
            .backend
            .insert_purchase(NewPurchase {
                client_id: client_id.0,
                plan_id: plan_id.0,
                code_id: claimed.id.0,
                amount: plan.price,
                points_earned: plan.points_reward,
                status: PurchaseStatus::Completed,
            })
            .await
        {
            Ok(row) => purchase_from_row(row),
            Err(err) => {
                tracing::error!(code = %claimed.id, "purchase insert failed: {err}");
                metrics::counter!("kiosk_purchases", "outcome" => "insert_failed").increment(1);
                // Compensate: put the claimed code back in the pool
                if let Err(release_err) = self.backend.release_code(claimed.id.0).await {
                    tracing::error!(
                        code = %claimed.id,
                        "code release failed, code consumed without purchase: {release_err}"
                    );
                }
                return None;
            }
        };

        self.update_user_points(client_id, plan.points_reward).await;

        {
            let mut codes = self.codes.write().await;
            if let Some(slot) = codes.iter_mut().find(|c| c.id == claimed.id) {
                *slot = claimed;
            }
        }
        self.purchases.write().await.insert(0, purchase.clone());

        join!(
            self.refresh_codes(),
            self.refresh_purchases(),
            self.refresh_users(),
        );
        metrics::counter!("kiosk_purchases", "outcome" => "completed").increment(1);
        Some(purchase)
    }

    // =========================================================================
    // Loyalty points
    // =========================================================================

    /// Credit (or debit) a user's point balance
    ///
    /// Reads the cached balance, writes the new total, merges the
    /// backend's row, and refreshes the signed-in snapshot when the
    /// affected user is the current principal.
    #[instrument(skip(self), level = "debug")]
    pub async fn update_user_points(&self, user_id: UserId, delta: i64) {
        let current = {
            let users = self.users.read().await;
            users.iter().find(|u| u.id == user_id).map(|u| u.points)
        };
        let Some(current) = current else {
            tracing::warn!(%user_id, "points update skipped: user not in cache");
            return;
        };

        let updated = match self.backend.set_user_points(user_id.0, current + delta).await {
            Ok(row) => user_from_row(row),
            Err(err) => {
                tracing::error!(%user_id, "failed to update points: {err}");
                return;
            }
        };

        {
            let mut users = self.users.write().await;
            if let Some(slot) = users.iter_mut().find(|u| u.id == user_id) {
                *slot = updated.clone();
            }
        }
        self.session.refresh_user(&updated).await;
    }
}

impl<D: Datastore> std::fmt::Debug for CatalogStore<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogStore")
            .field("loading", &self.is_loading())
            .finish_non_exhaustive()
    }
}
