//! In-memory backend fakes for testing
//!
//! `MemoryBackend` implements the datastore over dashmaps with optional
//! failure injection; `MockAuth` implements the auth provider with a
//! scriptable account table and the same broadcast semantics as the real
//! thing.

// Not every test binary exercises every helper
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use dashmap::DashMap;
use kiosk_backend::{
    AuthEvent, AuthProvider, AuthSession, BackendError, BackendResult, CodeRow, Datastore,
    NewCode, NewPlan, NewPurchase, NewUser, PlanChanges, PlanRow, PurchaseRow, UserRow,
};
use tokio::sync::broadcast;
use uuid::Uuid;

fn injected_failure() -> BackendError {
    BackendError::Api {
        status: 500,
        message: "injected failure".to_string(),
    }
}

/// In-memory datastore with failure injection
#[derive(Default)]
pub struct MemoryBackend {
    users: DashMap<Uuid, UserRow>,
    plans: DashMap<Uuid, PlanRow>,
    codes: DashMap<Uuid, CodeRow>,
    purchases: DashMap<Uuid, PurchaseRow>,
    seq: AtomicI64,

    /// Fail the next (and every) plans listing
    pub fail_list_plans: AtomicBool,
    /// Fail every purchase insert
    pub fail_insert_purchase: AtomicBool,
    /// Fail every code claim
    pub fail_claim: AtomicBool,
    /// Fail every plan insert/update/delete
    pub fail_plan_writes: AtomicBool,
    /// Number of release_code calls observed
    pub release_calls: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deterministic, strictly increasing creation timestamps
    fn next_created_at(&self) -> DateTime<Utc> {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        Utc.timestamp_opt(1_700_000_000 + seq, 0).unwrap()
    }

    fn newest_first<T: Clone>(
        map: &DashMap<Uuid, T>,
        created_at: impl Fn(&T) -> DateTime<Utc>,
    ) -> Vec<T> {
        let mut rows: Vec<T> = map.iter().map(|r| r.value().clone()).collect();
        rows.sort_by_key(|r| std::cmp::Reverse(created_at(r)));
        rows
    }

    /// Seed a user row directly
    pub fn seed_user(&self, user: NewUser) -> UserRow {
        let row = UserRow {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            points: user.points,
            created_at: self.next_created_at(),
        };
        self.users.insert(row.id, row.clone());
        row
    }

    /// Seed a plan row directly
    pub fn seed_plan(&self, plan: NewPlan) -> PlanRow {
        let row = PlanRow {
            id: Uuid::new_v4(),
            name: plan.name,
            description: plan.description,
            price: plan.price,
            duration: plan.duration,
            features: plan.features,
            points_reward: plan.points_reward,
            is_active: plan.is_active,
            created_at: self.next_created_at(),
        };
        self.plans.insert(row.id, row.clone());
        row
    }

    /// Seed a code row directly
    pub fn seed_code(&self, plan_id: Uuid, code: &str) -> CodeRow {
        let row = CodeRow {
            id: Uuid::new_v4(),
            plan_id,
            code: code.to_string(),
            is_used: false,
            used_by: None,
            used_at: None,
            created_at: self.next_created_at(),
        };
        self.codes.insert(row.id, row.clone());
        row
    }

    /// Mark a seeded code as consumed, bypassing the claim path
    pub fn mark_code_used(&self, id: Uuid, used_by: Uuid) {
        if let Some(mut row) = self.codes.get_mut(&id) {
            row.is_used = true;
            row.used_by = Some(used_by);
            row.used_at = Some(Utc::now());
        }
    }

    pub fn purchase_count(&self) -> usize {
        self.purchases.len()
    }

    pub fn stored_points(&self, user_id: Uuid) -> Option<i64> {
        self.users.get(&user_id).map(|u| u.points)
    }

    pub fn stored_code(&self, id: Uuid) -> Option<CodeRow> {
        self.codes.get(&id).map(|c| c.clone())
    }
}

#[async_trait]
impl Datastore for MemoryBackend {
    async fn list_users(&self) -> BackendResult<Vec<UserRow>> {
        Ok(Self::newest_first(&self.users, |r| r.created_at))
    }

    async fn find_user(&self, id: Uuid) -> BackendResult<Option<UserRow>> {
        Ok(self.users.get(&id).map(|r| r.value().clone()))
    }

    async fn insert_user(&self, user: NewUser) -> BackendResult<UserRow> {
        Ok(self.seed_user(user))
    }

    async fn set_user_points(&self, id: Uuid, points: i64) -> BackendResult<UserRow> {
        let mut row = self.users.get_mut(&id).ok_or(BackendError::NotFound)?;
        row.points = points;
        Ok(row.clone())
    }

    async fn list_plans(&self) -> BackendResult<Vec<PlanRow>> {
        if self.fail_list_plans.load(Ordering::SeqCst) {
            return Err(injected_failure());
        }
        Ok(Self::newest_first(&self.plans, |r| r.created_at))
    }

    async fn insert_plan(&self, plan: NewPlan) -> BackendResult<PlanRow> {
        if self.fail_plan_writes.load(Ordering::SeqCst) {
            return Err(injected_failure());
        }
        Ok(self.seed_plan(plan))
    }

    async fn update_plan(&self, id: Uuid, changes: PlanChanges) -> BackendResult<PlanRow> {
        if self.fail_plan_writes.load(Ordering::SeqCst) {
            return Err(injected_failure());
        }
        let mut row = self.plans.get_mut(&id).ok_or(BackendError::NotFound)?;
        if let Some(name) = changes.name {
            row.name = name;
        }
        if let Some(description) = changes.description {
            row.description = description;
        }
        if let Some(price) = changes.price {
            row.price = price;
        }
        if let Some(duration) = changes.duration {
            row.duration = duration;
        }
        if let Some(features) = changes.features {
            row.features = features;
        }
        if let Some(points_reward) = changes.points_reward {
            row.points_reward = points_reward;
        }
        if let Some(is_active) = changes.is_active {
            row.is_active = is_active;
        }
        Ok(row.clone())
    }

    async fn delete_plan(&self, id: Uuid) -> BackendResult<()> {
        if self.fail_plan_writes.load(Ordering::SeqCst) {
            return Err(injected_failure());
        }
        self.plans.remove(&id);
        self.codes.retain(|_, code| code.plan_id != id);
        Ok(())
    }

    async fn list_codes(&self) -> BackendResult<Vec<CodeRow>> {
        Ok(Self::newest_first(&self.codes, |r| r.created_at))
    }

    async fn insert_codes(&self, codes: Vec<NewCode>) -> BackendResult<Vec<CodeRow>> {
        let mut rows = Vec::with_capacity(codes.len());
        for code in codes {
            let row = CodeRow {
                id: Uuid::new_v4(),
                plan_id: code.plan_id,
                code: code.code,
                is_used: code.is_used,
                used_by: None,
                used_at: None,
                created_at: self.next_created_at(),
            };
            self.codes.insert(row.id, row.clone());
            rows.push(row);
        }
        Ok(rows)
    }

    async fn claim_code(
        &self,
        id: Uuid,
        used_by: Uuid,
        used_at: DateTime<Utc>,
    ) -> BackendResult<CodeRow> {
        if self.fail_claim.load(Ordering::SeqCst) {
            return Err(injected_failure());
        }
        let mut row = self.codes.get_mut(&id).ok_or(BackendError::NotFound)?;
        if row.is_used {
            return Err(BackendError::CodeTaken);
        }
        row.is_used = true;
        row.used_by = Some(used_by);
        row.used_at = Some(used_at);
        Ok(row.clone())
    }

    async fn release_code(&self, id: Uuid) -> BackendResult<()> {
        self.release_calls.fetch_add(1, Ordering::SeqCst);
        let mut row = self.codes.get_mut(&id).ok_or(BackendError::NotFound)?;
        row.is_used = false;
        row.used_by = None;
        row.used_at = None;
        Ok(())
    }

    async fn list_purchases(&self) -> BackendResult<Vec<PurchaseRow>> {
        Ok(Self::newest_first(&self.purchases, |r| r.created_at))
    }

    async fn insert_purchase(&self, purchase: NewPurchase) -> BackendResult<PurchaseRow> {
        if self.fail_insert_purchase.load(Ordering::SeqCst) {
            return Err(injected_failure());
        }
        let row = PurchaseRow {
            id: Uuid::new_v4(),
            client_id: purchase.client_id,
            plan_id: purchase.plan_id,
            code_id: purchase.code_id,
            amount: purchase.amount,
            points_earned: purchase.points_earned,
            status: purchase.status,
            created_at: self.next_created_at(),
        };
        self.purchases.insert(row.id, row.clone());
        Ok(row)
    }
}

struct MockAccount {
    password: String,
    user_id: Uuid,
    name: Option<String>,
}

/// Scriptable auth provider
#[derive(Default)]
pub struct MockAuth {
    accounts: DashMap<String, MockAccount>,
    recovered: std::sync::Mutex<Option<AuthSession>>,
    events: Option<broadcast::Sender<AuthEvent>>,

    /// Make sign_up defer the session (e-mail confirmation pending)
    pub defer_sign_up: AtomicBool,
    /// Make sign_out fail after clearing nothing remotely
    pub fail_sign_out: AtomicBool,
    /// Number of sign_up calls observed
    pub sign_up_calls: AtomicUsize,
    /// Number of sign_in calls observed
    pub sign_in_calls: AtomicUsize,
}

impl MockAuth {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            events: Some(events),
            ..Self::default()
        }
    }

    fn sender(&self) -> &broadcast::Sender<AuthEvent> {
        self.events.as_ref().expect("constructed via new()")
    }

    /// Register an account, returning its generated principal id
    pub fn seed_account(&self, email: &str, password: &str, name: Option<&str>) -> Uuid {
        let user_id = Uuid::new_v4();
        self.seed_account_with_id(email, password, name, user_id);
        user_id
    }

    /// Register an account under a caller-chosen principal id
    pub fn seed_account_with_id(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
        user_id: Uuid,
    ) {
        self.accounts.insert(
            email.to_string(),
            MockAccount {
                password: password.to_string(),
                user_id,
                name: name.map(str::to_string),
            },
        );
    }

    /// Script a recoverable session for bootstrap
    pub fn set_recovered_session(&self, session: AuthSession) {
        *self.recovered.lock().unwrap() = Some(session);
    }

    /// Push a session-change event, as the backend would on token expiry
    pub fn push_event(&self, event: AuthEvent) {
        let _ = self.sender().send(event);
    }

    fn session_for(&self, email: &str, account: &MockAccount) -> AuthSession {
        AuthSession {
            user_id: account.user_id,
            email: email.to_string(),
            name: account.name.clone(),
        }
    }
}

#[async_trait]
impl AuthProvider for MockAuth {
    async fn current_session(&self) -> BackendResult<Option<AuthSession>> {
        Ok(self.recovered.lock().unwrap().clone())
    }

    async fn sign_in(&self, email: &str, password: &str) -> BackendResult<AuthSession> {
        self.sign_in_calls.fetch_add(1, Ordering::SeqCst);
        let account = self
            .accounts
            .get(email)
            .ok_or(BackendError::InvalidCredentials)?;
        if account.password != password {
            return Err(BackendError::InvalidCredentials);
        }
        let session = self.session_for(email, &account);
        let _ = self.sender().send(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_up(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> BackendResult<Option<AuthSession>> {
        self.sign_up_calls.fetch_add(1, Ordering::SeqCst);
        let user_id = Uuid::new_v4();
        self.accounts.insert(
            email.to_string(),
            MockAccount {
                password: password.to_string(),
                user_id,
                name: Some(name.to_string()),
            },
        );

        if self.defer_sign_up.load(Ordering::SeqCst) {
            return Ok(None);
        }
        let session = AuthSession {
            user_id,
            email: email.to_string(),
            name: Some(name.to_string()),
        };
        let _ = self.sender().send(AuthEvent::SignedIn(session.clone()));
        Ok(Some(session))
    }

    async fn sign_out(&self) -> BackendResult<()> {
        let _ = self.sender().send(AuthEvent::SignedOut);
        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(injected_failure());
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.sender().subscribe()
    }
}
