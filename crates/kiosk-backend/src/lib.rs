//! Kiosk Backend - managed-backend boundary
//!
//! Everything the storefront knows about its external backend lives here:
//!
//! - [`rows`]: the snake_case row shapes the backend stores and returns
//! - [`mapper`]: total row ↔ domain conversions for every entity
//! - [`datastore`]: the collection CRUD trait plus insert/patch inputs
//! - [`auth`]: the auth-service trait and session-change event stream
//! - [`rest`]: the HTTP implementation of both traits
//!
//! # Example
//!
//! ```rust,ignore
//! use kiosk_backend::{BackendConfig, RestBackend};
//!
//! let config = BackendConfig::from_env()?;
//! let backend = RestBackend::new(config)?;
//! let plans = backend.list_plans().await?;
//! ```

pub mod auth;
pub mod config;
pub mod datastore;
pub mod error;
pub mod mapper;
pub mod rest;
pub mod rows;

pub use auth::{AuthEvent, AuthProvider, AuthSession};
pub use config::{BackendConfig, ConfigError};
pub use datastore::{Datastore, NewCode, NewPlan, NewPurchase, NewUser, PlanChanges};
pub use error::{BackendError, BackendResult};
pub use rest::RestBackend;
pub use rows::{CodeRow, PlanRow, PurchaseRow, UserRow};
