//! Kiosk Types - Shared domain types
//!
//! This crate contains the domain types used across the kiosk storefront:
//! - Users and their loyalty point balances
//! - Subscription plans
//! - Single-use redemption codes
//! - Purchase records

pub mod code;
pub mod plan;
pub mod purchase;
pub mod user;

pub use code::*;
pub use plan::*;
pub use purchase::*;
pub use user::*;
