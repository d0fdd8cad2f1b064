//! Row ↔ domain mapping
//!
//! Pure, stateless, total conversions between storage rows and domain
//! entities: field renaming, id newtype wrapping, `Option` passthrough.
//! No validation and no side effects. Each pair of functions is an exact
//! inverse of the other: `*_from_row(*_to_row(x)) == x` for every entity,
//! and the same the other way around.

use kiosk_types::{Code, CodeId, Plan, PlanId, Purchase, PurchaseId, User, UserId};

use crate::rows::{CodeRow, PlanRow, PurchaseRow, UserRow};

/// Convert a user row to the domain entity
pub fn user_from_row(row: UserRow) -> User {
    User {
        id: UserId(row.id),
        name: row.name,
        email: row.email,
        role: row.role,
        points: row.points,
        created_at: row.created_at,
    }
}

/// Convert a domain user to its storage row
pub fn user_to_row(user: User) -> UserRow {
    UserRow {
        id: user.id.0,
        name: user.name,
        email: user.email,
        role: user.role,
        points: user.points,
        created_at: user.created_at,
    }
}

/// Convert a plan row to the domain entity
pub fn plan_from_row(row: PlanRow) -> Plan {
    Plan {
        id: PlanId(row.id),
        name: row.name,
        description: row.description,
        price: row.price,
        duration: row.duration,
        features: row.features,
        points_reward: row.points_reward,
        is_active: row.is_active,
        created_at: row.created_at,
    }
}

/// Convert a domain plan to its storage row
pub fn plan_to_row(plan: Plan) -> PlanRow {
    PlanRow {
        id: plan.id.0,
        name: plan.name,
        description: plan.description,
        price: plan.price,
        duration: plan.duration,
        features: plan.features,
        points_reward: plan.points_reward,
        is_active: plan.is_active,
        created_at: plan.created_at,
    }
}

/// Convert a code row to the domain entity
pub fn code_from_row(row: CodeRow) -> Code {
    Code {
        id: CodeId(row.id),
        plan_id: PlanId(row.plan_id),
        code: row.code,
        is_used: row.is_used,
        used_by: row.used_by.map(UserId),
        used_at: row.used_at,
        created_at: row.created_at,
    }
}

/// Convert a domain code to its storage row
pub fn code_to_row(code: Code) -> CodeRow {
    CodeRow {
        id: code.id.0,
        plan_id: code.plan_id.0,
        code: code.code,
        is_used: code.is_used,
        used_by: code.used_by.map(|u| u.0),
        used_at: code.used_at,
        created_at: code.created_at,
    }
}

/// Convert a purchase row to the domain entity
pub fn purchase_from_row(row: PurchaseRow) -> Purchase {
    Purchase {
        id: PurchaseId(row.id),
        client_id: UserId(row.client_id),
        plan_id: PlanId(row.plan_id),
        code_id: CodeId(row.code_id),
        amount: row.amount,
        points_earned: row.points_earned,
        status: row.status,
        created_at: row.created_at,
    }
}

/// Convert a domain purchase to its storage row
pub fn purchase_to_row(purchase: Purchase) -> PurchaseRow {
    PurchaseRow {
        id: purchase.id.0,
        client_id: purchase.client_id.0,
        plan_id: purchase.plan_id.0,
        code_id: purchase.code_id.0,
        amount: purchase.amount,
        points_earned: purchase.points_earned,
        status: purchase.status,
        created_at: purchase.created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use kiosk_types::{PurchaseStatus, Role};
    use uuid::Uuid;

    #[test]
    fn test_user_roundtrip() {
        let row = UserRow {
            id: Uuid::new_v4(),
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            role: Role::Client,
            points: 250,
            created_at: Utc::now(),
        };
        assert_eq!(user_to_row(user_from_row(row.clone())), row);
    }

    #[test]
    fn test_code_roundtrip_unused() {
        let row = CodeRow {
            id: Uuid::new_v4(),
            plan_id: Uuid::new_v4(),
            code: "IPTV-AAA-111".to_string(),
            is_used: false,
            used_by: None,
            used_at: None,
            created_at: Utc::now(),
        };
        let code = code_from_row(row.clone());
        assert!(code.used_by.is_none());
        assert!(code.used_at.is_none());
        assert_eq!(code_to_row(code), row);
    }

    #[test]
    fn test_code_roundtrip_used() {
        let row = CodeRow {
            id: Uuid::new_v4(),
            plan_id: Uuid::new_v4(),
            code: "IPTV-BBB-222".to_string(),
            is_used: true,
            used_by: Some(Uuid::new_v4()),
            used_at: Some(Utc::now()),
            created_at: Utc::now(),
        };
        assert_eq!(code_to_row(code_from_row(row.clone())), row);
    }

    #[test]
    fn test_purchase_roundtrip() {
        let row = PurchaseRow {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            plan_id: Uuid::new_v4(),
            code_id: Uuid::new_v4(),
            amount: 29.90,
            points_earned: 100,
            status: PurchaseStatus::Completed,
            created_at: Utc::now(),
        };
        let purchase = purchase_from_row(row.clone());
        assert_eq!(purchase.amount, 29.90);
        assert_eq!(purchase_to_row(purchase), row);
    }
}
