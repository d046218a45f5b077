//! Subscription Plans and Billing Records
//!
//! Billing state is driven entirely by the payment provider's webhook.
//! The free plan caps how many active goals and owned groups a user keeps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::SharedError;

/// Active goals allowed on the free plan
pub const FREE_ACTIVE_GOAL_LIMIT: i64 = 5;

/// Owned groups allowed on the free plan
pub const FREE_OWNED_GROUP_LIMIT: i64 = 3;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[cfg_attr(feature = "ssr", derive(sqlx::Type))]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "ssr", sqlx(rename_all = "snake_case"))]
pub enum Plan {
    #[default]
    Free,
    PremiumMonthly,
    PremiumYearly,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::PremiumMonthly => "premium_monthly",
            Plan::PremiumYearly => "premium_yearly",
        }
    }

    pub fn parse(s: &str) -> Result<Self, SharedError> {
        match s.to_lowercase().as_str() {
            "free" => Ok(Plan::Free),
            "premium_monthly" | "monthly" => Ok(Plan::PremiumMonthly),
            "premium_yearly" | "yearly" => Ok(Plan::PremiumYearly),
            _ => Err(SharedError::unknown("plan", s)),
        }
    }

    pub fn is_premium(&self) -> bool {
        !matches!(self, Plan::Free)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[cfg_attr(feature = "ssr", derive(sqlx::Type))]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "ssr", sqlx(rename_all = "snake_case"))]
pub enum SubscriptionStatus {
    Active,
    Trialing,
    PastDue,
    Canceled,
    #[default]
    Inactive,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Trialing => "trialing",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Canceled => "canceled",
            SubscriptionStatus::Inactive => "inactive",
        }
    }

    /// Map a provider status string onto ours
    pub fn from_provider(s: &str) -> Self {
        match s {
            "active" => SubscriptionStatus::Active,
            "trialing" => SubscriptionStatus::Trialing,
            "past_due" | "unpaid" => SubscriptionStatus::PastDue,
            "canceled" | "incomplete_expired" => SubscriptionStatus::Canceled,
            _ => SubscriptionStatus::Inactive,
        }
    }

    /// Whether premium features are unlocked
    pub fn grants_access(&self) -> bool {
        matches!(self, SubscriptionStatus::Active | SubscriptionStatus::Trialing)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "ssr", derive(sqlx::FromRow))]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan: Plan,
    pub status: SubscriptionStatus,
    pub provider_customer_id: Option<String>,
    pub provider_subscription_id: Option<String>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub cancel_at_period_end: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// Plan whose limits currently apply
    pub fn effective_plan(&self) -> Plan {
        if self.status.grants_access() {
            self.plan
        } else {
            Plan::Free
        }
    }
}

/// Catalogue entry for `GET /api/subscriptions/plans`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanInfo {
    pub plan: Plan,
    pub name: String,
    pub price_cents: i64,
    pub interval: Option<String>,
    /// `None` means unlimited
    pub max_active_goals: Option<i64>,
    pub max_owned_groups: Option<i64>,
}

/// Every plan the service sells
pub fn plan_catalog() -> Vec<PlanInfo> {
    vec![
        PlanInfo {
            plan: Plan::Free,
            name: "Free".to_string(),
            price_cents: 0,
            interval: None,
            max_active_goals: Some(FREE_ACTIVE_GOAL_LIMIT),
            max_owned_groups: Some(FREE_OWNED_GROUP_LIMIT),
        },
        PlanInfo {
            plan: Plan::PremiumMonthly,
            name: "Premium (monthly)".to_string(),
            price_cents: 999,
            interval: Some("month".to_string()),
            max_active_goals: None,
            max_owned_groups: None,
        },
        PlanInfo {
            plan: Plan::PremiumYearly,
            name: "Premium (yearly)".to_string(),
            price_cents: 9999,
            interval: Some("year".to_string()),
            max_active_goals: None,
            max_owned_groups: None,
        },
    ]
}

/// `GET /api/subscriptions/usage`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UsageStats {
    pub plan: Plan,
    pub active_goals: i64,
    pub owned_groups: i64,
    pub max_active_goals: Option<i64>,
    pub max_owned_groups: Option<i64>,
    pub limit_exceeded: bool,
}

/// `GET /api/subscriptions/me`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubscriptionOverview {
    pub plan: Plan,
    pub subscription: Option<Subscription>,
}
