use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::subscription_records;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = subscription_records)]
pub struct SubscriptionRecordEntity {
    pub id: i64,
    pub user_id: Uuid,
    pub provider_subscription_id: Option<String>,
    pub transaction_ref: String,
    pub plan_name: String,
    pub amount_minor: i64,
    pub billing_cycle: String,
    pub status: String,
    pub starts_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = subscription_records)]
pub struct InsertSubscriptionRecordEntity {
    pub user_id: Uuid,
    pub provider_subscription_id: Option<String>,
    pub transaction_ref: String,
    pub plan_name: String,
    pub amount_minor: i64,
    pub billing_cycle: String,
    pub status: String,
    pub starts_at: DateTime<Utc>,
}
