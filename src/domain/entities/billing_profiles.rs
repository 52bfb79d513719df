use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::billing_profiles;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = billing_profiles)]
pub struct BillingProfileEntity {
    pub id: i64,
    pub user_id: Uuid,
    pub customer_profile_ref: String,
    pub payment_profile_ref: String,
    pub address_ref: String,
    pub billing_cycle: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = billing_profiles)]
pub struct InsertBillingProfileEntity {
    pub user_id: Uuid,
    pub customer_profile_ref: String,
    pub payment_profile_ref: String,
    pub address_ref: String,
    pub billing_cycle: String,
}
