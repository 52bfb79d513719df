use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use diesel::{OptionalExtension, RunQueryDsl, insert_into, prelude::*, update};
use uuid::Uuid;

use crate::domain::entities::subscription_records::{
    InsertSubscriptionRecordEntity, SubscriptionRecordEntity,
};
use crate::domain::repositories::subscription_records::SubscriptionRecordRepository;
use crate::domain::value_objects::enums::subscription_statuses::SubscriptionStatus;
use crate::infrastructure::postgres::{
    postgres_connection::PgPoolSquad, schema::subscription_records,
};

pub struct SubscriptionRecordPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl SubscriptionRecordPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SubscriptionRecordRepository for SubscriptionRecordPostgres {
    async fn record_outcome(&self, record: InsertSubscriptionRecordEntity) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let id = insert_into(subscription_records::table)
            .values(&record)
            .returning(subscription_records::id)
            .get_result::<i64>(&mut conn)?;

        Ok(id)
    }

    async fn find_current_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<SubscriptionRecordEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let entity = subscription_records::table
            .filter(subscription_records::user_id.eq(user_id))
            .filter(subscription_records::status.eq(SubscriptionStatus::Active.as_str()))
            .order(subscription_records::created_at.desc())
            .select(SubscriptionRecordEntity::as_select())
            .first::<SubscriptionRecordEntity>(&mut conn)
            .optional()?;

        Ok(entity)
    }

    async fn update_status_by_provider_subscription_id(
        &self,
        provider_subscription_id: &str,
        status: SubscriptionStatus,
    ) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(
            subscription_records::table.filter(
                subscription_records::provider_subscription_id.eq(provider_subscription_id),
            ),
        )
        .set(subscription_records::status.eq(status.as_str()))
        .execute(&mut conn)?;

        Ok(())
    }
}
