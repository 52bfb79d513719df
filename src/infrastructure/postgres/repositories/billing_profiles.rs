use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{OptionalExtension, RunQueryDsl, insert_into, prelude::*, update};
use uuid::Uuid;

use crate::domain::entities::billing_profiles::{BillingProfileEntity, InsertBillingProfileEntity};
use crate::domain::repositories::billing_profiles::BillingProfileRepository;
use crate::domain::value_objects::enums::billing_cycles::BillingCycle;
use crate::domain::value_objects::payments::ProfileReference;
use crate::infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::billing_profiles};

pub struct BillingProfilePostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl BillingProfilePostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl BillingProfileRepository for BillingProfilePostgres {
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<BillingProfileEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let entity = billing_profiles::table
            .filter(billing_profiles::user_id.eq(user_id))
            .select(BillingProfileEntity::as_select())
            .first::<BillingProfileEntity>(&mut conn)
            .optional()?;

        Ok(entity)
    }

    async fn upsert_profile(
        &self,
        user_id: Uuid,
        profile: &ProfileReference,
        billing_cycle: BillingCycle,
    ) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        if let Some(existing_id) = billing_profiles::table
            .filter(billing_profiles::user_id.eq(user_id))
            .select(billing_profiles::id)
            .first::<i64>(&mut conn)
            .optional()?
        {
            update(billing_profiles::table.filter(billing_profiles::id.eq(existing_id)))
                .set((
                    billing_profiles::customer_profile_ref.eq(&profile.customer_profile_id),
                    billing_profiles::payment_profile_ref.eq(&profile.payment_profile_id),
                    billing_profiles::address_ref.eq(&profile.address_id),
                    billing_profiles::billing_cycle.eq(billing_cycle.as_str()),
                    billing_profiles::updated_at.eq(Utc::now()),
                ))
                .execute(&mut conn)?;

            return Ok(());
        }

        let insert_entity = InsertBillingProfileEntity {
            user_id,
            customer_profile_ref: profile.customer_profile_id.clone(),
            payment_profile_ref: profile.payment_profile_id.clone(),
            address_ref: profile.address_id.clone(),
            billing_cycle: billing_cycle.to_string(),
        };

        insert_into(billing_profiles::table)
            .values(&insert_entity)
            .execute(&mut conn)?;

        Ok(())
    }
}
