use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::billing_profiles::BillingProfileEntity;
use crate::domain::value_objects::enums::billing_cycles::BillingCycle;
use crate::domain::value_objects::payments::ProfileReference;

#[async_trait]
#[automock]
pub trait BillingProfileRepository {
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<BillingProfileEntity>>;

    async fn upsert_profile(
        &self,
        user_id: Uuid,
        profile: &ProfileReference,
        billing_cycle: BillingCycle,
    ) -> Result<()>;
}
