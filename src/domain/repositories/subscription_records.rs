use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::subscription_records::{
    InsertSubscriptionRecordEntity, SubscriptionRecordEntity,
};
use crate::domain::value_objects::enums::subscription_statuses::SubscriptionStatus;

#[async_trait]
#[automock]
pub trait SubscriptionRecordRepository {
    async fn record_outcome(&self, record: InsertSubscriptionRecordEntity) -> Result<i64>;

    async fn find_current_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<SubscriptionRecordEntity>>;

    async fn update_status_by_provider_subscription_id(
        &self,
        provider_subscription_id: &str,
        status: SubscriptionStatus,
    ) -> Result<()>;
}
