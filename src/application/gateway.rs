use async_trait::async_trait;

use crate::domain::value_objects::payments::{
    BillingAddress, CardDetails, ChargeResult, ProfileReference, ScheduleSnapshot,
    SubscriptionResult,
};
use crate::payments::GatewayError;
use crate::payments::authnet_client::AuthorizeNetClient;
use crate::payments::billing_schedule::BillingSchedule;

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait PaymentGateway: Send + Sync {
    async fn authorize_and_capture_new_card(
        &self,
        card: &CardDetails,
        amount_minor: i64,
        order_ref: &str,
        bill_to: Option<BillingAddress>,
        customer_email: &str,
    ) -> Result<ChargeResult, GatewayError>;

    async fn authorize_and_capture_from_profile(
        &self,
        profile: &ProfileReference,
        amount_minor: i64,
        order_ref: &str,
    ) -> Result<ChargeResult, GatewayError>;

    async fn derive_profile_from_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<ProfileReference, GatewayError>;

    async fn create_profile_explicitly(
        &self,
        customer_hint: &str,
        email: &str,
        card: &CardDetails,
        bill_to: Option<BillingAddress>,
        ship_to: Option<BillingAddress>,
    ) -> Result<ProfileReference, GatewayError>;

    async fn update_payment_profile(
        &self,
        profile: &ProfileReference,
        new_card: &CardDetails,
        new_bill_to: Option<BillingAddress>,
    ) -> Result<(), GatewayError>;

    async fn register_recurring_schedule(
        &self,
        profile: &ProfileReference,
        plan_name: &str,
        amount_minor: i64,
        schedule: &BillingSchedule,
    ) -> Result<SubscriptionResult, GatewayError>;

    async fn cancel_recurring_schedule(&self, subscription_id: &str) -> Result<(), GatewayError>;

    async fn fetch_schedule(&self, subscription_id: &str)
    -> Result<ScheduleSnapshot, GatewayError>;
}

#[async_trait]
impl PaymentGateway for AuthorizeNetClient {
    async fn authorize_and_capture_new_card(
        &self,
        card: &CardDetails,
        amount_minor: i64,
        order_ref: &str,
        bill_to: Option<BillingAddress>,
        customer_email: &str,
    ) -> Result<ChargeResult, GatewayError> {
        self.authorize_and_capture_new_card(
            card,
            amount_minor,
            order_ref,
            bill_to.as_ref(),
            customer_email,
        )
        .await
    }

    async fn authorize_and_capture_from_profile(
        &self,
        profile: &ProfileReference,
        amount_minor: i64,
        order_ref: &str,
    ) -> Result<ChargeResult, GatewayError> {
        self.authorize_and_capture_from_profile(profile, amount_minor, order_ref)
            .await
    }

    async fn derive_profile_from_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<ProfileReference, GatewayError> {
        self.derive_profile_from_transaction(transaction_id).await
    }

    async fn create_profile_explicitly(
        &self,
        customer_hint: &str,
        email: &str,
        card: &CardDetails,
        bill_to: Option<BillingAddress>,
        ship_to: Option<BillingAddress>,
    ) -> Result<ProfileReference, GatewayError> {
        self.create_profile_explicitly(customer_hint, email, card, bill_to.as_ref(), ship_to.as_ref())
            .await
    }

    async fn update_payment_profile(
        &self,
        profile: &ProfileReference,
        new_card: &CardDetails,
        new_bill_to: Option<BillingAddress>,
    ) -> Result<(), GatewayError> {
        self.update_payment_profile(profile, new_card, new_bill_to.as_ref())
            .await
    }

    async fn register_recurring_schedule(
        &self,
        profile: &ProfileReference,
        plan_name: &str,
        amount_minor: i64,
        schedule: &BillingSchedule,
    ) -> Result<SubscriptionResult, GatewayError> {
        self.register_recurring_schedule(profile, plan_name, amount_minor, schedule)
            .await
    }

    async fn cancel_recurring_schedule(&self, subscription_id: &str) -> Result<(), GatewayError> {
        self.cancel_recurring_schedule(subscription_id).await
    }

    async fn fetch_schedule(
        &self,
        subscription_id: &str,
    ) -> Result<ScheduleSnapshot, GatewayError> {
        self.fetch_schedule(subscription_id).await
    }
}
