use serde::{Deserialize, Serialize};

use crate::domain::value_objects::enums::billing_cycles::BillingCycle;
use crate::domain::value_objects::payments::{
    BillingAddress, CardDetails, ClassifiedError, ProfileReference,
};

/// One subscription-creation attempt. Ephemeral: built by the request
/// handler, consumed by a single orchestrator call.
///
/// Either `card` is present (new-profile path) or `existing_profile` carries
/// the full identifier triple; an existing customer may supply both to
/// refresh the stored card data before the charge.
#[derive(Debug, Clone)]
pub struct SubscriptionRequest {
    pub plan_name: String,
    pub amount_minor: i64,
    pub payer_first_name: String,
    pub payer_last_name: String,
    pub email: String,
    pub card: Option<CardDetails>,
    pub billing_address: Option<BillingAddress>,
    pub existing_profile: Option<ProfileReference>,
}

/// Reconciliation payload for failures that occur after money was captured.
/// Always carried explicitly on the failure outcome, never inferred.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PartialSuccess {
    pub transaction_id: String,
    pub profile: Option<ProfileReference>,
}

/// Terminal result of the subscription workflow.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub enum SubscriptionOutcome {
    Completed {
        transaction_id: String,
        subscription_id: String,
        profile: ProfileReference,
        billing_cycle: BillingCycle,
    },
    ChargeFailed {
        error: ClassifiedError,
    },
    ProvisioningFailed {
        error: ClassifiedError,
        partial: PartialSuccess,
    },
    SchedulingFailed {
        error: ClassifiedError,
        partial: PartialSuccess,
    },
}

impl SubscriptionOutcome {
    /// True when a charge was captured but a dependent step failed, meaning
    /// the caller must reconcile manually instead of discarding the result.
    pub fn is_partial_success(&self) -> bool {
        matches!(
            self,
            SubscriptionOutcome::ProvisioningFailed { .. }
                | SubscriptionOutcome::SchedulingFailed { .. }
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CardModel {
    pub card_number: String,
    /// `MM/YYYY` or `MM/YY`.
    pub expiry: String,
    pub security_code: String,
}

/// Request body for `POST /subscribe`.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscribeModel {
    pub plan_name: String,
    /// Decimal string, e.g. `"99.00"`.
    pub amount: String,
    pub first_name: String,
    pub last_name: String,
    pub card: Option<CardModel>,
    pub billing_address: Option<BillingAddress>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePaymentModel {
    pub card: CardModel,
    pub billing_address: Option<BillingAddress>,
}

#[derive(Debug, Serialize)]
pub struct SubscribeResponseDto {
    pub status: &'static str,
    pub transaction_id: Option<String>,
    pub subscription_id: Option<String>,
    pub billing_cycle: Option<BillingCycle>,
    pub error: Option<ClassifiedError>,
}

#[derive(Debug, Serialize)]
pub struct CurrentSubscriptionDto {
    pub plan_name: String,
    pub status: String,
    pub amount_minor: i64,
    pub billing_cycle: Option<BillingCycle>,
    pub next_billing_date: Option<chrono::NaiveDate>,
}
