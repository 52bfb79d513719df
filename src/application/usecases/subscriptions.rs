use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::application::gateway::PaymentGateway;
use crate::application::usecases::profile_provisioner::ProfileProvisioner;
use crate::domain::value_objects::payments::{
    BillingAddress, CardDetails, ClassifiedError, GatewayErrorKind, ProfileReference,
    ScheduleSnapshot,
};
use crate::domain::value_objects::subscriptions::{
    PartialSuccess, SubscriptionOutcome, SubscriptionRequest,
};
use crate::payments::billing_schedule;

/// Total schedule-registration attempts, including the first one.
pub const MAX_SCHEDULING_ATTEMPTS: u32 = 3;

/// Wait between scheduling attempts while the gateway propagates a freshly
/// created profile. This is a timing-propagation wait specific to that
/// condition, not the classifier's generic transient backoff.
pub const SCHEDULE_RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum SubscriptionError {
    #[error("invalid subscription request: {0}")]
    Validation(String),
    #[error("{}", .0.user_message)]
    Gateway(ClassifiedError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl SubscriptionError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            SubscriptionError::Validation(_) => StatusCode::BAD_REQUEST,
            SubscriptionError::Gateway(classified) => match classified.kind {
                GatewayErrorKind::Declined => StatusCode::PAYMENT_REQUIRED,
                GatewayErrorKind::Validation => StatusCode::BAD_REQUEST,
                _ => StatusCode::BAD_GATEWAY,
            },
            SubscriptionError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, SubscriptionError>;

/// Subscription workflow: authorize the charge, provision a reusable
/// profile, then register the recurring schedule. Strictly sequential per
/// request; each step depends on an identifier produced by the previous one.
/// Once a charge succeeds the workflow always runs to a terminal outcome.
pub struct SubscriptionUseCase<G>
where
    G: PaymentGateway + Send + Sync + 'static,
{
    gateway: Arc<G>,
    provisioner: ProfileProvisioner<G>,
    schedule_retry_delay: Duration,
}

impl<G> SubscriptionUseCase<G>
where
    G: PaymentGateway + Send + Sync + 'static,
{
    pub fn new(gateway: Arc<G>, schedule_retry_delay: Duration) -> Self {
        Self {
            provisioner: ProfileProvisioner::new(Arc::clone(&gateway)),
            gateway,
            schedule_retry_delay,
        }
    }

    pub async fn create_subscription(
        &self,
        request: SubscriptionRequest,
    ) -> UseCaseResult<SubscriptionOutcome> {
        Self::validate_request(&request)?;

        let order_ref = generate_order_ref();
        info!(
            plan_name = %request.plan_name,
            amount_minor = request.amount_minor,
            order_ref = %order_ref,
            existing_profile = request.existing_profile.is_some(),
            "subscriptions: creating subscription"
        );

        // Existing customer supplying fresh card data: refresh the stored
        // payment profile before charging it.
        if let (Some(profile), Some(card)) = (&request.existing_profile, &request.card) {
            if let Err(err) = self
                .gateway
                .update_payment_profile(profile, card, request.billing_address.clone())
                .await
            {
                warn!(
                    customer_profile_id = %profile.customer_profile_id,
                    error = %err,
                    "subscriptions: payment profile update failed before charge"
                );
                return Ok(SubscriptionOutcome::ChargeFailed {
                    error: err.into_classified(),
                });
            }
            info!(
                customer_profile_id = %profile.customer_profile_id,
                "subscriptions: payment profile refreshed"
            );
        }

        let charge_attempt = match (&request.existing_profile, &request.card) {
            (Some(profile), _) => {
                self.gateway
                    .authorize_and_capture_from_profile(profile, request.amount_minor, &order_ref)
                    .await
            }
            (None, Some(card)) => {
                self.gateway
                    .authorize_and_capture_new_card(
                        card,
                        request.amount_minor,
                        &order_ref,
                        request.billing_address.clone(),
                        &request.email,
                    )
                    .await
            }
            (None, None) => {
                return Err(SubscriptionError::Validation(
                    "card details or a stored billing profile are required".to_string(),
                ));
            }
        };

        let charge = match charge_attempt {
            Ok(charge) => charge,
            Err(err) => {
                warn!(
                    order_ref = %order_ref,
                    error = %err,
                    "subscriptions: charge failed"
                );
                return Ok(SubscriptionOutcome::ChargeFailed {
                    error: err.into_classified(),
                });
            }
        };
        info!(
            transaction_id = %charge.transaction_id,
            order_ref = %order_ref,
            "subscriptions: charge captured"
        );

        // A failed charge is terminal, but from here on money has been
        // captured: every failure must carry the reconciliation payload.
        let profile = match &request.existing_profile {
            Some(profile) => profile.clone(),
            None => {
                // Validated above: the new-customer path always carries card
                // details.
                let Some(card) = &request.card else {
                    return Err(SubscriptionError::Validation(
                        "card details are required for a new billing profile".to_string(),
                    ));
                };
                let customer_name = format!(
                    "{} {}",
                    request.payer_first_name, request.payer_last_name
                );
                match self
                    .provisioner
                    .provision(
                        &charge.transaction_id,
                        &customer_name,
                        &request.email,
                        request.billing_address.as_ref(),
                        card,
                    )
                    .await
                {
                    Ok(profile) => profile,
                    Err(classified) => {
                        error!(
                            transaction_id = %charge.transaction_id,
                            error_code = ?classified.code,
                            "subscriptions: charge captured but no profile could be provisioned; \
                             manual reconciliation required"
                        );
                        return Ok(SubscriptionOutcome::ProvisioningFailed {
                            error: classified,
                            partial: PartialSuccess {
                                transaction_id: charge.transaction_id,
                                profile: None,
                            },
                        });
                    }
                }
            }
        };

        self.register_schedule(&request, charge.transaction_id, profile)
            .await
    }

    /// Schedule registration with the bounded timing-retry loop. The billing
    /// cycle and start date are computed once and reused unchanged across
    /// retries.
    async fn register_schedule(
        &self,
        request: &SubscriptionRequest,
        transaction_id: String,
        profile: ProfileReference,
    ) -> UseCaseResult<SubscriptionOutcome> {
        let billing_cycle =
            billing_schedule::determine_cycle(&request.plan_name, request.amount_minor);
        let schedule =
            billing_schedule::build_schedule(request.amount_minor, Utc::now().date_naive());

        let mut attempt = 1u32;
        loop {
            match self
                .gateway
                .register_recurring_schedule(
                    &profile,
                    &request.plan_name,
                    request.amount_minor,
                    &schedule,
                )
                .await
            {
                Ok(result) => {
                    info!(
                        transaction_id = %transaction_id,
                        subscription_id = %result.subscription_id,
                        billing_cycle = %billing_cycle,
                        attempt,
                        "subscriptions: recurring schedule registered"
                    );
                    return Ok(SubscriptionOutcome::Completed {
                        transaction_id,
                        subscription_id: result.subscription_id,
                        profile,
                        billing_cycle,
                    });
                }
                Err(err) if err.is_timing() && attempt < MAX_SCHEDULING_ATTEMPTS => {
                    warn!(
                        transaction_id = %transaction_id,
                        attempt,
                        "subscriptions: profile not yet visible to the scheduler; waiting before retry"
                    );
                    tokio::time::sleep(self.schedule_retry_delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    error!(
                        transaction_id = %transaction_id,
                        customer_profile_id = %profile.customer_profile_id,
                        attempt,
                        error = %err,
                        "subscriptions: charge captured but schedule registration failed; \
                         manual reconciliation required"
                    );
                    return Ok(SubscriptionOutcome::SchedulingFailed {
                        error: err.into_classified(),
                        partial: PartialSuccess {
                            transaction_id,
                            profile: Some(profile),
                        },
                    });
                }
            }
        }
    }

    pub async fn cancel_subscription(&self, subscription_id: &str) -> UseCaseResult<()> {
        info!(subscription_id, "subscriptions: canceling recurring schedule");
        self.gateway
            .cancel_recurring_schedule(subscription_id)
            .await
            .map_err(|err| {
                warn!(
                    subscription_id,
                    error = %err,
                    "subscriptions: cancel failed"
                );
                SubscriptionError::Gateway(err.into_classified())
            })?;

        info!(subscription_id, "subscriptions: recurring schedule canceled");
        Ok(())
    }

    pub async fn update_payment_details(
        &self,
        profile: &ProfileReference,
        card: &CardDetails,
        billing_address: Option<&BillingAddress>,
    ) -> UseCaseResult<()> {
        if !profile.is_complete() {
            return Err(SubscriptionError::Validation(
                "stored billing profile is missing identifiers".to_string(),
            ));
        }

        self.gateway
            .update_payment_profile(profile, card, billing_address.cloned())
            .await
            .map_err(|err| {
                warn!(
                    customer_profile_id = %profile.customer_profile_id,
                    error = %err,
                    "subscriptions: payment details update failed"
                );
                SubscriptionError::Gateway(err.into_classified())
            })?;

        info!(
            customer_profile_id = %profile.customer_profile_id,
            card = %card.masked_number(),
            "subscriptions: payment details updated"
        );
        Ok(())
    }

    pub async fn get_subscription_snapshot(
        &self,
        subscription_id: &str,
    ) -> UseCaseResult<ScheduleSnapshot> {
        self.gateway
            .fetch_schedule(subscription_id)
            .await
            .map_err(|err| SubscriptionError::Gateway(err.into_classified()))
    }

    fn validate_request(request: &SubscriptionRequest) -> UseCaseResult<()> {
        if request.plan_name.trim().is_empty() {
            return Err(SubscriptionError::Validation(
                "plan name is required".to_string(),
            ));
        }
        if request.amount_minor <= 0 {
            return Err(SubscriptionError::Validation(
                "plan price must be greater than zero".to_string(),
            ));
        }
        if !request.email.contains('@') {
            return Err(SubscriptionError::Validation(
                "a valid email address is required".to_string(),
            ));
        }

        match (&request.card, &request.existing_profile) {
            (None, None) => Err(SubscriptionError::Validation(
                "card details or a stored billing profile are required".to_string(),
            )),
            (None, Some(profile)) if !profile.is_complete() => Err(
                SubscriptionError::Validation(
                    "stored billing profile is missing identifiers".to_string(),
                ),
            ),
            (Some(card), _) => Self::validate_card(card),
            _ => Ok(()),
        }
    }

    fn validate_card(card: &CardDetails) -> UseCaseResult<()> {
        let digits: String = card
            .card_number
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .collect();
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(SubscriptionError::Validation(
                "card number must contain only digits".to_string(),
            ));
        }
        if !(1..=12).contains(&card.expiry_month) {
            return Err(SubscriptionError::Validation(
                "card expiry month is out of range".to_string(),
            ));
        }
        if !(2000..=2099).contains(&card.expiry_year) {
            return Err(SubscriptionError::Validation(
                "card expiry year is out of range".to_string(),
            ));
        }
        let code_len = card.security_code.len();
        if !(3..=4).contains(&code_len)
            || !card.security_code.chars().all(|c| c.is_ascii_digit())
        {
            return Err(SubscriptionError::Validation(
                "card security code is invalid".to_string(),
            ));
        }
        Ok(())
    }
}

/// Order references distinguish retried transport requests for the same
/// logical charge. The gateway caps them at 20 characters.
fn generate_order_ref() -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..10_000);
    format!("{}-{:04}", Utc::now().timestamp(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::gateway::MockPaymentGateway;
    use crate::domain::value_objects::enums::billing_cycles::BillingCycle;
    use crate::domain::value_objects::payments::{BillingAddress, ChargeResult, SubscriptionResult};
    use crate::payments::GatewayError;
    use crate::payments::error_classifier;

    fn sample_card() -> CardDetails {
        CardDetails {
            card_number: "4111111111111111".to_string(),
            expiry_month: 9,
            expiry_year: 2027,
            security_code: "123".to_string(),
        }
    }

    fn sample_address() -> BillingAddress {
        BillingAddress {
            first_name: "Pat".to_string(),
            last_name: "Doe".to_string(),
            street: "1 Main St".to_string(),
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            zip: "62701".to_string(),
            country: None,
        }
    }

    fn sample_profile() -> ProfileReference {
        ProfileReference {
            customer_profile_id: "10001".to_string(),
            payment_profile_id: "20001".to_string(),
            address_id: "30001".to_string(),
        }
    }

    fn sample_charge() -> ChargeResult {
        ChargeResult {
            transaction_id: "60198311111".to_string(),
            response_code: "1".to_string(),
            auth_code: Some("ABC123".to_string()),
            avs_result_code: Some("Y".to_string()),
        }
    }

    fn new_customer_request(amount_minor: i64) -> SubscriptionRequest {
        SubscriptionRequest {
            plan_name: "Premium".to_string(),
            amount_minor,
            payer_first_name: "Pat".to_string(),
            payer_last_name: "Doe".to_string(),
            email: "pat@example.com".to_string(),
            card: Some(sample_card()),
            billing_address: Some(sample_address()),
            existing_profile: None,
        }
    }

    fn existing_customer_request(card: Option<CardDetails>) -> SubscriptionRequest {
        SubscriptionRequest {
            plan_name: "Premium".to_string(),
            amount_minor: 9_900,
            payer_first_name: "Pat".to_string(),
            payer_last_name: "Doe".to_string(),
            email: "pat@example.com".to_string(),
            card,
            billing_address: None,
            existing_profile: Some(sample_profile()),
        }
    }

    fn timing_error() -> GatewayError {
        GatewayError::Gateway(error_classifier::classify(
            "E00040: The record cannot be found.",
        ))
    }

    fn declined_error() -> GatewayError {
        GatewayError::Declined(error_classifier::classify(
            "Your card was declined due to insufficient funds",
        ))
    }

    fn usecase(gateway: MockPaymentGateway) -> SubscriptionUseCase<MockPaymentGateway> {
        SubscriptionUseCase::new(Arc::new(gateway), Duration::ZERO)
    }

    #[tokio::test]
    async fn monthly_plan_completes_with_monthly_schedule() {
        let mut gateway = MockPaymentGateway::new();

        gateway
            .expect_authorize_and_capture_new_card()
            .times(1)
            .returning(|_, _, _, _, _| Box::pin(async { Ok(sample_charge()) }));
        gateway
            .expect_derive_profile_from_transaction()
            .times(1)
            .returning(|_| Box::pin(async { Ok(sample_profile()) }));
        gateway
            .expect_register_recurring_schedule()
            .times(1)
            .withf(|_, _, _, schedule| schedule.interval_months == 1)
            .returning(|_, _, _, _| {
                Box::pin(async {
                    Ok(SubscriptionResult {
                        subscription_id: "900001".to_string(),
                    })
                })
            });

        let outcome = usecase(gateway)
            .create_subscription(new_customer_request(9_900))
            .await
            .unwrap();

        match outcome {
            SubscriptionOutcome::Completed {
                transaction_id,
                subscription_id,
                profile,
                billing_cycle,
            } => {
                assert_eq!(transaction_id, "60198311111");
                assert_eq!(subscription_id, "900001");
                assert_eq!(profile, sample_profile());
                assert_eq!(billing_cycle, BillingCycle::Monthly);
            }
            other => panic!("expected completed outcome, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn annual_priced_plan_completes_with_annual_schedule() {
        let mut gateway = MockPaymentGateway::new();

        gateway
            .expect_authorize_and_capture_new_card()
            .times(1)
            .returning(|_, _, _, _, _| Box::pin(async { Ok(sample_charge()) }));
        gateway
            .expect_derive_profile_from_transaction()
            .times(1)
            .returning(|_| Box::pin(async { Ok(sample_profile()) }));
        gateway
            .expect_register_recurring_schedule()
            .times(1)
            .withf(|_, _, _, schedule| schedule.interval_months == 12)
            .returning(|_, _, _, _| {
                Box::pin(async {
                    Ok(SubscriptionResult {
                        subscription_id: "900002".to_string(),
                    })
                })
            });

        let outcome = usecase(gateway)
            .create_subscription(new_customer_request(199_000))
            .await
            .unwrap();

        match outcome {
            SubscriptionOutcome::Completed { billing_cycle, .. } => {
                assert_eq!(billing_cycle, BillingCycle::Annual);
            }
            other => panic!("expected completed outcome, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_charge_is_terminal_and_skips_later_steps() {
        let mut gateway = MockPaymentGateway::new();

        gateway
            .expect_authorize_and_capture_new_card()
            .times(1)
            .returning(|_, _, _, _, _| Box::pin(async { Err(declined_error()) }));
        gateway.expect_derive_profile_from_transaction().times(0);
        gateway.expect_register_recurring_schedule().times(0);

        let outcome = usecase(gateway)
            .create_subscription(new_customer_request(9_900))
            .await
            .unwrap();

        match outcome {
            SubscriptionOutcome::ChargeFailed { error } => {
                assert_eq!(error.kind, GatewayErrorKind::Declined);
                assert!(!error.retryable);
            }
            other => panic!("expected charge failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn provisioning_failure_carries_partial_success_payload() {
        let mut gateway = MockPaymentGateway::new();

        gateway
            .expect_authorize_and_capture_new_card()
            .times(1)
            .returning(|_, _, _, _, _| Box::pin(async { Ok(sample_charge()) }));
        // Derived profile comes back without payment/address identifiers,
        // and the explicit fallback fails too.
        gateway
            .expect_derive_profile_from_transaction()
            .times(1)
            .returning(|_| {
                Box::pin(async {
                    Ok(ProfileReference {
                        customer_profile_id: "10001".to_string(),
                        payment_profile_id: String::new(),
                        address_id: String::new(),
                    })
                })
            });
        gateway
            .expect_create_profile_explicitly()
            .times(1)
            .returning(|_, _, _, _, _| {
                Box::pin(async {
                    Err(GatewayError::Gateway(error_classifier::classify(
                        "E00044: Customer profile storage is not enabled.",
                    )))
                })
            });
        gateway.expect_register_recurring_schedule().times(0);

        let outcome = usecase(gateway)
            .create_subscription(new_customer_request(9_900))
            .await
            .unwrap();

        assert!(outcome.is_partial_success());
        match outcome {
            SubscriptionOutcome::ProvisioningFailed { error, partial } => {
                assert_eq!(partial.transaction_id, "60198311111");
                assert!(partial.profile.is_none());
                assert_eq!(error.code.as_deref(), Some("E00044"));
            }
            other => panic!("expected provisioning failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn timing_failures_retry_up_to_the_bound_then_fail_partial() {
        let mut gateway = MockPaymentGateway::new();

        gateway
            .expect_authorize_and_capture_new_card()
            .times(1)
            .returning(|_, _, _, _, _| Box::pin(async { Ok(sample_charge()) }));
        gateway
            .expect_derive_profile_from_transaction()
            .times(1)
            .returning(|_| Box::pin(async { Ok(sample_profile()) }));
        gateway
            .expect_register_recurring_schedule()
            .times(MAX_SCHEDULING_ATTEMPTS as usize)
            .returning(|_, _, _, _| Box::pin(async { Err(timing_error()) }));

        let outcome = usecase(gateway)
            .create_subscription(new_customer_request(9_900))
            .await
            .unwrap();

        assert!(outcome.is_partial_success());
        match outcome {
            SubscriptionOutcome::SchedulingFailed { error, partial } => {
                assert_eq!(error.code.as_deref(), Some("E00040"));
                assert_eq!(error.kind, GatewayErrorKind::Timing);
                assert_eq!(partial.transaction_id, "60198311111");
                assert_eq!(partial.profile, Some(sample_profile()));
            }
            other => panic!("expected scheduling failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn timing_failure_then_success_completes() {
        let mut gateway = MockPaymentGateway::new();

        gateway
            .expect_authorize_and_capture_new_card()
            .times(1)
            .returning(|_, _, _, _, _| Box::pin(async { Ok(sample_charge()) }));
        gateway
            .expect_derive_profile_from_transaction()
            .times(1)
            .returning(|_| Box::pin(async { Ok(sample_profile()) }));

        let mut call = 0u32;
        gateway
            .expect_register_recurring_schedule()
            .times(2)
            .returning(move |_, _, _, _| {
                call += 1;
                if call == 1 {
                    Box::pin(async { Err(timing_error()) })
                } else {
                    Box::pin(async {
                        Ok(SubscriptionResult {
                            subscription_id: "900003".to_string(),
                        })
                    })
                }
            });

        let outcome = usecase(gateway)
            .create_subscription(new_customer_request(9_900))
            .await
            .unwrap();

        assert!(matches!(outcome, SubscriptionOutcome::Completed { .. }));
    }

    #[tokio::test]
    async fn non_timing_scheduling_failure_is_not_retried() {
        let mut gateway = MockPaymentGateway::new();

        gateway
            .expect_authorize_and_capture_new_card()
            .times(1)
            .returning(|_, _, _, _, _| Box::pin(async { Ok(sample_charge()) }));
        gateway
            .expect_derive_profile_from_transaction()
            .times(1)
            .returning(|_| Box::pin(async { Ok(sample_profile()) }));
        gateway
            .expect_register_recurring_schedule()
            .times(1)
            .returning(|_, _, _, _| {
                Box::pin(async {
                    Err(GatewayError::Gateway(error_classifier::classify(
                        "E00012: A duplicate subscription already exists.",
                    )))
                })
            });

        let outcome = usecase(gateway)
            .create_subscription(new_customer_request(9_900))
            .await
            .unwrap();

        match outcome {
            SubscriptionOutcome::SchedulingFailed { error, partial } => {
                assert_eq!(error.code.as_deref(), Some("E00012"));
                assert!(!partial.transaction_id.is_empty());
            }
            other => panic!("expected scheduling failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn existing_customer_skips_provisioning() {
        let mut gateway = MockPaymentGateway::new();

        gateway.expect_update_payment_profile().times(0);
        gateway
            .expect_authorize_and_capture_from_profile()
            .times(1)
            .returning(|_, _, _| Box::pin(async { Ok(sample_charge()) }));
        gateway.expect_derive_profile_from_transaction().times(0);
        gateway.expect_create_profile_explicitly().times(0);
        gateway
            .expect_register_recurring_schedule()
            .times(1)
            .returning(|_, _, _, _| {
                Box::pin(async {
                    Ok(SubscriptionResult {
                        subscription_id: "900004".to_string(),
                    })
                })
            });

        let outcome = usecase(gateway)
            .create_subscription(existing_customer_request(None))
            .await
            .unwrap();

        match outcome {
            SubscriptionOutcome::Completed { profile, .. } => {
                assert_eq!(profile, sample_profile());
            }
            other => panic!("expected completed outcome, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn existing_customer_with_new_card_refreshes_profile_first() {
        let mut gateway = MockPaymentGateway::new();

        gateway
            .expect_update_payment_profile()
            .times(1)
            .returning(|_, _, _| Box::pin(async { Ok(()) }));
        gateway
            .expect_authorize_and_capture_from_profile()
            .times(1)
            .returning(|_, _, _| Box::pin(async { Ok(sample_charge()) }));
        gateway
            .expect_register_recurring_schedule()
            .times(1)
            .returning(|_, _, _, _| {
                Box::pin(async {
                    Ok(SubscriptionResult {
                        subscription_id: "900005".to_string(),
                    })
                })
            });

        let outcome = usecase(gateway)
            .create_subscription(existing_customer_request(Some(sample_card())))
            .await
            .unwrap();

        assert!(matches!(outcome, SubscriptionOutcome::Completed { .. }));
    }

    #[tokio::test]
    async fn failed_profile_refresh_prevents_the_charge() {
        let mut gateway = MockPaymentGateway::new();

        gateway
            .expect_update_payment_profile()
            .times(1)
            .returning(|_, _, _| {
                Box::pin(async {
                    Err(GatewayError::Gateway(error_classifier::classify(
                        "E00013: The field is invalid.",
                    )))
                })
            });
        gateway.expect_authorize_and_capture_from_profile().times(0);
        gateway.expect_register_recurring_schedule().times(0);

        let outcome = usecase(gateway)
            .create_subscription(existing_customer_request(Some(sample_card())))
            .await
            .unwrap();

        match outcome {
            SubscriptionOutcome::ChargeFailed { error } => {
                assert_eq!(error.code.as_deref(), Some("E00013"));
            }
            other => panic!("expected charge failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn request_without_card_or_profile_is_rejected_before_any_remote_call() {
        let gateway = MockPaymentGateway::new();

        let mut request = new_customer_request(9_900);
        request.card = None;

        let err = usecase(gateway)
            .create_subscription(request)
            .await
            .unwrap_err();

        assert!(matches!(err, SubscriptionError::Validation(_)));
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn non_positive_amount_is_rejected() {
        let gateway = MockPaymentGateway::new();

        let request = new_customer_request(0);
        let err = usecase(gateway)
            .create_subscription(request)
            .await
            .unwrap_err();

        assert!(matches!(err, SubscriptionError::Validation(_)));
    }

    #[tokio::test]
    async fn cancel_maps_gateway_failure_to_classified_error() {
        let mut gateway = MockPaymentGateway::new();

        gateway
            .expect_cancel_recurring_schedule()
            .times(1)
            .returning(|_| {
                Box::pin(async {
                    Err(GatewayError::Gateway(error_classifier::classify(
                        "E00035: The subscription cannot be found.",
                    )))
                })
            });

        let err = usecase(gateway)
            .cancel_subscription("900001")
            .await
            .unwrap_err();

        match err {
            SubscriptionError::Gateway(classified) => {
                assert_eq!(classified.code.as_deref(), Some("E00035"));
            }
            other => panic!("expected gateway error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn snapshot_passes_through_gateway_result() {
        let mut gateway = MockPaymentGateway::new();

        gateway.expect_fetch_schedule().times(1).returning(|_| {
            Box::pin(async {
                Ok(ScheduleSnapshot {
                    name: Some("Premium".to_string()),
                    status: "active".to_string(),
                    amount_minor: 9_900,
                    interval_months: 1,
                    start_date: None,
                    total_occurrences: Some(9999),
                })
            })
        });

        let snapshot = usecase(gateway)
            .get_subscription_snapshot("900001")
            .await
            .unwrap();

        assert_eq!(snapshot.status, "active");
        assert_eq!(snapshot.interval_months, 1);
    }

    #[test]
    fn order_refs_fit_the_gateway_limit() {
        let order_ref = generate_order_ref();
        assert!(order_ref.len() <= 20);
    }
}
