use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use chrono::Utc;
use tracing::{error, info, warn};

use crate::application::gateway::PaymentGateway;
use crate::application::usecases::subscriptions::{SCHEDULE_RETRY_DELAY, SubscriptionUseCase};
use crate::auth::AuthUser;
use crate::domain::entities::billing_profiles::BillingProfileEntity;
use crate::domain::entities::subscription_records::InsertSubscriptionRecordEntity;
use crate::domain::repositories::billing_profiles::BillingProfileRepository;
use crate::domain::repositories::subscription_records::SubscriptionRecordRepository;
use crate::domain::value_objects::enums::billing_cycles::BillingCycle;
use crate::domain::value_objects::enums::subscription_statuses::SubscriptionStatus;
use crate::domain::value_objects::payments::{
    CardDetails, GatewayErrorKind, ProfileReference, parse_amount_minor,
};
use crate::domain::value_objects::subscriptions::{
    CardModel, CurrentSubscriptionDto, SubscribeModel, SubscribeResponseDto, SubscriptionOutcome,
    SubscriptionRequest, UpdatePaymentModel,
};
use crate::infrastructure::axum_http::error_responses::AppError;
use crate::infrastructure::postgres::postgres_connection::PgPoolSquad;
use crate::infrastructure::postgres::repositories::{
    billing_profiles::BillingProfilePostgres, subscription_records::SubscriptionRecordPostgres,
};
use crate::payments::authnet_client::AuthorizeNetClient;
use crate::payments::billing_schedule;

pub struct SubscriptionsState<G, BP, SR>
where
    G: PaymentGateway + Send + Sync + 'static,
    BP: BillingProfileRepository + Send + Sync + 'static,
    SR: SubscriptionRecordRepository + Send + Sync + 'static,
{
    usecase: SubscriptionUseCase<G>,
    billing_profile_repo: Arc<BP>,
    subscription_record_repo: Arc<SR>,
}

pub fn routes(db_pool: Arc<PgPoolSquad>, gateway: Arc<AuthorizeNetClient>) -> Router {
    let billing_profile_repo = Arc::new(BillingProfilePostgres::new(Arc::clone(&db_pool)));
    let subscription_record_repo = Arc::new(SubscriptionRecordPostgres::new(Arc::clone(&db_pool)));
    let state = Arc::new(SubscriptionsState {
        usecase: SubscriptionUseCase::new(gateway, SCHEDULE_RETRY_DELAY),
        billing_profile_repo,
        subscription_record_repo,
    });

    Router::new()
        .route("/subscribe", post(subscribe))
        .route("/cancel", post(cancel_subscription))
        .route("/payment-method", put(update_payment_method))
        .route("/current", get(current_subscription))
        .with_state(state)
}

fn card_from_model(model: &CardModel) -> Result<CardDetails, AppError> {
    let (expiry_month, expiry_year) = CardDetails::parse_expiry(&model.expiry)
        .ok_or_else(|| AppError::BadRequest("card expiry must be MM/YYYY or MM/YY".to_string()))?;

    Ok(CardDetails {
        card_number: model.card_number.clone(),
        expiry_month,
        expiry_year,
        security_code: model.security_code.clone(),
    })
}

fn profile_from_entity(entity: &BillingProfileEntity) -> ProfileReference {
    ProfileReference {
        customer_profile_id: entity.customer_profile_ref.clone(),
        payment_profile_id: entity.payment_profile_ref.clone(),
        address_id: entity.address_ref.clone(),
    }
}

fn charge_failure_status(kind: GatewayErrorKind) -> StatusCode {
    match kind {
        GatewayErrorKind::Declined => StatusCode::PAYMENT_REQUIRED,
        GatewayErrorKind::Validation => StatusCode::BAD_REQUEST,
        _ => StatusCode::BAD_GATEWAY,
    }
}

pub async fn subscribe<G, BP, SR>(
    State(state): State<Arc<SubscriptionsState<G, BP, SR>>>,
    auth: AuthUser,
    Json(model): Json<SubscribeModel>,
) -> Result<impl IntoResponse, AppError>
where
    G: PaymentGateway + Send + Sync + 'static,
    BP: BillingProfileRepository + Send + Sync + 'static,
    SR: SubscriptionRecordRepository + Send + Sync + 'static,
{
    let amount_minor = parse_amount_minor(&model.amount)
        .filter(|amount| *amount > 0)
        .ok_or_else(|| {
            AppError::BadRequest("amount must be a positive decimal string".to_string())
        })?;
    let card = model.card.as_ref().map(card_from_model).transpose()?;
    let email = auth
        .email
        .clone()
        .ok_or_else(|| AppError::BadRequest("account email is required".to_string()))?;

    let existing_profile = state
        .billing_profile_repo
        .find_by_user_id(auth.user_id)
        .await?
        .map(|entity| profile_from_entity(&entity));

    let plan_name = model.plan_name.clone();
    let request = SubscriptionRequest {
        plan_name: model.plan_name,
        amount_minor,
        payer_first_name: model.first_name,
        payer_last_name: model.last_name,
        email,
        card,
        billing_address: model.billing_address,
        existing_profile,
    };

    let outcome = state
        .usecase
        .create_subscription(request)
        .await
        .map_err(AppError::from)?;

    match outcome {
        SubscriptionOutcome::Completed {
            transaction_id,
            subscription_id,
            profile,
            billing_cycle,
        } => {
            state
                .billing_profile_repo
                .upsert_profile(auth.user_id, &profile, billing_cycle)
                .await
                .map_err(|err| {
                    error!(
                        user_id = %auth.user_id,
                        transaction_id = %transaction_id,
                        subscription_id = %subscription_id,
                        db_error = ?err,
                        "subscriptions: completed at gateway but profile persistence failed"
                    );
                    AppError::Internal(err)
                })?;

            state
                .subscription_record_repo
                .record_outcome(InsertSubscriptionRecordEntity {
                    user_id: auth.user_id,
                    provider_subscription_id: Some(subscription_id.clone()),
                    transaction_ref: transaction_id.clone(),
                    plan_name,
                    amount_minor,
                    billing_cycle: billing_cycle.to_string(),
                    status: SubscriptionStatus::Active.to_string(),
                    starts_at: Utc::now(),
                })
                .await
                .map_err(|err| {
                    error!(
                        user_id = %auth.user_id,
                        transaction_id = %transaction_id,
                        subscription_id = %subscription_id,
                        db_error = ?err,
                        "subscriptions: completed at gateway but record persistence failed"
                    );
                    AppError::Internal(err)
                })?;

            info!(
                user_id = %auth.user_id,
                transaction_id = %transaction_id,
                subscription_id = %subscription_id,
                "subscriptions: subscription persisted"
            );

            Ok((
                StatusCode::CREATED,
                Json(SubscribeResponseDto {
                    status: "completed",
                    transaction_id: Some(transaction_id),
                    subscription_id: Some(subscription_id),
                    billing_cycle: Some(billing_cycle),
                    error: None,
                }),
            ))
        }
        SubscriptionOutcome::ChargeFailed { error } => Ok((
            charge_failure_status(error.kind),
            Json(SubscribeResponseDto {
                status: "charge_failed",
                transaction_id: None,
                subscription_id: None,
                billing_cycle: None,
                error: Some(error),
            }),
        )),
        SubscriptionOutcome::ProvisioningFailed { error, partial } => {
            error!(
                user_id = %auth.user_id,
                transaction_id = %partial.transaction_id,
                gateway_code = ?error.code,
                "subscriptions: partial success requires manual reconciliation (charge captured, no profile)"
            );
            Ok((
                StatusCode::BAD_GATEWAY,
                Json(SubscribeResponseDto {
                    status: "provisioning_failed",
                    transaction_id: Some(partial.transaction_id),
                    subscription_id: None,
                    billing_cycle: None,
                    error: Some(error),
                }),
            ))
        }
        SubscriptionOutcome::SchedulingFailed { error, partial } => {
            error!(
                user_id = %auth.user_id,
                transaction_id = %partial.transaction_id,
                gateway_code = ?error.code,
                "subscriptions: partial success requires manual reconciliation (charge captured, no schedule)"
            );

            // The profile itself is valid; keep it so a later attempt can
            // reuse it without re-entering card details.
            if let Some(profile) = &partial.profile {
                let billing_cycle = billing_schedule::determine_cycle(&plan_name, amount_minor);
                if let Err(err) = state
                    .billing_profile_repo
                    .upsert_profile(auth.user_id, profile, billing_cycle)
                    .await
                {
                    error!(
                        user_id = %auth.user_id,
                        transaction_id = %partial.transaction_id,
                        db_error = ?err,
                        "subscriptions: failed to persist profile after scheduling failure"
                    );
                }
            }

            Ok((
                StatusCode::BAD_GATEWAY,
                Json(SubscribeResponseDto {
                    status: "scheduling_failed",
                    transaction_id: Some(partial.transaction_id),
                    subscription_id: None,
                    billing_cycle: None,
                    error: Some(error),
                }),
            ))
        }
    }
}

pub async fn cancel_subscription<G, BP, SR>(
    State(state): State<Arc<SubscriptionsState<G, BP, SR>>>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError>
where
    G: PaymentGateway + Send + Sync + 'static,
    BP: BillingProfileRepository + Send + Sync + 'static,
    SR: SubscriptionRecordRepository + Send + Sync + 'static,
{
    let record = state
        .subscription_record_repo
        .find_current_for_user(auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("no active subscription".to_string()))?;

    let provider_subscription_id = record.provider_subscription_id.ok_or_else(|| {
        AppError::BadRequest("subscription has no recurring schedule to cancel".to_string())
    })?;

    state
        .usecase
        .cancel_subscription(&provider_subscription_id)
        .await
        .map_err(AppError::from)?;

    state
        .subscription_record_repo
        .update_status_by_provider_subscription_id(
            &provider_subscription_id,
            SubscriptionStatus::Canceled,
        )
        .await?;

    info!(
        user_id = %auth.user_id,
        provider_subscription_id = %provider_subscription_id,
        "subscriptions: subscription canceled"
    );

    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_payment_method<G, BP, SR>(
    State(state): State<Arc<SubscriptionsState<G, BP, SR>>>,
    auth: AuthUser,
    Json(model): Json<UpdatePaymentModel>,
) -> Result<impl IntoResponse, AppError>
where
    G: PaymentGateway + Send + Sync + 'static,
    BP: BillingProfileRepository + Send + Sync + 'static,
    SR: SubscriptionRecordRepository + Send + Sync + 'static,
{
    let entity = state
        .billing_profile_repo
        .find_by_user_id(auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("no stored billing profile".to_string()))?;

    let profile = profile_from_entity(&entity);
    let card = card_from_model(&model.card)?;

    state
        .usecase
        .update_payment_details(&profile, &card, model.billing_address.as_ref())
        .await
        .map_err(AppError::from)?;

    info!(
        user_id = %auth.user_id,
        customer_profile_id = %profile.customer_profile_id,
        "subscriptions: payment method updated"
    );

    Ok(StatusCode::NO_CONTENT)
}

pub async fn current_subscription<G, BP, SR>(
    State(state): State<Arc<SubscriptionsState<G, BP, SR>>>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError>
where
    G: PaymentGateway + Send + Sync + 'static,
    BP: BillingProfileRepository + Send + Sync + 'static,
    SR: SubscriptionRecordRepository + Send + Sync + 'static,
{
    let record = match state
        .subscription_record_repo
        .find_current_for_user(auth.user_id)
        .await?
    {
        Some(record) => record,
        None => return Ok((StatusCode::OK, Json(None))),
    };

    // Prefer the gateway's live status over the stored one when readable.
    let status = match &record.provider_subscription_id {
        Some(provider_subscription_id) => {
            match state
                .usecase
                .get_subscription_snapshot(provider_subscription_id)
                .await
            {
                Ok(snapshot) => snapshot.status,
                Err(err) => {
                    warn!(
                        user_id = %auth.user_id,
                        provider_subscription_id = %provider_subscription_id,
                        error = %err,
                        "subscriptions: schedule snapshot unavailable; using stored status"
                    );
                    record.status.clone()
                }
            }
        }
        None => record.status.clone(),
    };

    let billing_cycle = BillingCycle::from_str(&record.billing_cycle);
    let next_billing_date = billing_cycle.map(|cycle| {
        let today = Utc::now().date_naive();
        let mut next = record.starts_at.date_naive();
        while next <= today {
            next = billing_schedule::next_billing_date(next, cycle);
        }
        next
    });

    Ok((
        StatusCode::OK,
        Json(Some(CurrentSubscriptionDto {
            plan_name: record.plan_name,
            status,
            amount_minor: record.amount_minor,
            billing_cycle,
            next_billing_date,
        })),
    ))
}
