use serde::Deserialize;
use serde_json::{Value, json};
use tracing::error;

use crate::domain::value_objects::payments::{
    BillingAddress, CardDetails, ChargeResult, ClassifiedError, GatewayErrorKind,
    ProfileReference, ScheduleSnapshot, SubscriptionResult, format_amount,
};
use crate::payments::GatewayError;
use crate::payments::billing_schedule::BillingSchedule;
use crate::payments::error_classifier;

/// Minimal Authorize.Net JSON API client built on reqwest. Performs exactly
/// one remote operation per call and never retries internally; retry policy
/// belongs to the orchestrator.
pub struct AuthorizeNetClient {
    http: reqwest::Client,
    api_login_id: String,
    transaction_key: String,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseMessages {
    result_code: String,
    #[serde(default)]
    message: Vec<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    code: String,
    text: String,
}

impl ResponseMessages {
    fn is_ok(&self) -> bool {
        self.result_code.eq_ignore_ascii_case("ok")
    }

    fn error_text(&self) -> String {
        if self.message.is_empty() {
            return format!("gateway result code {}", self.result_code);
        }
        self.message
            .iter()
            .map(|m| format!("{}: {}", m.code, m.text))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionError {
    error_code: Option<String>,
    error_text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionResponsePayload {
    response_code: Option<String>,
    trans_id: Option<String>,
    auth_code: Option<String>,
    avs_result_code: Option<String>,
    #[serde(default)]
    errors: Vec<TransactionError>,
}

impl TransactionResponsePayload {
    fn error_text(&self) -> Option<String> {
        if self.errors.is_empty() {
            return None;
        }
        Some(
            self.errors
                .iter()
                .map(|e| {
                    format!(
                        "{}: {}",
                        e.error_code.as_deref().unwrap_or("?"),
                        e.error_text.as_deref().unwrap_or("")
                    )
                })
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTransactionResponse {
    transaction_response: Option<TransactionResponsePayload>,
    messages: ResponseMessages,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomerProfileResponse {
    customer_profile_id: Option<String>,
    #[serde(default)]
    customer_payment_profile_id_list: Vec<String>,
    #[serde(default)]
    customer_shipping_address_id_list: Vec<String>,
    messages: ResponseMessages,
}

impl CustomerProfileResponse {
    /// Missing list entries become empty identifiers; the caller decides
    /// whether an incomplete triple is acceptable.
    fn profile_reference(&self) -> ProfileReference {
        ProfileReference {
            customer_profile_id: self.customer_profile_id.clone().unwrap_or_default(),
            payment_profile_id: self
                .customer_payment_profile_id_list
                .first()
                .cloned()
                .unwrap_or_default(),
            address_id: self
                .customer_shipping_address_id_list
                .first()
                .cloned()
                .unwrap_or_default(),
        }
    }
}

impl AuthorizeNetClient {
    pub fn new(api_login_id: String, transaction_key: String, endpoint: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_login_id,
            transaction_key,
            endpoint,
        }
    }

    fn merchant_authentication(&self) -> Value {
        json!({
            "name": self.api_login_id,
            "transactionKey": self.transaction_key,
        })
    }

    fn credit_card_value(card: &CardDetails) -> Value {
        json!({
            "cardNumber": card.card_number,
            "expirationDate": card.expiration_date(),
            "cardCode": card.security_code,
        })
    }

    fn address_value(address: &BillingAddress) -> Value {
        let mut value = json!({
            "firstName": address.first_name,
            "lastName": address.last_name,
            "address": address.street,
            "city": address.city,
            "state": address.state,
            "zip": address.zip,
        });
        if let Some(country) = &address.country {
            value["country"] = json!(country);
        }
        value
    }

    fn transport_failure(context: &str, detail: String) -> GatewayError {
        error!(context, detail = %detail, "gateway transport failure");
        GatewayError::Transport(ClassifiedError {
            code: None,
            kind: GatewayErrorKind::Transient,
            user_message:
                "We could not reach the payment service. Please try again in a moment."
                    .to_string(),
            technical_details: detail,
            retryable: true,
            retry_delay_ms: 3_000,
        })
    }

    fn semantic_failure(context: &str, raw_text: String) -> GatewayError {
        let classified = error_classifier::classify(&raw_text);
        error!(
            context,
            gateway_error_code = ?classified.code,
            gateway_error_kind = ?classified.kind,
            detail = %raw_text,
            "gateway request failed"
        );
        match classified.kind {
            GatewayErrorKind::Declined => GatewayError::Declined(classified),
            _ => GatewayError::Gateway(classified),
        }
    }

    /// Response code 2 is authoritative: the charge was declined even when
    /// the error text carries no decline wording.
    fn declined_failure(context: &str, raw_text: String) -> GatewayError {
        let classified = error_classifier::classify(&raw_text);
        error!(
            context,
            gateway_error_code = ?classified.code,
            detail = %raw_text,
            "charge declined by the processor"
        );
        GatewayError::Declined(classified)
    }

    /// Sends one API request and returns the raw response body. The gateway
    /// prefixes JSON responses with a UTF-8 BOM, which must be stripped
    /// before parsing.
    async fn post(&self, context: &str, body: Value) -> Result<String, GatewayError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|err| Self::transport_failure(context, err.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| Self::transport_failure(context, err.to_string()))?;

        if !status.is_success() {
            return Err(Self::transport_failure(
                context,
                format!("unexpected HTTP status {status}: {text}"),
            ));
        }

        Ok(text.trim_start_matches('\u{feff}').to_string())
    }

    async fn post_parsed<T>(&self, context: &str, body: Value) -> Result<T, GatewayError>
    where
        T: serde::de::DeserializeOwned,
    {
        let text = self.post(context, body).await?;
        serde_json::from_str(&text).map_err(|err| {
            Self::transport_failure(context, format!("malformed gateway response: {err}"))
        })
    }

    fn charge_outcome(
        context: &str,
        response: CreateTransactionResponse,
    ) -> Result<ChargeResult, GatewayError> {
        if let Some(transaction) = response.transaction_response {
            let response_code = transaction.response_code.clone().unwrap_or_default();
            match response_code.as_str() {
                "1" => {
                    let transaction_id = transaction.trans_id.clone().unwrap_or_default();
                    if transaction_id.is_empty() {
                        return Err(Self::transport_failure(
                            context,
                            "approved transaction is missing a transaction id".to_string(),
                        ));
                    }
                    Ok(ChargeResult {
                        transaction_id,
                        response_code,
                        auth_code: transaction.auth_code,
                        avs_result_code: transaction.avs_result_code,
                    })
                }
                "2" => {
                    let raw = transaction
                        .error_text()
                        .unwrap_or_else(|| "The transaction was declined.".to_string());
                    Err(Self::declined_failure(context, raw))
                }
                _ => {
                    let raw = transaction
                        .error_text()
                        .unwrap_or_else(|| response.messages.error_text());
                    Err(Self::semantic_failure(context, raw))
                }
            }
        } else {
            Err(Self::semantic_failure(
                context,
                response.messages.error_text(),
            ))
        }
    }

    /// Authorizes and captures a one-time charge against raw card details.
    pub async fn authorize_and_capture_new_card(
        &self,
        card: &CardDetails,
        amount_minor: i64,
        order_ref: &str,
        bill_to: Option<&BillingAddress>,
        customer_email: &str,
    ) -> Result<ChargeResult, GatewayError> {
        let context = "authorize and capture (new card)";

        let mut transaction_request = json!({
            "transactionType": "authCaptureTransaction",
            "amount": format_amount(amount_minor),
            "payment": { "creditCard": Self::credit_card_value(card) },
            "order": { "invoiceNumber": order_ref },
            "customer": { "email": customer_email },
        });
        if let Some(address) = bill_to {
            transaction_request["billTo"] = Self::address_value(address);
        }

        let body = json!({
            "createTransactionRequest": {
                "merchantAuthentication": self.merchant_authentication(),
                "refId": order_ref,
                "transactionRequest": transaction_request,
            }
        });

        let response: CreateTransactionResponse = self.post_parsed(context, body).await?;
        Self::charge_outcome(context, response)
    }

    /// Authorizes and captures a charge against a stored customer profile.
    pub async fn authorize_and_capture_from_profile(
        &self,
        profile: &ProfileReference,
        amount_minor: i64,
        order_ref: &str,
    ) -> Result<ChargeResult, GatewayError> {
        let context = "authorize and capture (stored profile)";

        let body = json!({
            "createTransactionRequest": {
                "merchantAuthentication": self.merchant_authentication(),
                "refId": order_ref,
                "transactionRequest": {
                    "transactionType": "authCaptureTransaction",
                    "amount": format_amount(amount_minor),
                    "profile": {
                        "customerProfileId": profile.customer_profile_id,
                        "paymentProfile": {
                            "paymentProfileId": profile.payment_profile_id,
                        },
                    },
                    "order": { "invoiceNumber": order_ref },
                },
            }
        });

        let response: CreateTransactionResponse = self.post_parsed(context, body).await?;
        Self::charge_outcome(context, response)
    }

    /// Asks the gateway to build a reusable customer profile from a settled
    /// transaction. Fails (without retry) while the gateway has not yet
    /// attached payment and address identifiers to the transaction.
    pub async fn derive_profile_from_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<ProfileReference, GatewayError> {
        let context = "create profile from transaction";

        let body = json!({
            "createCustomerProfileFromTransactionRequest": {
                "merchantAuthentication": self.merchant_authentication(),
                "transId": transaction_id,
            }
        });

        let response: CustomerProfileResponse = self.post_parsed(context, body).await?;
        if !response.messages.is_ok() {
            return Err(Self::semantic_failure(
                context,
                response.messages.error_text(),
            ));
        }

        Ok(response.profile_reference())
    }

    /// Creates a customer profile directly from payment details, used when
    /// deriving one from the transaction fails.
    pub async fn create_profile_explicitly(
        &self,
        customer_hint: &str,
        email: &str,
        card: &CardDetails,
        bill_to: Option<&BillingAddress>,
        ship_to: Option<&BillingAddress>,
    ) -> Result<ProfileReference, GatewayError> {
        let context = "create profile explicitly";

        let mut payment_profile = json!({
            "customerType": "individual",
            "payment": { "creditCard": Self::credit_card_value(card) },
        });
        if let Some(address) = bill_to {
            payment_profile["billTo"] = Self::address_value(address);
        }

        let mut profile = json!({
            "merchantCustomerId": customer_hint,
            "email": email,
            "paymentProfiles": [payment_profile],
        });
        if let Some(address) = ship_to {
            profile["shipToList"] = json!([Self::address_value(address)]);
        }

        let body = json!({
            "createCustomerProfileRequest": {
                "merchantAuthentication": self.merchant_authentication(),
                "profile": profile,
                "validationMode": "none",
            }
        });

        let response: CustomerProfileResponse = self.post_parsed(context, body).await?;
        if !response.messages.is_ok() {
            return Err(Self::semantic_failure(
                context,
                response.messages.error_text(),
            ));
        }

        Ok(response.profile_reference())
    }

    /// Replaces the stored card data behind an existing payment profile,
    /// keeping the same identifier triple.
    pub async fn update_payment_profile(
        &self,
        profile: &ProfileReference,
        new_card: &CardDetails,
        new_bill_to: Option<&BillingAddress>,
    ) -> Result<(), GatewayError> {
        let context = "update payment profile";

        let mut payment_profile = json!({
            "payment": { "creditCard": Self::credit_card_value(new_card) },
            "customerPaymentProfileId": profile.payment_profile_id,
        });
        if let Some(address) = new_bill_to {
            payment_profile["billTo"] = Self::address_value(address);
        }

        let body = json!({
            "updateCustomerPaymentProfileRequest": {
                "merchantAuthentication": self.merchant_authentication(),
                "customerProfileId": profile.customer_profile_id,
                "paymentProfile": payment_profile,
                "validationMode": "none",
            }
        });

        #[derive(Debug, Deserialize)]
        struct UpdateResponse {
            messages: ResponseMessages,
        }

        let response: UpdateResponse = self.post_parsed(context, body).await?;
        if !response.messages.is_ok() {
            return Err(Self::semantic_failure(
                context,
                response.messages.error_text(),
            ));
        }

        Ok(())
    }

    /// Registers a recurring billing schedule against a stored profile.
    pub async fn register_recurring_schedule(
        &self,
        profile: &ProfileReference,
        plan_name: &str,
        amount_minor: i64,
        schedule: &BillingSchedule,
    ) -> Result<SubscriptionResult, GatewayError> {
        let context = "register recurring schedule";

        let body = json!({
            "ARBCreateSubscriptionRequest": {
                "merchantAuthentication": self.merchant_authentication(),
                "subscription": {
                    "name": plan_name,
                    "paymentSchedule": {
                        "interval": {
                            "length": schedule.interval_months,
                            "unit": "months",
                        },
                        "startDate": schedule.start_date.format("%Y-%m-%d").to_string(),
                        "totalOccurrences": schedule.total_occurrences,
                    },
                    "amount": format_amount(amount_minor),
                    "profile": {
                        "customerProfileId": profile.customer_profile_id,
                        "customerPaymentProfileId": profile.payment_profile_id,
                        "customerAddressId": profile.address_id,
                    },
                },
            }
        });

        #[derive(Debug, Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct ArbCreateResponse {
            subscription_id: Option<String>,
            messages: ResponseMessages,
        }

        let response: ArbCreateResponse = self.post_parsed(context, body).await?;
        if !response.messages.is_ok() {
            return Err(Self::semantic_failure(
                context,
                response.messages.error_text(),
            ));
        }

        match response.subscription_id {
            Some(subscription_id) if !subscription_id.is_empty() => {
                Ok(SubscriptionResult { subscription_id })
            }
            _ => Err(Self::transport_failure(
                context,
                "schedule registered but no subscription id was returned".to_string(),
            )),
        }
    }

    /// Cancels an existing recurring schedule.
    pub async fn cancel_recurring_schedule(
        &self,
        subscription_id: &str,
    ) -> Result<(), GatewayError> {
        let context = "cancel recurring schedule";

        let body = json!({
            "ARBCancelSubscriptionRequest": {
                "merchantAuthentication": self.merchant_authentication(),
                "subscriptionId": subscription_id,
            }
        });

        #[derive(Debug, Deserialize)]
        struct ArbCancelResponse {
            messages: ResponseMessages,
        }

        let response: ArbCancelResponse = self.post_parsed(context, body).await?;
        if !response.messages.is_ok() {
            return Err(Self::semantic_failure(
                context,
                response.messages.error_text(),
            ));
        }

        Ok(())
    }

    /// Reads back the current state of a recurring schedule.
    pub async fn fetch_schedule(
        &self,
        subscription_id: &str,
    ) -> Result<ScheduleSnapshot, GatewayError> {
        let context = "fetch schedule";

        let body = json!({
            "ARBGetSubscriptionRequest": {
                "merchantAuthentication": self.merchant_authentication(),
                "subscriptionId": subscription_id,
            }
        });

        #[derive(Debug, Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct ArbInterval {
            length: u32,
        }

        #[derive(Debug, Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct ArbPaymentSchedule {
            interval: Option<ArbInterval>,
            start_date: Option<String>,
            total_occurrences: Option<i32>,
        }

        #[derive(Debug, Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct ArbSubscription {
            name: Option<String>,
            status: Option<String>,
            amount: Option<f64>,
            payment_schedule: Option<ArbPaymentSchedule>,
        }

        #[derive(Debug, Deserialize)]
        struct ArbGetResponse {
            subscription: Option<ArbSubscription>,
            messages: ResponseMessages,
        }

        let response: ArbGetResponse = self.post_parsed(context, body).await?;
        if !response.messages.is_ok() {
            return Err(Self::semantic_failure(
                context,
                response.messages.error_text(),
            ));
        }

        let subscription = response.subscription.ok_or_else(|| {
            Self::transport_failure(context, "subscription payload is missing".to_string())
        })?;

        let schedule = subscription.payment_schedule;
        // Schedules registered by this system always use month intervals.
        let interval_months = schedule
            .as_ref()
            .and_then(|s| s.interval.as_ref())
            .map(|i| i.length)
            .unwrap_or(0);
        let start_date = schedule
            .as_ref()
            .and_then(|s| s.start_date.as_deref())
            .and_then(|raw| chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok());
        let total_occurrences = schedule.as_ref().and_then(|s| s.total_occurrences);

        Ok(ScheduleSnapshot {
            name: subscription.name,
            status: subscription.status.unwrap_or_else(|| "unknown".to_string()),
            amount_minor: subscription
                .amount
                .map(|amount| (amount * 100.0).round() as i64)
                .unwrap_or(0),
            interval_months,
            start_date,
            total_occurrences,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approved_payload() -> CreateTransactionResponse {
        serde_json::from_str(
            r#"{
                "transactionResponse": {
                    "responseCode": "1",
                    "transId": "60198311111",
                    "authCode": "ABC123",
                    "avsResultCode": "Y"
                },
                "messages": {
                    "resultCode": "Ok",
                    "message": [{ "code": "I00001", "text": "Successful." }]
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn approved_transaction_becomes_charge_result() {
        let charge = AuthorizeNetClient::charge_outcome("test", approved_payload()).unwrap();

        assert_eq!(charge.transaction_id, "60198311111");
        assert_eq!(charge.response_code, "1");
        assert_eq!(charge.auth_code.as_deref(), Some("ABC123"));
    }

    #[test]
    fn declined_transaction_is_classified_as_declined() {
        let response: CreateTransactionResponse = serde_json::from_str(
            r#"{
                "transactionResponse": {
                    "responseCode": "2",
                    "transId": "60198311112",
                    "errors": [{
                        "errorCode": "2",
                        "errorText": "This transaction has been declined due to insufficient funds."
                    }]
                },
                "messages": { "resultCode": "Error", "message": [] }
            }"#,
        )
        .unwrap();

        let err = AuthorizeNetClient::charge_outcome("test", response).unwrap_err();
        match err {
            GatewayError::Declined(classified) => {
                assert_eq!(classified.kind, GatewayErrorKind::Declined);
                assert!(!classified.retryable);
            }
            other => panic!("expected declined error, got {other:?}"),
        }
    }

    #[test]
    fn envelope_error_without_transaction_uses_messages() {
        let response: CreateTransactionResponse = serde_json::from_str(
            r#"{
                "messages": {
                    "resultCode": "Error",
                    "message": [{ "code": "E00007", "text": "User authentication failed." }]
                }
            }"#,
        )
        .unwrap();

        let err = AuthorizeNetClient::charge_outcome("test", response).unwrap_err();
        match err {
            GatewayError::Gateway(classified) => {
                assert_eq!(classified.code.as_deref(), Some("E00007"));
                assert_eq!(classified.kind, GatewayErrorKind::Fatal);
            }
            other => panic!("expected gateway error, got {other:?}"),
        }
    }

    #[test]
    fn profile_response_tolerates_missing_identifier_lists() {
        let response: CustomerProfileResponse = serde_json::from_str(
            r#"{
                "customerProfileId": "10001",
                "messages": { "resultCode": "Ok", "message": [] }
            }"#,
        )
        .unwrap();

        let profile = response.profile_reference();
        assert_eq!(profile.customer_profile_id, "10001");
        assert!(profile.payment_profile_id.is_empty());
        assert!(!profile.is_complete());
    }
}
