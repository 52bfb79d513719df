use std::collections::HashMap;
use std::sync::LazyLock;

use crate::domain::value_objects::payments::GatewayErrorKind;

/// Gateway response-code reference: stable code, error category, and the
/// generic description used when no curated message exists for the code.
/// Built once at first use and shared read-only across requests.
const CODE_TABLE: &[(&str, GatewayErrorKind, &str)] = &[
    (
        "E00001",
        GatewayErrorKind::Transient,
        "An error occurred during processing. Please try again.",
    ),
    (
        "E00002",
        GatewayErrorKind::Validation,
        "The content type specified is not supported.",
    ),
    (
        "E00003",
        GatewayErrorKind::Validation,
        "An error occurred while parsing the request.",
    ),
    (
        "E00004",
        GatewayErrorKind::Validation,
        "The name of the requested API method is invalid.",
    ),
    (
        "E00005",
        GatewayErrorKind::Fatal,
        "The merchant transaction key is invalid or not present.",
    ),
    (
        "E00006",
        GatewayErrorKind::Fatal,
        "The merchant API login ID is invalid or not present.",
    ),
    (
        "E00007",
        GatewayErrorKind::Fatal,
        "User authentication failed due to invalid authentication values.",
    ),
    (
        "E00008",
        GatewayErrorKind::Fatal,
        "User authentication failed. The account or API user is inactive.",
    ),
    (
        "E00009",
        GatewayErrorKind::Fatal,
        "The account is in test mode. The request cannot be processed.",
    ),
    (
        "E00010",
        GatewayErrorKind::Fatal,
        "User authentication failed. You do not have the appropriate permissions.",
    ),
    (
        "E00011",
        GatewayErrorKind::Fatal,
        "Access denied. You do not have the appropriate permissions.",
    ),
    (
        "E00012",
        GatewayErrorKind::Validation,
        "A duplicate subscription already exists.",
    ),
    (
        "E00013",
        GatewayErrorKind::Validation,
        "The field is invalid.",
    ),
    (
        "E00014",
        GatewayErrorKind::Validation,
        "A required field is not present.",
    ),
    (
        "E00015",
        GatewayErrorKind::Validation,
        "The field length is invalid.",
    ),
    (
        "E00016",
        GatewayErrorKind::Validation,
        "The field type is invalid.",
    ),
    (
        "E00017",
        GatewayErrorKind::Validation,
        "The subscription start date cannot occur in the past.",
    ),
    (
        "E00018",
        GatewayErrorKind::Validation,
        "The credit card expires before the subscription start date.",
    ),
    (
        "E00021",
        GatewayErrorKind::Fatal,
        "The account is not enabled for credit card subscriptions.",
    ),
    (
        "E00022",
        GatewayErrorKind::Validation,
        "The billing interval length is invalid.",
    ),
    (
        "E00025",
        GatewayErrorKind::Fatal,
        "Automated recurring billing is not enabled for this account.",
    ),
    (
        "E00027",
        GatewayErrorKind::Declined,
        "The transaction was unsuccessful.",
    ),
    (
        "E00029",
        GatewayErrorKind::Validation,
        "Payment information is required.",
    ),
    (
        "E00035",
        GatewayErrorKind::Validation,
        "The subscription cannot be found.",
    ),
    (
        "E00037",
        GatewayErrorKind::Validation,
        "Subscriptions that are expired, canceled or terminated cannot be updated.",
    ),
    (
        "E00038",
        GatewayErrorKind::Validation,
        "The subscription has already been canceled.",
    ),
    (
        "E00039",
        GatewayErrorKind::Validation,
        "A duplicate record already exists.",
    ),
    (
        "E00040",
        GatewayErrorKind::Timing,
        "The record cannot be found.",
    ),
    (
        "E00041",
        GatewayErrorKind::Validation,
        "One or more fields must contain a value.",
    ),
    (
        "E00042",
        GatewayErrorKind::Validation,
        "The maximum number of payment profiles for this customer has been reached.",
    ),
    (
        "E00043",
        GatewayErrorKind::Validation,
        "The maximum number of shipping addresses for this customer has been reached.",
    ),
    (
        "E00044",
        GatewayErrorKind::Fatal,
        "Customer profile storage is not enabled for this account.",
    ),
    (
        "E00045",
        GatewayErrorKind::Validation,
        "The request namespace is invalid.",
    ),
    (
        "E00049",
        GatewayErrorKind::Transient,
        "The operation timed out before it could be completed.",
    ),
    (
        "E00051",
        GatewayErrorKind::Validation,
        "The original transaction was not issued for this payment profile.",
    ),
    (
        "E00053",
        GatewayErrorKind::Transient,
        "The server is currently too busy. Please try again later.",
    ),
    (
        "E00068",
        GatewayErrorKind::Transient,
        "The server is undergoing maintenance. Please try again later.",
    ),
];

pub static CODE_LOOKUP: LazyLock<HashMap<&'static str, (GatewayErrorKind, &'static str)>> =
    LazyLock::new(|| {
        CODE_TABLE
            .iter()
            .map(|&(code, kind, description)| (code, (kind, description)))
            .collect()
    });

/// Curated user-facing sentences for the codes customers hit most often.
/// Everything else falls back to the reference description above.
const CURATED_MESSAGES: &[(&str, &str)] = &[
    (
        "E00001",
        "Something went wrong while processing your payment. Please try again.",
    ),
    (
        "E00007",
        "The payment service rejected our credentials. Please contact support.",
    ),
    (
        "E00012",
        "You already have an active subscription for this plan.",
    ),
    (
        "E00027",
        "Your card was declined. Please verify your card details or try a different card.",
    ),
    (
        "E00035",
        "We could not find that subscription.",
    ),
    (
        "E00040",
        "We could not finish setting up your subscription. Please try again in a few moments.",
    ),
    (
        "E00044",
        "Recurring billing is not available right now. Please contact support.",
    ),
    (
        "E00053",
        "The payment service is busy right now. Please try again shortly.",
    ),
];

pub fn curated_message(code: &str) -> Option<&'static str> {
    CURATED_MESSAGES
        .iter()
        .find(|(candidate, _)| *candidate == code)
        .map(|&(_, message)| message)
}

/// Codes considered transient, with the suggested backoff for each:
/// generic system error, timeout, server busy, maintenance.
pub const RETRYABLE_CODES: &[(&str, u64)] = &[
    ("E00001", 2_000),
    ("E00049", 3_000),
    ("E00053", 5_000),
    ("E00068", 30_000),
];

pub fn retry_delay_ms(code: &str) -> Option<u64> {
    RETRYABLE_CODES
        .iter()
        .find(|(candidate, _)| *candidate == code)
        .map(|&(_, delay)| delay)
}
