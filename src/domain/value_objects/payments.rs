use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardDetails {
    pub card_number: String,
    pub expiry_month: u32,
    pub expiry_year: i32,
    pub security_code: String,
}

impl CardDetails {
    /// Parses an expiry submitted as `MM/YYYY` or `MM/YY`.
    pub fn parse_expiry(raw: &str) -> Option<(u32, i32)> {
        let (month_part, year_part) = raw.trim().split_once('/')?;
        let month: u32 = month_part.trim().parse().ok()?;
        if !(1..=12).contains(&month) {
            return None;
        }

        let year_part = year_part.trim();
        let year: i32 = year_part.parse().ok()?;
        let year = match year_part.len() {
            2 => 2000 + year,
            4 => year,
            _ => return None,
        };

        Some((month, year))
    }

    /// Gateway expiration format: `YYYY-MM`.
    pub fn expiration_date(&self) -> String {
        format!("{:04}-{:02}", self.expiry_year, self.expiry_month)
    }

    /// Last four digits only, safe for logs.
    pub fn masked_number(&self) -> String {
        let digits: String = self.card_number.chars().filter(|c| c.is_ascii_digit()).collect();
        let last_four = if digits.len() >= 4 {
            &digits[digits.len() - 4..]
        } else {
            digits.as_str()
        };
        format!("XXXX{last_four}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BillingAddress {
    pub first_name: String,
    pub last_name: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    #[serde(default)]
    pub country: Option<String>,
}

/// Identifier triple issued by the gateway for a stored customer profile.
/// Immutable for the lifetime of a subscription; the update-payment-profile
/// operation refreshes the stored card data behind the same identifiers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfileReference {
    pub customer_profile_id: String,
    pub payment_profile_id: String,
    pub address_id: String,
}

impl ProfileReference {
    pub fn is_complete(&self) -> bool {
        !self.customer_profile_id.is_empty()
            && !self.payment_profile_id.is_empty()
            && !self.address_id.is_empty()
    }
}

/// Successful authorize-and-capture artifact. Failures are returned as
/// `GatewayError`, never encoded as a success flag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChargeResult {
    pub transaction_id: String,
    pub response_code: String,
    pub auth_code: Option<String>,
    pub avs_result_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubscriptionResult {
    pub subscription_id: String,
}

/// Read-back of a recurring schedule as the gateway currently sees it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduleSnapshot {
    pub name: Option<String>,
    pub status: String,
    pub amount_minor: i64,
    pub interval_months: u32,
    pub start_date: Option<NaiveDate>,
    pub total_occurrences: Option<i32>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum GatewayErrorKind {
    Validation,
    Declined,
    Timing,
    Transient,
    Fatal,
    Unknown,
}

/// Structured classification of a raw gateway failure. Derived from the raw
/// text on every failure, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassifiedError {
    pub code: Option<String>,
    pub kind: GatewayErrorKind,
    pub user_message: String,
    pub technical_details: String,
    pub retryable: bool,
    pub retry_delay_ms: u64,
}

/// Parses a decimal amount string such as `"99.00"` into minor units.
/// Accepts at most two fractional digits.
pub fn parse_amount_minor(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    let (whole, frac) = match raw.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (raw, ""),
    };

    if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if frac.len() > 2 || !frac.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let whole: i64 = whole.parse().ok()?;
    let frac: i64 = if frac.is_empty() {
        0
    } else if frac.len() == 1 {
        frac.parse::<i64>().ok()? * 10
    } else {
        frac.parse().ok()?
    };

    whole.checked_mul(100)?.checked_add(frac)
}

/// Formats minor units back into the gateway's decimal string form.
pub fn format_amount(amount_minor: i64) -> String {
    format!("{}.{:02}", amount_minor / 100, amount_minor % 100)
}
