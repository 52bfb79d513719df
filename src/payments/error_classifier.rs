use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use crate::domain::value_objects::payments::{ClassifiedError, GatewayErrorKind};
use crate::payments::error_codes;

/// Prefixed forms are tried before the bare pattern so that surrounding
/// prose ("Error code: E00040 ...") does not shift which token wins.
static CODE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)\bcode\s+([A-Za-z]\d{5})\b").unwrap(),
        Regex::new(r"(?i)\berror\s+code:\s*([A-Za-z]\d{5})\b").unwrap(),
        Regex::new(r"(?i)\b([A-Za-z]\d{5})\b").unwrap(),
    ]
});

/// Extracts an embedded gateway error code, uppercased. Idempotent and
/// case-insensitive.
pub fn extract_code(text: &str) -> Option<String> {
    for pattern in CODE_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(text) {
            if let Some(code) = captures.get(1) {
                return Some(code.as_str().to_uppercase());
            }
        }
    }
    None
}

pub fn is_retryable(code: &str) -> bool {
    error_codes::retry_delay_ms(code).is_some()
}

pub fn retry_delay(code: &str) -> Duration {
    Duration::from_millis(error_codes::retry_delay_ms(code).unwrap_or(0))
}

/// Classifies raw gateway error text into a stable code, an error category,
/// a user-facing message, and a retry hint. Pure: identical input always
/// yields an identical classification.
pub fn classify(text: &str) -> ClassifiedError {
    if let Some(code) = extract_code(text) {
        let (kind, description) = error_codes::CODE_LOOKUP
            .get(code.as_str())
            .copied()
            .unwrap_or((
                GatewayErrorKind::Unknown,
                "The payment could not be completed. Please try again or contact support.",
            ));

        let user_message = error_codes::curated_message(&code)
            .unwrap_or(description)
            .to_string();
        let retry_delay_ms = error_codes::retry_delay_ms(&code).unwrap_or(0);

        return ClassifiedError {
            retryable: retry_delay_ms > 0,
            retry_delay_ms,
            code: Some(code),
            kind,
            user_message,
            technical_details: text.to_string(),
        };
    }

    classify_by_keywords(text)
}

fn classify_by_keywords(text: &str) -> ClassifiedError {
    let lowered = text.to_lowercase();

    let (kind, user_message, retry_delay_ms) = if lowered.contains("insufficient funds") {
        (
            GatewayErrorKind::Declined,
            "Your card was declined due to insufficient funds.",
            0,
        )
    } else if lowered.contains("address") && lowered.contains("mismatch") {
        (
            GatewayErrorKind::Declined,
            "The billing address does not match the one on file with your card issuer.",
            0,
        )
    } else if lowered.contains("expired") {
        (GatewayErrorKind::Declined, "Your card has expired.", 0)
    } else if lowered.contains("invalid card") || lowered.contains("card number is invalid") {
        (GatewayErrorKind::Declined, "The card number is invalid.", 0)
    } else if lowered.contains("declined") {
        (GatewayErrorKind::Declined, "Your card was declined.", 0)
    } else if lowered.contains("record cannot be found") || lowered.contains("record not found") {
        (
            GatewayErrorKind::Timing,
            "We could not finish setting up your subscription. Please try again in a few moments.",
            0,
        )
    } else if lowered.contains("timeout") || lowered.contains("timed out") {
        (
            GatewayErrorKind::Transient,
            "The payment service did not respond in time. Please try again.",
            3_000,
        )
    } else if lowered.contains("maintenance") {
        (
            GatewayErrorKind::Transient,
            "The payment service is undergoing maintenance. Please try again later.",
            30_000,
        )
    } else if lowered.contains("busy") {
        (
            GatewayErrorKind::Transient,
            "The payment service is busy right now. Please try again shortly.",
            5_000,
        )
    } else {
        (
            GatewayErrorKind::Unknown,
            "The payment could not be completed. Please try again or contact support.",
            0,
        )
    };

    ClassifiedError {
        code: None,
        kind,
        user_message: user_message.to_string(),
        technical_details: text.to_string(),
        retryable: retry_delay_ms > 0,
        retry_delay_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_prefixed_code_case_insensitively() {
        assert_eq!(
            extract_code("Code e00040 - the record cannot be found"),
            Some("E00040".to_string())
        );
        assert_eq!(
            extract_code("Error code: e00027. The transaction was unsuccessful."),
            Some("E00027".to_string())
        );
    }

    #[test]
    fn extracts_bare_code() {
        assert_eq!(
            extract_code("gateway returned E00053 while registering"),
            Some("E00053".to_string())
        );
    }

    #[test]
    fn extract_is_idempotent() {
        let first = extract_code("Code e00040 - x").unwrap();
        assert_eq!(extract_code(&first), Some(first.clone()));
        assert_eq!(first, "E00040");
    }

    #[test]
    fn extract_returns_none_without_code() {
        assert_eq!(extract_code("the card was declined"), None);
    }

    #[test]
    fn classifies_known_code_with_curated_message() {
        let classified = classify("E00027: The transaction was unsuccessful.");

        assert_eq!(classified.code.as_deref(), Some("E00027"));
        assert_eq!(classified.kind, GatewayErrorKind::Declined);
        assert!(classified.user_message.contains("declined"));
        assert!(!classified.retryable);
    }

    #[test]
    fn classifies_timing_code() {
        let classified = classify("Error code: E00040. The record cannot be found.");

        assert_eq!(classified.code.as_deref(), Some("E00040"));
        assert_eq!(classified.kind, GatewayErrorKind::Timing);
        assert!(!classified.retryable);
    }

    #[test]
    fn falls_back_to_reference_description_for_uncurated_code() {
        let classified = classify("request failed with E00017");

        assert_eq!(classified.code.as_deref(), Some("E00017"));
        assert_eq!(classified.kind, GatewayErrorKind::Validation);
        assert_eq!(
            classified.user_message,
            "The subscription start date cannot occur in the past."
        );
    }

    #[test]
    fn unknown_code_gets_generic_message() {
        let classified = classify("mystery failure Z99999");

        assert_eq!(classified.code.as_deref(), Some("Z99999"));
        assert_eq!(classified.kind, GatewayErrorKind::Unknown);
        assert!(!classified.retryable);
    }

    #[test]
    fn keyword_fallback_insufficient_funds() {
        let classified = classify("Your card was declined due to insufficient funds");

        assert_eq!(classified.code, None);
        assert_eq!(classified.kind, GatewayErrorKind::Declined);
        assert_eq!(
            classified.user_message,
            "Your card was declined due to insufficient funds."
        );
        assert!(!classified.retryable);
    }

    #[test]
    fn keyword_fallback_record_not_found_is_timing() {
        let classified = classify("the record cannot be found");

        assert_eq!(classified.code, None);
        assert_eq!(classified.kind, GatewayErrorKind::Timing);
    }

    #[test]
    fn keyword_fallback_transient_delays() {
        assert_eq!(classify("connection timed out").retry_delay_ms, 3_000);
        assert_eq!(classify("server too busy").retry_delay_ms, 5_000);
        assert_eq!(
            classify("down for scheduled maintenance").retry_delay_ms,
            30_000
        );
    }

    #[test]
    fn retry_table_matches_spec_delays() {
        assert!(is_retryable("E00001"));
        assert_eq!(retry_delay("E00001"), Duration::from_millis(2_000));
        assert_eq!(retry_delay("E00049"), Duration::from_millis(3_000));
        assert_eq!(retry_delay("E00053"), Duration::from_millis(5_000));
        assert_eq!(retry_delay("E00068"), Duration::from_millis(30_000));

        assert!(!is_retryable("E00027"));
        assert!(!is_retryable("E00040"));
        assert_eq!(retry_delay("E00040"), Duration::ZERO);
    }

    #[test]
    fn classification_is_deterministic() {
        let text = "Code E00053 - server busy";
        assert_eq!(classify(text), classify(text));
    }
}
