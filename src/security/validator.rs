//! Stateless request validation.
//!
//! Every entry point returns a [`ValidationResult`]; none panic on
//! malformed input. Composite validators run their field checks in a fixed
//! order and short-circuit on the first rejection. Injection matches are
//! logged under the `security_audit` tracing target so incident review can
//! separate them from ordinary bad input.

use std::sync::LazyLock;

use alloy::primitives::Address;
use regex::Regex;
use serde::Serialize;

use crate::security::patterns::{match_sql, match_xss};
use crate::security::requests::{CheckinRequest, CommitmentRequest};

/// How bad a rejection is, for alerting and audit triage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Immutable outcome of a validation call.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub error: Option<String>,
    pub severity: Option<Severity>,
}

impl ValidationResult {
    /// Accepted input.
    pub fn pass() -> Self {
        Self {
            valid: true,
            error: None,
            severity: None,
        }
    }

    /// Rejected input with a structured reason.
    pub fn reject(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            valid: false,
            error: Some(message.into()),
            severity: Some(severity),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

/// Stake tiers and their canonical amounts in tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StakeTier {
    Basic,
    Premium,
    Vip,
}

impl StakeTier {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "basic" => Some(Self::Basic),
            "premium" => Some(Self::Premium),
            "vip" => Some(Self::Vip),
            _ => None,
        }
    }

    /// Canonical stake amount for the tier.
    pub fn expected_stake(self) -> f64 {
        match self {
            Self::Basic => 0.1,
            Self::Premium => 0.25,
            Self::Vip => 0.5,
        }
    }
}

/// Tolerance when comparing a submitted stake to the tier's canonical
/// amount. Covers decimal-string rounding, nothing more.
pub const STAKE_EPSILON: f64 = 1e-3;

/// Absolute ceiling on any stake amount, in tokens.
pub const MAX_STAKE_AMOUNT: f64 = 100.0;

/// Hard gas-price ceiling in wei (500 gwei). Not configurable: callers
/// cannot raise it through any input.
pub const MAX_GAS_PRICE_WEI: u128 = 500_000_000_000;

/// Identifier length bound.
const MAX_ID_LEN: usize = 64;

/// Metadata bounds: serialized size and top-level key count.
const MAX_METADATA_BYTES: usize = 4096;
const MAX_METADATA_KEYS: usize = 32;

static WALLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("invalid wallet pattern"));

static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("invalid identifier pattern"));

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("invalid email pattern")
});

/// Validate a commitment request.
///
/// Check order: identifiers, wallet, email, tier membership, stake amount
/// against the tier, free-text injection screening, metadata shape. The
/// first failing check wins.
pub fn validate_commitment_request(req: &CommitmentRequest) -> ValidationResult {
    let id_checks = [
        ("commitment_id", req.commitment_id.as_str()),
        ("user_id", req.user_id.as_str()),
    ];
    for (field, value) in id_checks {
        let result = validate_identifier(field, value);
        if !result.valid {
            return result;
        }
    }

    let wallet = validate_wallet_address(&req.wallet_address);
    if !wallet.valid {
        return wallet;
    }

    if let Some(email) = &req.email {
        let result = validate_email(email);
        if !result.valid {
            return result;
        }
    }

    if StakeTier::parse(&req.tier).is_none() {
        return ValidationResult::reject(
            format!("unknown stake tier '{}'", req.tier),
            Severity::Medium,
        );
    }

    let stake = validate_stake_amount(&req.stake_amount, &req.tier);
    if !stake.valid {
        return stake;
    }

    if let Some(description) = &req.description {
        let result = screen_free_text("description", description);
        if !result.valid {
            return result;
        }
    }

    validate_metadata(req.metadata.as_ref())
}

/// Validate a check-in request.
pub fn validate_checkin_request(req: &CheckinRequest) -> ValidationResult {
    let id_checks = [
        ("checkin_id", req.checkin_id.as_str()),
        ("commitment_id", req.commitment_id.as_str()),
        ("user_id", req.user_id.as_str()),
    ];
    for (field, value) in id_checks {
        let result = validate_identifier(field, value);
        if !result.valid {
            return result;
        }
    }

    let wallet = validate_wallet_address(&req.wallet_address);
    if !wallet.valid {
        return wallet;
    }

    if !req.latitude.is_finite() || !(-90.0..=90.0).contains(&req.latitude) {
        return ValidationResult::reject(
            format!("latitude {} out of range [-90, 90]", req.latitude),
            Severity::Medium,
        );
    }
    if !req.longitude.is_finite() || !(-180.0..=180.0).contains(&req.longitude) {
        return ValidationResult::reject(
            format!("longitude {} out of range [-180, 180]", req.longitude),
            Severity::Medium,
        );
    }

    if let Some(note) = &req.note {
        let result = screen_free_text("note", note);
        if !result.valid {
            return result;
        }
    }

    validate_metadata(req.metadata.as_ref())
}

/// Validate a wallet address: `0x` + 40 hex characters, zero address
/// rejected.
pub fn validate_wallet_address(address: &str) -> ValidationResult {
    if address.trim().is_empty() {
        return ValidationResult::reject("wallet_address is required", Severity::Medium);
    }
    if !WALLET_RE.is_match(address) {
        return ValidationResult::reject(
            "wallet_address must be 0x followed by 40 hex characters",
            Severity::Medium,
        );
    }
    // Format already checked, so the parse cannot fail; guard anyway.
    match address.parse::<Address>() {
        Ok(parsed) if parsed == Address::ZERO => {
            ValidationResult::reject("wallet_address must not be the zero address", Severity::High)
        }
        Ok(_) => ValidationResult::pass(),
        Err(_) => ValidationResult::reject("wallet_address is not parseable", Severity::Medium),
    }
}

/// Validate a stake amount against a tier's canonical amount.
pub fn validate_stake_amount(amount: &str, tier: &str) -> ValidationResult {
    let Some(tier) = StakeTier::parse(tier) else {
        return ValidationResult::reject(format!("unknown stake tier '{tier}'"), Severity::Medium);
    };

    let parsed: f64 = match amount.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            return ValidationResult::reject(
                format!("stake_amount '{amount}' is not a number"),
                Severity::Medium,
            );
        }
    };

    if parsed.is_nan() || !parsed.is_finite() {
        return ValidationResult::reject("stake_amount must be finite", Severity::Medium);
    }
    if parsed < 0.0 {
        return ValidationResult::reject("stake_amount must not be negative", Severity::Medium);
    }
    if parsed > MAX_STAKE_AMOUNT {
        return ValidationResult::reject(
            format!("stake_amount {parsed} exceeds ceiling {MAX_STAKE_AMOUNT}"),
            Severity::High,
        );
    }

    let expected = tier.expected_stake();
    if (parsed - expected).abs() > STAKE_EPSILON {
        return ValidationResult::reject(
            format!("stake_amount {parsed} does not match tier amount {expected}"),
            Severity::High,
        );
    }

    ValidationResult::pass()
}

/// Validate a gas price in wei against the hard ceiling.
pub fn validate_gas_price(gas_price_wei: &str) -> ValidationResult {
    let parsed: u128 = match gas_price_wei.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            return ValidationResult::reject(
                format!("gas price '{gas_price_wei}' is not a positive integer"),
                Severity::Medium,
            );
        }
    };

    if parsed == 0 {
        return ValidationResult::reject("gas price must be positive", Severity::Medium);
    }
    if parsed > MAX_GAS_PRICE_WEI {
        return ValidationResult::reject(
            format!("gas price {parsed} wei exceeds ceiling {MAX_GAS_PRICE_WEI} wei"),
            Severity::High,
        );
    }

    ValidationResult::pass()
}

fn validate_identifier(field: &str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return ValidationResult::reject(format!("{field} is required"), Severity::Medium);
    }
    if value.len() > MAX_ID_LEN {
        return ValidationResult::reject(
            format!("{field} exceeds {MAX_ID_LEN} characters"),
            Severity::Medium,
        );
    }
    if !IDENTIFIER_RE.is_match(value) {
        // Identifier charset excludes everything injection needs, so a
        // charset failure here doubles as the injection gate for id fields.
        return ValidationResult::reject(
            format!("{field} contains invalid characters"),
            Severity::High,
        );
    }
    ValidationResult::pass()
}

fn validate_email(email: &str) -> ValidationResult {
    if email.len() > 254 || !EMAIL_RE.is_match(email) {
        return ValidationResult::reject("email address is malformed", Severity::Medium);
    }
    ValidationResult::pass()
}

/// Screen one free-text field against both deny-lists.
fn screen_free_text(field: &str, value: &str) -> ValidationResult {
    if let Some(label) = match_sql(value) {
        tracing::warn!(
            target: "security_audit",
            field,
            pattern = label,
            "SQL injection pattern rejected"
        );
        return ValidationResult::reject(
            format!("{field} contains a disallowed pattern"),
            Severity::Critical,
        );
    }
    if let Some(label) = match_xss(value) {
        tracing::warn!(
            target: "security_audit",
            field,
            pattern = label,
            "script injection pattern rejected"
        );
        return ValidationResult::reject(
            format!("{field} contains a disallowed pattern"),
            Severity::High,
        );
    }
    ValidationResult::pass()
}

fn validate_metadata(metadata: Option<&serde_json::Value>) -> ValidationResult {
    let Some(value) = metadata else {
        return ValidationResult::pass();
    };

    let Some(object) = value.as_object() else {
        return ValidationResult::reject("metadata must be a JSON object", Severity::Medium);
    };

    if object.len() > MAX_METADATA_KEYS {
        return ValidationResult::reject(
            format!("metadata exceeds {MAX_METADATA_KEYS} keys"),
            Severity::Medium,
        );
    }

    match serde_json::to_string(value) {
        Ok(serialized) if serialized.len() > MAX_METADATA_BYTES => {
            ValidationResult::reject(
                format!("metadata exceeds {MAX_METADATA_BYTES} bytes"),
                Severity::Medium,
            )
        }
        Ok(_) => {
            for (key, entry) in object {
                let screened = screen_free_text(&format!("metadata.{key}"), key);
                if !screened.valid {
                    return screened;
                }
                if let Some(text) = entry.as_str() {
                    let screened = screen_free_text(&format!("metadata.{key}"), text);
                    if !screened.valid {
                        return screened;
                    }
                }
            }
            ValidationResult::pass()
        }
        Err(_) => ValidationResult::reject("metadata is not serializable", Severity::Critical),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn commitment() -> CommitmentRequest {
        CommitmentRequest {
            commitment_id: "cmt-2024-001".into(),
            user_id: "user_42".into(),
            wallet_address: "0x8ba1f109551bD432803012645Ac136ddd64DBA72".into(),
            email: Some("runner@example.com".into()),
            tier: "VIP".into(),
            stake_amount: "0.5".into(),
            description: Some("Run 5k every morning".into()),
            metadata: Some(json!({"goal": "5k", "streak": 0})),
        }
    }

    fn checkin() -> CheckinRequest {
        CheckinRequest {
            checkin_id: "chk-0001".into(),
            commitment_id: "cmt-2024-001".into(),
            user_id: "user_42".into(),
            wallet_address: "0x8ba1f109551bD432803012645Ac136ddd64DBA72".into(),
            latitude: 52.3702,
            longitude: 4.8952,
            note: Some("Done before sunrise".into()),
            metadata: None,
        }
    }

    #[test]
    fn test_valid_commitment_passes() {
        assert!(validate_commitment_request(&commitment()).is_valid());
    }

    #[test]
    fn test_valid_checkin_passes() {
        assert!(validate_checkin_request(&checkin()).is_valid());
    }

    #[test]
    fn test_missing_required_id_rejected() {
        let mut req = commitment();
        req.user_id = String::new();
        let result = validate_commitment_request(&req);
        assert!(!result.valid);
        assert_eq!(result.severity, Some(Severity::Medium));
    }

    #[test]
    fn test_overlong_id_rejected() {
        let mut req = commitment();
        req.commitment_id = "x".repeat(65);
        assert!(!validate_commitment_request(&req).valid);
    }

    #[test]
    fn test_wallet_address_format() {
        assert!(validate_wallet_address("0x8ba1f109551bD432803012645Ac136ddd64DBA72").is_valid());
        assert!(!validate_wallet_address("8ba1f109551bD432803012645Ac136ddd64DBA72").valid);
        assert!(!validate_wallet_address("0x8ba1").valid);
        assert!(!validate_wallet_address("0xZZZ1f109551bD432803012645Ac136ddd64DBA72").valid);
    }

    #[test]
    fn test_zero_wallet_address_rejected() {
        let result = validate_wallet_address("0x0000000000000000000000000000000000000000");
        assert!(!result.valid);
        assert_eq!(result.severity, Some(Severity::High));
    }

    #[test]
    fn test_bad_email_rejected() {
        let mut req = commitment();
        req.email = Some("not-an-email".into());
        assert!(!validate_commitment_request(&req).valid);
    }

    #[test]
    fn test_unknown_tier_rejected() {
        let mut req = commitment();
        req.tier = "platinum".into();
        let result = validate_commitment_request(&req);
        assert!(!result.valid);
        assert_eq!(result.severity, Some(Severity::Medium));
    }

    #[test]
    fn test_vip_stake_scenario() {
        assert!(validate_stake_amount("0.5", "VIP").is_valid());
        // Within epsilon of the canonical amount.
        assert!(validate_stake_amount("0.5001", "VIP").is_valid());

        let result = validate_stake_amount("0.4", "VIP");
        assert!(!result.valid);
        assert_eq!(result.severity, Some(Severity::High));
    }

    #[test]
    fn test_every_tier_canonical_amount() {
        for (tier, amount) in [("basic", "0.1"), ("premium", "0.25"), ("vip", "0.5")] {
            assert!(validate_stake_amount(amount, tier).is_valid(), "tier {tier}");
            assert!(!validate_stake_amount("99.0", tier).valid, "tier {tier}");
        }
    }

    #[test]
    fn test_stake_rejects_negative_nan_and_ceiling() {
        assert!(!validate_stake_amount("-0.5", "vip").valid);
        assert!(!validate_stake_amount("NaN", "vip").valid);
        assert!(!validate_stake_amount("abc", "vip").valid);
        let result = validate_stake_amount("250", "vip");
        assert!(!result.valid);
        assert_eq!(result.severity, Some(Severity::High));
    }

    #[test]
    fn test_commitment_stake_mismatch_rejected_high() {
        let mut req = commitment();
        req.stake_amount = "0.4".into();
        let result = validate_commitment_request(&req);
        assert!(!result.valid);
        assert_eq!(result.severity, Some(Severity::High));
    }

    #[test]
    fn test_gas_price_bounds() {
        assert!(validate_gas_price("1000000000").is_valid()); // 1 gwei
        assert!(validate_gas_price("500000000000").is_valid()); // exactly the ceiling
        assert!(!validate_gas_price("0").valid);
        assert!(!validate_gas_price("-5").valid);
        assert!(!validate_gas_price("nope").valid);

        let result = validate_gas_price("500000000001");
        assert!(!result.valid);
        assert_eq!(result.severity, Some(Severity::High));
    }

    #[test]
    fn test_sql_injection_in_description_is_critical() {
        let mut req = commitment();
        req.description = Some("nice goal'; DROP TABLE commitments;--".into());
        let result = validate_commitment_request(&req);
        assert!(!result.valid);
        assert_eq!(result.severity, Some(Severity::Critical));

        // Same request with the payload removed is accepted.
        req.description = Some("nice goal".into());
        assert!(validate_commitment_request(&req).is_valid());
    }

    #[test]
    fn test_xss_in_note_is_high() {
        let mut req = checkin();
        req.note = Some("<script>steal()</script>".into());
        let result = validate_checkin_request(&req);
        assert!(!result.valid);
        assert_eq!(result.severity, Some(Severity::High));

        req.note = Some("all clear".into());
        assert!(validate_checkin_request(&req).is_valid());
    }

    #[test]
    fn test_injection_in_metadata_value_rejected() {
        let mut req = commitment();
        req.metadata = Some(json!({"next": "javascript:alert(1)"}));
        let result = validate_commitment_request(&req);
        assert!(!result.valid);
        assert_eq!(result.severity, Some(Severity::High));
    }

    #[test]
    fn test_latitude_longitude_bounds() {
        let mut req = checkin();
        req.latitude = 90.5;
        assert!(!validate_checkin_request(&req).valid);

        let mut req = checkin();
        req.longitude = -180.1;
        assert!(!validate_checkin_request(&req).valid);

        let mut req = checkin();
        req.latitude = f64::NAN;
        assert!(!validate_checkin_request(&req).valid);
    }

    #[test]
    fn test_metadata_shape_limits() {
        let mut req = commitment();
        req.metadata = Some(json!(["not", "an", "object"]));
        assert!(!validate_commitment_request(&req).valid);

        let mut big = serde_json::Map::new();
        for i in 0..33 {
            big.insert(format!("k{i}"), json!(i));
        }
        let mut req = commitment();
        req.metadata = Some(serde_json::Value::Object(big));
        assert!(!validate_commitment_request(&req).valid);

        let mut req = commitment();
        req.metadata = Some(json!({"blob": "x".repeat(5000)}));
        assert!(!validate_commitment_request(&req).valid);
    }
}
