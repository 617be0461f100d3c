//! Request payloads accepted at the service boundary.
//!
//! These are the two write-path payloads the validator screens before any
//! business logic runs. Field types stay permissive (strings, options);
//! the validator, not serde, is responsible for rejecting bad content so
//! that every failure carries a structured reason and severity.

use serde::{Deserialize, Serialize};

/// A request to open a staked commitment.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CommitmentRequest {
    /// Client-generated commitment identifier.
    pub commitment_id: String,

    /// Identifier of the committing user.
    pub user_id: String,

    /// Wallet funding the stake.
    pub wallet_address: String,

    /// Contact address for expiry notices.
    #[serde(default)]
    pub email: Option<String>,

    /// Stake tier name (basic / premium / vip).
    pub tier: String,

    /// Stake amount in tokens, decimal string.
    pub stake_amount: String,

    /// Free-text description of the commitment.
    #[serde(default)]
    pub description: Option<String>,

    /// Optional client metadata, must be a small JSON object.
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// A request to check in against an open commitment.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CheckinRequest {
    /// Client-generated check-in identifier.
    pub checkin_id: String,

    /// Commitment being checked in against.
    pub commitment_id: String,

    /// Identifier of the checking-in user.
    pub user_id: String,

    /// Wallet that owns the commitment.
    pub wallet_address: String,

    /// Reported latitude, decimal degrees.
    pub latitude: f64,

    /// Reported longitude, decimal degrees.
    pub longitude: f64,

    /// Free-text note attached to the check-in.
    #[serde(default)]
    pub note: Option<String>,

    /// Optional client metadata, must be a small JSON object.
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}
