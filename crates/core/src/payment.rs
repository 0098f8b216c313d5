//! Payment evidence recorded when a track moves to `PAID`.
//!
//! Verification belongs to the payment collaborator. This module only fixes
//! the shape of what gets stored alongside the track.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Evidence that a submission was paid for (or deliberately waived).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PaymentProof {
    /// An x402 settlement.
    X402 {
        tx_hash: String,
        network: String,
        payer: String,
    },
    /// Operator-granted free play.
    Complimentary { reason: String },
}

impl PaymentProof {
    /// Every field must be non-blank.
    pub fn validate(&self) -> Result<(), CoreError> {
        let fields = match self {
            Self::X402 {
                tx_hash,
                network,
                payer,
            } => vec![
                ("tx_hash", tx_hash.as_str()),
                ("network", network.as_str()),
                ("payer", payer.as_str()),
            ],
            Self::Complimentary { reason } => vec![("reason", reason.as_str())],
        };

        match fields.into_iter().find(|(_, v)| v.trim().is_empty()) {
            Some((name, _)) => Err(CoreError::Validation(format!(
                "Payment proof field '{name}' must not be empty"
            ))),
            None => Ok(()),
        }
    }

    /// Whether this proof carries real money.
    pub fn is_settlement(&self) -> bool {
        matches!(self, Self::X402 { .. })
    }
}
