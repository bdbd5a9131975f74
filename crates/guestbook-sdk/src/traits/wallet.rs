//! Wallet provider boundary

use crate::error::{CallResult, GuestbookError, Result};
use alloy_primitives::Address;
use async_trait::async_trait;
use std::str::FromStr;

/// Browser-injected wallet (EIP-1193 provider).
///
/// Signing happens inside the streams adapter the wallet is bound to; the
/// orchestrator only needs the account list.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Ask the wallet for its accounts, prompting the user if needed
    async fn request_addresses(&self) -> CallResult<Vec<String>>;
}

/// Parse and normalize an account address.
///
/// All-lowercase and all-uppercase hex is accepted as is. Mixed-case input
/// must carry a valid EIP-55 checksum.
pub fn normalize_address(raw: &str) -> Result<Address> {
    let trimmed = raw.trim();
    let hex = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or_else(|| GuestbookError::Validation(format!("address {} lacks 0x prefix", trimmed)))?;

    let has_lower = hex.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = hex.chars().any(|c| c.is_ascii_uppercase());

    if has_lower && has_upper {
        let prefixed = format!("0x{}", hex);
        Address::parse_checksummed(&prefixed, None)
            .map_err(|e| GuestbookError::Validation(format!("invalid address {}: {}", trimmed, e)))
    } else {
        Address::from_str(hex)
            .map_err(|e| GuestbookError::Validation(format!("invalid address {}: {}", trimmed, e)))
    }
}
