// deployer/src/units.rs

use ethers::types::U256;
use ethers::utils::{format_units, parse_units};
use eyre::{eyre, Result};

const ETHER_DECIMALS: usize = 18;

/// Parses a decimal ether amount (e.g. `"0.001"`) into wei.
pub fn parse_ether(amount: &str) -> Result<U256> {
    let amount = amount.trim();
    if amount.is_empty() {
        return Err(eyre!("Ether amount is empty"));
    }
    if amount.starts_with('-') {
        return Err(eyre!("Ether amount must not be negative: {}", amount));
    }
    // parse_units truncates excess decimals and skips `_`, so check the shape first.
    let (whole, fraction) = amount.split_once('.').unwrap_or((amount, ""));
    let digits_only = |part: &str| part.chars().all(|c| c.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !digits_only(whole) || !digits_only(fraction) {
        return Err(eyre!("Invalid ether amount {:?}: expected digits with at most one '.'", amount));
    }
    if fraction.len() > ETHER_DECIMALS {
        return Err(eyre!(
            "Invalid ether amount {:?}: more than {} decimal places",
            amount,
            ETHER_DECIMALS
        ));
    }
    let canonical = format!(
        "{}.{}",
        if whole.is_empty() { "0" } else { whole },
        if fraction.is_empty() { "0" } else { fraction }
    );
    let wei: U256 = parse_units(canonical, "ether")
        .map_err(|e| eyre!("Invalid ether amount {:?}: {}", amount, e))?
        .into();
    Ok(wei)
}

/// Formats wei as ether, dropping trailing fractional zeros but keeping one
/// fractional digit: `10^15` -> `"0.001"`, `10^18` -> `"1.0"`.
pub fn format_ether(wei: U256) -> Result<String> {
    let full = format_units(wei, "ether").map_err(|e| eyre!("Failed to format units: {}", e))?;
    Ok(compact_decimal(&full))
}

fn compact_decimal(full: &str) -> String {
    match full.split_once('.') {
        Some((whole, fraction)) => {
            let fraction = fraction.trim_end_matches('0');
            if fraction.is_empty() {
                format!("{}.0", whole)
            } else {
                format!("{}.{}", whole, fraction)
            }
        }
        None => format!("{}.0", full),
    }
}
