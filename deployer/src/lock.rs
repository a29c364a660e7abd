// deployer/src/lock.rs

use chrono::{DateTime, Utc};
use ethers::types::U256;
use eyre::{eyre, Result, WrapErr};

use crate::config::Config;
use crate::units::parse_ether;

/// Constructor argument and attached value for one deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockPlan {
    pub unlock_time: u64,
    pub locked_amount: U256,
}

impl LockPlan {
    pub fn at(now: DateTime<Utc>, config: &Config) -> Result<Self> {
        let unlock_time = unlock_time_at(now, config.unlock_delay_secs)?;
        let locked_amount = parse_ether(&config.locked_amount_eth)
            .wrap_err("LOCKED_AMOUNT_ETH is not a valid ether amount")?;
        Ok(Self { unlock_time, locked_amount })
    }
}

/// Current time rounded to the nearest second (halves round up), plus `delay_secs`.
pub fn unlock_time_at(now: DateTime<Utc>, delay_secs: i64) -> Result<u64> {
    let now_secs = (now.timestamp_millis() + 500).div_euclid(1000);
    let unlock = now_secs
        .checked_add(delay_secs)
        .ok_or_else(|| eyre!("Unlock time overflows: {} + {}", now_secs, delay_secs))?;
    u64::try_from(unlock).map_err(|_| eyre!("Unlock time {} lies before the Unix epoch", unlock))
}
