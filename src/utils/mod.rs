//! Utility functions for the lease canceller
//!
//! - Amount formatting
//! - Wall-clock timestamps

use chrono::Utc;

/// Decimals of the WAVES token
pub const WAVES_DECIMALS: u32 = 8;

/// Format an amount of wavelets as WAVES with full precision
pub fn format_amount(amount: u64) -> String {
    let unit = 10u64.pow(WAVES_DECIMALS);
    format!(
        "{}.{:0width$} WAVES",
        amount / unit,
        amount % unit,
        width = WAVES_DECIMALS as usize
    )
}

/// Current time in milliseconds since the Unix epoch
pub fn timestamp_millis() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default()
}
