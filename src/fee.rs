//! Fee calculation for lease cancel transactions

use log::info;
use tokio_util::sync::CancellationToken;

use crate::account::Address;
use crate::error::{CancellerError, Result};
use crate::rpc::{NodeApi, NodeError};
use crate::utils::format_amount;

/// Minimal fee of a lease cancel transaction in wavelets
pub const BASE_FEE: u64 = 100_000;

/// Total fee given the account's extra fee
pub fn total_fee(extra_fee: u64) -> Result<u64> {
    BASE_FEE
        .checked_add(extra_fee)
        .ok_or_else(|| CancellerError::OperationFailure(format!("Extra fee {} is out of range", extra_fee)))
}

/// Extra fee the node charges for transactions of `address`
///
/// Non-zero only for accounts with a script attached.
pub async fn fetch_extra_fee<N: NodeApi + ?Sized>(
    node: &N,
    address: &Address,
    cancel: &CancellationToken,
) -> Result<u64> {
    let info = node.script_info(address, cancel).await.map_err(|e| match e {
        NodeError::Cancelled => CancellerError::UserTermination,
        other => CancellerError::NetworkUnavailable(format!(
            "Failed to check extra fee on account '{}': {}",
            address, other
        )),
    })?;

    if info.extra_fee != 0 {
        info!("Extra fee on cancel leasing: {}", format_amount(info.extra_fee));
    } else {
        info!("No extra fee on cancel leasing");
    }
    Ok(info.extra_fee)
}

/// Fee applied to every cancellation of the run
pub async fn resolve_fee<N: NodeApi + ?Sized>(
    node: &N,
    address: &Address,
    cancel: &CancellationToken,
) -> Result<u64> {
    let extra_fee = fetch_extra_fee(node, address, cancel).await?;
    total_fee(extra_fee)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_fee() {
        assert_eq!(total_fee(0).unwrap(), BASE_FEE);
        assert_eq!(total_fee(400_000).unwrap(), 500_000);
        for extra in [1u64, 4_000_000, 123_456_789] {
            assert_eq!(total_fee(extra).unwrap(), BASE_FEE + extra);
        }
    }

    #[test]
    fn test_total_fee_overflow() {
        assert!(matches!(total_fee(u64::MAX), Err(CancellerError::OperationFailure(_))));
    }
}
