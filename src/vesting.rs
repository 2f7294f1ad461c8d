use alloy_primitives::U256;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::whitelist::{VestingSchedule, WhitelistEntry};

pub const MAX_PROGRESS_BPS: u32 = 10_000;

/// Vesting position of one allocation at a single instant.
///
/// `vested_amount + locked_amount == total_allocation` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VestingState {
    pub total_allocation: U256,
    pub vested_amount: U256,
    pub claimable_amount: U256,
    pub locked_amount: U256,
    /// Elapsed share of the schedule in basis points, `0..=10_000`.
    pub progress_bps: u32,
    pub cliff_ends_at: Option<u64>,
    pub is_after_cliff: bool,
}

impl VestingState {
    fn unlocked(amount: U256) -> Self {
        VestingState {
            total_allocation: amount,
            vested_amount: amount,
            claimable_amount: amount,
            locked_amount: U256::ZERO,
            progress_bps: MAX_PROGRESS_BPS,
            cliff_ends_at: None,
            is_after_cliff: true,
        }
    }

    /// Progress as a percentage in `[0, 100]`.
    pub fn vesting_progress(&self) -> f64 {
        f64::from(self.progress_bps) / 100.0
    }

    pub fn is_fully_vested(&self) -> bool {
        self.locked_amount.is_zero()
    }

    /// What is still releasable after `already_claimed` has been paid out.
    pub fn releasable(&self, already_claimed: U256) -> U256 {
        self.claimable_amount.saturating_sub(already_claimed)
    }
}

/// Evaluate `entry` at unix time `now`.
///
/// Accrual is linear from `start_time`; nothing is claimable before the cliff
/// ends even though vested tokens keep accruing. A schedule with zero total
/// duration counts as no vesting.
pub fn evaluate(entry: &WhitelistEntry, now: u64) -> VestingState {
    evaluate_amount(entry.amount, entry.vesting, now)
}

pub fn evaluate_amount(amount: U256, vesting: Option<VestingSchedule>, now: u64) -> VestingState {
    match vesting.filter(|schedule| schedule.total_duration > 0) {
        None => VestingState::unlocked(amount),
        Some(schedule) => evaluate_schedule(amount, &schedule, now),
    }
}

pub fn evaluate_at(entry: &WhitelistEntry, now: DateTime<Utc>) -> VestingState {
    evaluate(entry, u64::try_from(now.timestamp()).unwrap_or(0))
}

fn evaluate_schedule(amount: U256, schedule: &VestingSchedule, now: u64) -> VestingState {
    let elapsed = now.saturating_sub(schedule.start_time);
    let total = schedule.total_duration;

    let (vested_amount, progress_bps) = if now <= schedule.start_time {
        (U256::ZERO, 0)
    } else if elapsed >= total {
        (amount, MAX_PROGRESS_BPS)
    } else {
        let bps = u128::from(elapsed) * u128::from(MAX_PROGRESS_BPS) / u128::from(total);
        (mul_div_floor(amount, elapsed, total), bps as u32)
    };

    let cliff_ends_at = schedule.cliff_ends_at();
    let is_after_cliff = now >= cliff_ends_at;

    VestingState {
        total_allocation: amount,
        vested_amount,
        claimable_amount: if is_after_cliff { vested_amount } else { U256::ZERO },
        locked_amount: amount - vested_amount,
        progress_bps,
        cliff_ends_at: Some(cliff_ends_at),
        is_after_cliff,
    }
}

/// `floor(amount * numerator / denominator)` for `numerator < denominator`,
/// without overflowing for any `U256` amount.
fn mul_div_floor(amount: U256, numerator: u64, denominator: u64) -> U256 {
    let numerator = U256::from(numerator);
    let denominator = U256::from(denominator);

    let quotient = amount / denominator;
    let remainder = amount % denominator;

    quotient * numerator + remainder * numerator / denominator
}
