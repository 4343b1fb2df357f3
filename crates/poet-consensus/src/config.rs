//! PoET protocol settings read from on-chain state

use crate::ports::StateView;
use serde::Deserialize;
use std::str::FromStr;
use tracing::warn;

/// On-chain setting key prefix.
pub const SETTING_PREFIX: &str = "sawtooth.poet";

/// Protocol parameters as of one state root.
///
/// Missing or invalid on-chain values fall back to the defaults.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PoetSettings {
    /// Blocks a newly registered validator waits before claiming (C policy)
    pub block_claim_delay: u64,

    /// Local mean at the start of the bootstrap period, in seconds
    pub initial_wait_time: f64,

    /// Blocks one PoET key may claim before re-registration (K policy)
    pub key_block_claim_limit: u64,

    /// Floor of every wait timer duration, in seconds
    pub minimum_wait_time: f64,

    /// Size of the population sample window
    pub population_estimate_sample_size: usize,

    /// Blocks a registration may lag behind the head it was created on
    pub signup_commit_maximum_delay: u64,

    /// Desired mean time between blocks, in seconds
    pub target_wait_time: f64,

    /// Z-score above which a validator is winning too often (Z policy)
    pub ztest_maximum_win_deviation: f64,

    /// Wins a validator may accumulate before the Z-test applies
    pub ztest_minimum_win_count: u64,
}

impl Default for PoetSettings {
    fn default() -> Self {
        Self {
            block_claim_delay: 1,
            initial_wait_time: 3000.0,
            key_block_claim_limit: 250,
            minimum_wait_time: 1.0,
            population_estimate_sample_size: 50,
            signup_commit_maximum_delay: 0,
            target_wait_time: 20.0,
            ztest_maximum_win_deviation: 3.075,
            ztest_minimum_win_count: 3,
        }
    }
}

fn finite_positive(value: &f64) -> bool {
    value.is_finite() && *value > 0.0
}

impl PoetSettings {
    /// Read every setting from `view`.
    pub fn from_state_view(view: &dyn StateView) -> Self {
        let defaults = Self::default();
        Self {
            block_claim_delay: read_setting(
                view,
                "block_claim_delay",
                defaults.block_claim_delay,
                |_| true,
            ),
            initial_wait_time: read_setting(
                view,
                "initial_wait_time",
                defaults.initial_wait_time,
                |value: &f64| value.is_finite() && *value >= 0.0,
            ),
            key_block_claim_limit: read_setting(
                view,
                "key_block_claim_limit",
                defaults.key_block_claim_limit,
                |value| *value > 0,
            ),
            minimum_wait_time: read_setting(
                view,
                "minimum_wait_time",
                defaults.minimum_wait_time,
                finite_positive,
            ),
            population_estimate_sample_size: read_setting(
                view,
                "population_estimate_sample_size",
                defaults.population_estimate_sample_size,
                |value| *value > 0,
            ),
            signup_commit_maximum_delay: read_setting(
                view,
                "signup_commit_maximum_delay",
                defaults.signup_commit_maximum_delay,
                |_| true,
            ),
            target_wait_time: read_setting(
                view,
                "target_wait_time",
                defaults.target_wait_time,
                finite_positive,
            ),
            ztest_maximum_win_deviation: read_setting(
                view,
                "ztest_maximum_win_deviation",
                defaults.ztest_maximum_win_deviation,
                finite_positive,
            ),
            ztest_minimum_win_count: read_setting(
                view,
                "ztest_minimum_win_count",
                defaults.ztest_minimum_win_count,
                |_| true,
            ),
        }
    }
}

fn read_setting<T>(
    view: &dyn StateView,
    name: &str,
    default: T,
    is_valid: impl Fn(&T) -> bool,
) -> T
where
    T: FromStr + Copy + std::fmt::Debug,
{
    let key = format!("{SETTING_PREFIX}.{name}");
    let Some(raw) = view.get_setting(&key) else {
        return default;
    };
    match raw.trim().parse::<T>() {
        Ok(value) if is_valid(&value) => value,
        _ => {
            warn!(setting = %key, value = %raw, ?default, "Invalid setting, using default");
            default
        }
    }
}
