//! JSON views of a ledger for command output.

use serde::Serialize;

use hive_accrual::{Hive, HiveError, HiveEvent};
use hive_store::LedgerStore;
use hive_types::{Amount, AssetTransfer, Clock, Timestamp};

/// One pool as reported.
#[derive(Debug, Serialize)]
pub struct PoolView {
    pub token: String,
    pub total_staked: Amount,
    pub reward_reserve: Amount,
    /// Aggregate stake-seconds at the report time, in decimal. May exceed
    /// 128 bits for large-supply tokens.
    pub weight: String,
}

/// One stake record as reported.
#[derive(Debug, Serialize)]
pub struct StakeView {
    pub participant: String,
    pub token: String,
    pub amount: Amount,
    pub since: Option<Timestamp>,
    /// What a claim at the report time would pay.
    pub accrued: Amount,
}

/// Outcome of one scenario step.
#[derive(Debug, Serialize)]
pub struct StepView {
    pub index: usize,
    pub at: Timestamp,
    pub step: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Everything `hive run` prints.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub start: Timestamp,
    pub end: Timestamp,
    pub elapsed: String,
    pub steps: Vec<StepView>,
    pub events: Vec<HiveEvent>,
    pub pools: Vec<PoolView>,
    pub stakes: Vec<StakeView>,
    pub snapshot_hash: String,
}

/// Everything `hive inspect` prints.
#[derive(Debug, Serialize)]
pub struct InspectReport {
    pub hash: String,
    pub version: u32,
    pub latest_time: Option<Timestamp>,
    pub at: Timestamp,
    pub pools: Vec<PoolView>,
    pub stakes: Vec<StakeView>,
}

/// Pool and stake views of `hive` at `now`.
pub fn ledger_view<S, C, T>(
    hive: &Hive<S, C, T>,
    now: Timestamp,
) -> Result<(Vec<PoolView>, Vec<StakeView>), HiveError>
where
    S: LedgerStore,
    C: Clock,
    T: AssetTransfer,
{
    let store = hive.store();
    let pools = store
        .pools()
        .into_iter()
        .map(|(token, pool)| -> Result<PoolView, HiveError> {
            let weight = pool.total_weight(now).ok_or_else(|| {
                HiveError::InvalidState(format!("pool weight for {token} undefined at {now}"))
            })?;
            Ok(PoolView {
                token: token.to_string(),
                total_staked: pool.total_staked,
                reward_reserve: pool.reward_reserve,
                weight: weight.to_string(),
            })
        })
        .collect::<Result<Vec<_>, HiveError>>()?;

    let stakes = store
        .stakes()
        .into_iter()
        .map(|(token, participant, stake)| -> Result<StakeView, HiveError> {
            Ok(StakeView {
                participant: participant.to_string(),
                token: token.to_string(),
                amount: stake.amount,
                since: stake.since,
                accrued: hive.accrued_at(&participant, token, now)?,
            })
        })
        .collect::<Result<Vec<_>, HiveError>>()?;

    Ok((pools, stakes))
}

/// Render `value` as JSON, pretty or compact.
pub fn to_json<V: Serialize>(value: &V, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}
