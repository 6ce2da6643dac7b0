//! Scenario files: initial balances plus a timed list of ledger calls,
//! replayed against an in-memory hive.
//!
//! ```toml
//! start = 1700000000
//!
//! [[balances]]
//! account = "0x01"
//! amount = "10 ether"
//!
//! [[steps]]
//! action = "deposit"
//! caller = "0x01"
//! amount = "1"
//!
//! [[steps]]
//! action = "advance"
//! secs = 604800
//! ```
//!
//! Tokens default to `native`. Amounts are strings so that values beyond
//! TOML's 64-bit integers can be written.

use std::fmt;
use std::path::Path;

use serde::Deserialize;

use hive_accrual::{Hive, HiveError};
use hive_nullables::{NullClock, NullTransfer};
use hive_store::LedgerSnapshot;
use hive_types::{Address, Amount, Timestamp, TokenId};
use hive_utils::format_duration;

use crate::error::CliError;
use crate::report::{ledger_view, RunReport, StepView};

#[derive(Debug, Deserialize)]
pub struct Scenario {
    /// Clock value at the first step. Falls back to the configured start.
    #[serde(default)]
    pub start: Option<u64>,
    #[serde(default)]
    pub balances: Vec<BalanceSpec>,
    #[serde(default)]
    pub steps: Vec<StepSpec>,
}

/// An outside balance the transfer primitive starts with.
#[derive(Debug, Deserialize)]
pub struct BalanceSpec {
    pub account: String,
    #[serde(default = "native")]
    pub token: String,
    pub amount: String,
}

/// One step as written in the file.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum StepSpec {
    Deposit {
        caller: String,
        #[serde(default = "native")]
        token: String,
        amount: String,
    },
    Withdraw {
        caller: String,
        #[serde(default = "native")]
        token: String,
        amount: String,
    },
    Claim {
        caller: String,
        #[serde(default = "native")]
        token: String,
    },
    Fund {
        caller: String,
        #[serde(default = "native")]
        token: String,
        amount: String,
    },
    Advance {
        secs: u64,
    },
}

fn native() -> String {
    "native".to_string()
}

/// A step with every field parsed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Deposit {
        caller: Address,
        token: TokenId,
        amount: Amount,
    },
    Withdraw {
        caller: Address,
        token: TokenId,
        amount: Amount,
    },
    Claim {
        caller: Address,
        token: TokenId,
    },
    Fund {
        caller: Address,
        token: TokenId,
        amount: Amount,
    },
    Advance {
        secs: u64,
    },
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deposit {
                caller,
                token,
                amount,
            } => write!(f, "deposit {amount} {token} from {caller}"),
            Self::Withdraw {
                caller,
                token,
                amount,
            } => write!(f, "withdraw {amount} {token} to {caller}"),
            Self::Claim { caller, token } => write!(f, "claim {token} to {caller}"),
            Self::Fund {
                caller,
                token,
                amount,
            } => write!(f, "fund {amount} {token} from {caller}"),
            Self::Advance { secs } => write!(f, "advance {}", format_duration(*secs)),
        }
    }
}

fn field<T>(place: &str, index: usize, name: &str, value: &str) -> Result<T, CliError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    value
        .parse()
        .map_err(|e| CliError::Scenario(format!("{place} {index}: bad {name} {value:?}: {e}")))
}

impl StepSpec {
    pub fn resolve(&self, index: usize) -> Result<Step, CliError> {
        Ok(match self {
            Self::Deposit {
                caller,
                token,
                amount,
            } => Step::Deposit {
                caller: field("step", index, "caller", caller)?,
                token: field("step", index, "token", token)?,
                amount: field("step", index, "amount", amount)?,
            },
            Self::Withdraw {
                caller,
                token,
                amount,
            } => Step::Withdraw {
                caller: field("step", index, "caller", caller)?,
                token: field("step", index, "token", token)?,
                amount: field("step", index, "amount", amount)?,
            },
            Self::Claim { caller, token } => Step::Claim {
                caller: field("step", index, "caller", caller)?,
                token: field("step", index, "token", token)?,
            },
            Self::Fund {
                caller,
                token,
                amount,
            } => Step::Fund {
                caller: field("step", index, "caller", caller)?,
                token: field("step", index, "token", token)?,
                amount: field("step", index, "amount", amount)?,
            },
            Self::Advance { secs } => Step::Advance { secs: *secs },
        })
    }
}

/// A finished run: the report to print and the final ledger state.
#[derive(Debug)]
pub struct RunOutcome {
    pub report: RunReport,
    pub snapshot: LedgerSnapshot,
}

impl Scenario {
    pub fn from_toml_file(path: &Path) -> Result<Self, CliError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CliError::Scenario(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, CliError> {
        toml::from_str(s).map_err(|e| CliError::Scenario(e.to_string()))
    }

    /// Parse every step up front so a malformed file fails before any call.
    pub fn resolved_steps(&self) -> Result<Vec<Step>, CliError> {
        self.steps
            .iter()
            .enumerate()
            .map(|(i, spec)| spec.resolve(i))
            .collect()
    }

    /// Replay the scenario. Rejected calls are reported and the run
    /// continues; only malformed input or a broken ledger aborts it.
    pub fn run(&self, default_start: u64) -> Result<RunOutcome, CliError> {
        let steps = self.resolved_steps()?;
        let start = self.start.unwrap_or(default_start);

        let clock = NullClock::new(start);
        let transfer = NullTransfer::new();
        for (i, balance) in self.balances.iter().enumerate() {
            let account: Address = field("balance", i, "account", &balance.account)?;
            let token: TokenId = field("balance", i, "token", &balance.token)?;
            let amount: Amount = field("balance", i, "amount", &balance.amount)?;
            transfer.credit(account, token, amount);
        }

        let mut hive = Hive::in_memory(&clock, &transfer);
        let mut views = Vec::with_capacity(steps.len());

        for (index, step) in steps.iter().enumerate() {
            let result = apply(&mut hive, &clock, step);
            let (ok, detail) = match result {
                Ok(detail) => (true, detail),
                Err(e) => {
                    tracing::info!(index, %step, error = %e, "scenario step rejected");
                    (false, Some(e.to_string()))
                }
            };
            views.push(StepView {
                index,
                at: clock.now(),
                step: step.to_string(),
                ok,
                detail,
            });
        }

        let end = clock.now();
        let (pools, stakes) =
            ledger_view(&hive, end).map_err(|e| CliError::Scenario(e.to_string()))?;
        let snapshot = hive.snapshot();
        let report = RunReport {
            start: Timestamp::new(start),
            end,
            elapsed: format_duration(Timestamp::new(start).elapsed_since(end)),
            steps: views,
            events: hive.events().to_vec(),
            pools,
            stakes,
            snapshot_hash: snapshot.hash_hex(),
        };
        tracing::debug!(steps = report.steps.len(), hash = %report.snapshot_hash, "scenario finished");
        Ok(RunOutcome { report, snapshot })
    }
}

fn apply(
    hive: &mut Hive<hive_store::MemoryStore, &NullClock, &NullTransfer>,
    clock: &NullClock,
    step: &Step,
) -> Result<Option<String>, HiveError> {
    match *step {
        Step::Deposit {
            caller,
            token,
            amount,
        } => hive.deposit(caller, token, amount).map(|_| None),
        Step::Withdraw {
            caller,
            token,
            amount,
        } => hive.withdraw(caller, token, amount).map(|payout| {
            Some(format!(
                "paid {} principal + {} accrual",
                payout.principal, payout.accrual
            ))
        }),
        Step::Claim { caller, token } => hive
            .claim(caller, token)
            .map(|accrual| Some(format!("paid {accrual} accrual"))),
        Step::Fund {
            caller,
            token,
            amount,
        } => hive.fund(caller, token, amount).map(|_| None),
        Step::Advance { secs } => {
            clock.advance(secs);
            Ok(None)
        }
    }
}
