//! Ledger events: one per committed call.

use hive_types::{Address, Amount, ParticipantId, Timestamp, TokenId};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HiveEvent {
    Deposited {
        participant: ParticipantId,
        token: TokenId,
        amount: Amount,
        /// The stake's weighting anchor after the deposit.
        since: Option<Timestamp>,
        at: Timestamp,
    },
    Withdrawn {
        participant: ParticipantId,
        token: TokenId,
        principal: Amount,
        accrual: Amount,
        at: Timestamp,
    },
    Claimed {
        participant: ParticipantId,
        token: TokenId,
        accrual: Amount,
        at: Timestamp,
    },
    Funded {
        funder: Address,
        token: TokenId,
        amount: Amount,
        at: Timestamp,
    },
}

impl HiveEvent {
    pub fn token(&self) -> TokenId {
        match self {
            Self::Deposited { token, .. }
            | Self::Withdrawn { token, .. }
            | Self::Claimed { token, .. }
            | Self::Funded { token, .. } => *token,
        }
    }

    pub fn at(&self) -> Timestamp {
        match self {
            Self::Deposited { at, .. }
            | Self::Withdrawn { at, .. }
            | Self::Claimed { at, .. }
            | Self::Funded { at, .. } => *at,
        }
    }
}
