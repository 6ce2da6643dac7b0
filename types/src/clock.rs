//! Clock seam: the ledger asks an injected clock for "now" once per call.

use crate::time::Timestamp;

/// Source of the current time for ledger calls.
pub trait Clock {
    fn now(&self) -> Timestamp;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}
