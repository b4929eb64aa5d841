//! Session quota enforcement.
//!
//! A request is admitted only if its units fit in what is left of the
//! limit, counting units already reserved by other in-flight requests.
//! Admission reserves the units; [`QuotaPermit::commit`] charges the ones
//! that completed and releases the rest. A permit dropped without commit
//! releases everything it reserved.

use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};

/// Snapshot of quota usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuotaState {
    pub used: u32,
    pub limit: u32,
}

impl QuotaState {
    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.used)
    }
}

#[derive(Debug, Default)]
struct Counters {
    used: u32,
    pending: u32,
}

/// Process-lifetime analysis allowance shared by all requests.
#[derive(Debug)]
pub struct QuotaGuard {
    limit: u32,
    counters: Mutex<Counters>,
}

/// Outcome of [`QuotaGuard::admit`].
#[derive(Debug)]
pub enum Admission {
    Admitted(QuotaPermit),
    Rejected { remaining: u32 },
}

impl QuotaGuard {
    pub fn new(limit: u32) -> Arc<Self> {
        Arc::new(Self {
            limit,
            counters: Mutex::new(Counters::default()),
        })
    }

    /// Guard that starts with `used` units already charged.
    pub fn with_used(limit: u32, used: u32) -> Arc<Self> {
        Arc::new(Self {
            limit,
            counters: Mutex::new(Counters {
                used: used.min(limit),
                pending: 0,
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Counters> {
        // Counters stay consistent across a poisoned lock
        self.counters.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Reserve `units`, or report how many are still available.
    pub fn admit(self: &Arc<Self>, units: u32) -> Admission {
        let mut c = self.lock();
        let remaining = self.limit.saturating_sub(c.used + c.pending);
        if units > remaining {
            tracing::info!(
                requested = units,
                remaining,
                used = c.used,
                limit = self.limit,
                "Quota rejected request"
            );
            return Admission::Rejected { remaining };
        }

        c.pending += units;
        tracing::debug!(units, used = c.used, pending = c.pending, "Quota admitted request");
        Admission::Admitted(QuotaPermit {
            guard: Arc::clone(self),
            units,
            settled: false,
        })
    }

    pub fn state(&self) -> QuotaState {
        let c = self.lock();
        QuotaState {
            used: c.used,
            limit: self.limit,
        }
    }

    /// Units not yet charged or reserved.
    pub fn remaining(&self) -> u32 {
        let c = self.lock();
        self.limit.saturating_sub(c.used + c.pending)
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    fn settle(&self, reserved: u32, completed: u32) {
        let mut c = self.lock();
        c.pending = c.pending.saturating_sub(reserved);
        c.used += completed.min(reserved);
    }
}

/// Units reserved for one admitted request.
#[derive(Debug)]
#[must_use = "a permit releases its units when dropped"]
pub struct QuotaPermit {
    guard: Arc<QuotaGuard>,
    units: u32,
    settled: bool,
}

impl QuotaPermit {
    pub fn units(&self) -> u32 {
        self.units
    }

    /// Charge `completed` units (at most the reserved amount) and release the rest.
    pub fn commit(mut self, completed: u32) {
        self.guard.settle(self.units, completed);
        self.settled = true;
        tracing::debug!(
            charged = completed.min(self.units),
            reserved = self.units,
            "Quota committed"
        );
    }
}

impl Drop for QuotaPermit {
    fn drop(&mut self) {
        if !self.settled {
            self.guard.settle(self.units, 0);
        }
    }
}
