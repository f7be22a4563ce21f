//! The process-wide spendable balance that gates execution.

/// Signed ledger. Worker and tool costs are debited all-or-nothing before a
/// step is judged successful; rewards and penalties are settled exactly
/// once per job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Treasury {
    balance: i64,
}

impl Treasury {
    pub fn new(balance: i64) -> Self {
        Self { balance }
    }

    pub fn balance(&self) -> i64 {
        self.balance
    }

    /// Debit a step cost. Fails without mutating when funds are
    /// insufficient, so an aborted step never leaves a partial debit.
    pub fn try_debit(&mut self, amount: i64) -> bool {
        if self.balance < amount {
            return false;
        }
        self.balance -= amount;
        true
    }

    /// Credit a job reward.
    pub fn credit(&mut self, amount: i64) {
        self.balance += amount;
    }

    /// Apply a job penalty. Penalties always land, even if they push the
    /// balance negative.
    pub fn penalize(&mut self, amount: i64) {
        self.balance -= amount;
    }
}
