//! Byte budgets with RAII allocations.
//!
//! A [`Budget`] holds a fixed amount; an [`Allocation`] draws from it, can grow or
//! shrink, and returns everything it holds when dropped. The block builder charges its
//! in-memory postings against a budget, and the in-memory block store charges the bytes of
//! every stored block.

use std::sync::Arc;

use counter::Counter;

pub mod counter;

/// Represents a budget that can be allocated from.
#[derive(Clone)]
pub struct Budget(Arc<BudgetNode>);

impl Budget {
    /// Creates a new budget with the given amount.
    pub fn new(amount: u64) -> Budget {
        Budget(Arc::new(BudgetNode {
            capacity: amount,
            remaining: Counter::new(amount),
        }))
    }

    /// Total amount the budget was created with.
    pub fn capacity(&self) -> u64 {
        self.0.capacity
    }

    /// Returns the remaining amount in this budget.
    pub fn remaining(&self) -> u64 {
        self.0.remaining.read()
    }

    /// Attempts to allocate the specified amount from the budget.
    ///
    /// The allocated amount is returned to the `Budget` when the `Allocation` is dropped.
    pub fn allocate(&self, amount: u64) -> Result<Allocation, AllocationError> {
        if self.0.remaining.withdraw(amount) {
            Ok(Allocation {
                budget: self.0.clone(),
                amount,
            })
        } else {
            Err(AllocationError {
                requested: amount,
                remaining: self.remaining(),
            })
        }
    }
}

/// Represents an allocation from a budget.
pub struct Allocation {
    budget: Arc<BudgetNode>,
    amount: u64,
}

impl Allocation {
    /// Currently allocated amount.
    pub fn amount(&self) -> u64 {
        self.amount
    }

    /// Grows the allocation by `additional`, or fails without changing anything.
    pub fn grow(&mut self, additional: u64) -> Result<(), AllocationError> {
        if self.budget.remaining.withdraw(additional) {
            self.amount += additional;
            Ok(())
        } else {
            Err(AllocationError {
                requested: additional,
                remaining: self.budget.remaining.read(),
            })
        }
    }

    /// Shrinks the allocation to `amount`, returning the difference to the budget.
    /// Has no effect when `amount` is not smaller than the current amount.
    pub fn shrink_to(&mut self, amount: u64) {
        if amount < self.amount {
            self.budget.remaining.deposit(self.amount - amount);
            self.amount = amount;
        }
    }

    /// Returns the whole allocated amount to the budget, keeping the (empty) allocation.
    pub fn release(&mut self) {
        self.shrink_to(0);
    }
}

impl Drop for Allocation {
    fn drop(&mut self) {
        if self.amount != 0 {
            self.budget.remaining.deposit(self.amount);
        }
    }
}

impl std::fmt::Debug for Allocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Allocation")
            .field("amount", &self.amount)
            .finish_non_exhaustive()
    }
}

/// An error that occurs when a budget allocation fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AllocationError {
    pub requested: u64,
    pub remaining: u64,
}

impl std::fmt::Display for AllocationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Budget allocation error: requested {}, remaining {}",
            self.requested, self.remaining
        )
    }
}

impl std::error::Error for AllocationError {}

impl From<AllocationError> for std::io::Error {
    fn from(e: AllocationError) -> Self {
        std::io::Error::new(std::io::ErrorKind::StorageFull, e)
    }
}

struct BudgetNode {
    capacity: u64,
    remaining: Counter,
}
