use std::sync::atomic::{AtomicU64, Ordering};

/// A thread-safe counter that consumers withdraw from (if possible) and deposit into,
/// keeping the value non-negative.
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new(amount: u64) -> Counter {
        Counter(AtomicU64::new(amount))
    }

    /// Attempts to withdraw `amount` from the counter.
    ///
    /// Returns `false` and leaves the counter unchanged when the current value is
    /// smaller than `amount`.
    pub fn withdraw(&self, amount: u64) -> bool {
        let mut current = self.0.load(Ordering::Relaxed);
        while current >= amount {
            match self.0.compare_exchange_weak(
                current,
                current - amount,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return true,
                Err(updated) => current = updated,
            }
        }
        false
    }

    pub fn deposit(&self, amount: u64) {
        self.0.fetch_add(amount, Ordering::Release);
    }

    /// Returns the counter value (possibly stale by the time the caller observes it).
    pub fn read(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_withdraw() {
        let counter = Counter::new(100);
        assert!(counter.withdraw(30));
        assert!(counter.withdraw(0));
        assert_eq!(counter.read(), 70);
        assert!(!counter.withdraw(71));
        assert_eq!(counter.read(), 70);
        assert!(counter.withdraw(70));
        assert_eq!(counter.read(), 0);
    }

    #[test]
    fn test_deposit() {
        let counter = Counter::new(10);
        counter.deposit(5);
        counter.deposit(0);
        assert_eq!(counter.read(), 15);
    }

    #[test]
    fn test_concurrent_withdraw() {
        let counter = Arc::new(Counter::new(1000));
        let handles = (0..10)
            .map(|_| {
                let counter = counter.clone();
                std::thread::spawn(move || {
                    let mut withdrawn = 0;
                    for _ in 0..20 {
                        if counter.withdraw(10) {
                            withdrawn += 10;
                        }
                    }
                    withdrawn
                })
            })
            .collect::<Vec<_>>();

        let total: u64 = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(total, 1000);
        assert_eq!(counter.read(), 0);
    }
}
