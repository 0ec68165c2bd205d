use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use crate::error::DexError;

type Outcome<T> = Result<T, DexError>;
type OutcomeSender<T> = watch::Sender<Option<Outcome<T>>>;
type OutcomeReceiver<T> = watch::Receiver<Option<Outcome<T>>>;

enum Slot<T> {
    Empty,
    InFlight(OutcomeReceiver<T>),
    Ready(T),
}

enum Role<T> {
    Leader(OutcomeSender<T>),
    Waiter(OutcomeReceiver<T>),
}

/// A lazily loaded value with at most one load running at a time.
///
/// Callers that arrive while a load is running wait for it and receive its
/// outcome, failure included. A failed load leaves the slot empty, so the next
/// caller starts a fresh one. A successful value is kept for good.
pub(crate) struct SingleFlight<T> {
    slot: Mutex<Slot<T>>,
}

impl<T> SingleFlight<T> {
    pub(crate) fn new() -> Self {
        Self {
            slot: Mutex::new(Slot::Empty),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn is_ready(&self) -> bool {
        matches!(&*self.lock(), Slot::Ready(_))
    }

    pub(crate) fn is_in_flight(&self) -> bool {
        matches!(&*self.lock(), Slot::InFlight(_))
    }
}

impl<T: Clone> SingleFlight<T> {
    pub(crate) fn get(&self) -> Option<T> {
        match &*self.lock() {
            Slot::Ready(value) => Some(value.clone()),
            _ => None,
        }
    }

    pub(crate) async fn get_or_load<F, Fut>(&self, load: F) -> Outcome<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Outcome<T>>,
    {
        loop {
            let role = {
                let mut slot = self.lock();
                match &*slot {
                    Slot::Ready(value) => return Ok(value.clone()),
                    Slot::InFlight(rx) => Role::Waiter(rx.clone()),
                    Slot::Empty => {
                        let (tx, rx) = watch::channel(None);
                        *slot = Slot::InFlight(rx);
                        Role::Leader(tx)
                    }
                }
            };

            match role {
                Role::Leader(tx) => {
                    let guard = LeaderGuard {
                        flight: self,
                        tx,
                        finished: false,
                    };
                    let outcome = load().await;
                    guard.finish(&outcome);
                    return outcome;
                }
                Role::Waiter(mut rx) => {
                    let seen = rx
                        .wait_for(Option::is_some)
                        .await
                        .map(|seen| (*seen).clone());
                    if let Ok(Some(outcome)) = seen {
                        return outcome;
                    }
                    // The leader was dropped mid-load and reset the slot.
                }
            }
        }
    }
}

/// Owned by the caller running the load. Dropping it unfinished (the caller was
/// cancelled) empties the slot before the sender closes, so waiters wake up to
/// an empty slot and one of them takes over.
struct LeaderGuard<'a, T> {
    flight: &'a SingleFlight<T>,
    tx: OutcomeSender<T>,
    finished: bool,
}

impl<T: Clone> LeaderGuard<'_, T> {
    fn finish(mut self, outcome: &Outcome<T>) {
        // Publish before releasing the slot so late waiters still see it.
        self.tx.send_replace(Some(outcome.clone()));
        *self.flight.lock() = match outcome {
            Ok(value) => Slot::Ready(value.clone()),
            Err(_) => Slot::Empty,
        };
        self.finished = true;
    }
}

impl<T> Drop for LeaderGuard<'_, T> {
    fn drop(&mut self) {
        if !self.finished {
            *self.flight.lock() = Slot::Empty;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use assert_matches::assert_matches;

    use super::*;
    use crate::domain::ResourceKind;

    #[tokio::test]
    async fn waiters_share_a_failed_load() {
        let flight: SingleFlight<u32> = SingleFlight::new();
        let loads = AtomicUsize::new(0);
        let counter = &loads;
        let load = move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Err(DexError::remote(ResourceKind::Entry, "status 503: unavailable"))
        };

        let (a, b) = tokio::join!(flight.get_or_load(load), flight.get_or_load(load));

        assert_matches!(a, Err(DexError::RemoteFetchFailed { .. }));
        assert_matches!(b, Err(DexError::RemoteFetchFailed { .. }));
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(!flight.is_in_flight());
        assert_eq!(flight.get(), None);

        let value = flight.get_or_load(|| async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);
        assert!(flight.is_ready());
    }

    #[tokio::test]
    async fn cancelled_load_empties_the_slot() {
        let flight: SingleFlight<u32> = SingleFlight::new();
        let abandoned = tokio::time::timeout(
            Duration::from_millis(10),
            flight.get_or_load(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(1)
            }),
        )
        .await;
        assert!(abandoned.is_err());
        assert!(!flight.is_in_flight());

        let value = flight.get_or_load(|| async { Ok(2) }).await.unwrap();
        assert_eq!(value, 2);
    }
}
