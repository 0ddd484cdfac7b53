//! Single-flight slot for token renewal.
//!
//! At most one renewal is in flight per client. The first request that needs
//! one becomes the leader and starts it; every request that needs one while
//! it is pending subscribes to the same outcome. The slot is emptied before
//! the outcome is published, whichever way it went, so the next 401 after
//! completion can start a fresh cycle.
//!
//! ```text
//! Idle --join()--> Pending --complete(Renewed)--> Idle
//!                          \-complete(Failed)---> Idle
//! ```

use std::sync::{Mutex, PoisonError};

use tokio::sync::watch;

use crate::auth::Session;

/// Result of a renewal, shared by every waiter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// New credentials, already persisted.
    Renewed(Session),
    /// Renewal failed and the session was cleared.
    Failed,
}

pub(crate) type OutcomeReceiver = watch::Receiver<Option<RefreshOutcome>>;
pub(crate) type OutcomeSender = watch::Sender<Option<RefreshOutcome>>;

/// What [`RefreshCoordinator::join`] hands back.
#[derive(Debug)]
pub(crate) enum Ticket {
    /// The caller must run the renewal and pass the sender to `complete`.
    Leader(OutcomeSender, OutcomeReceiver),
    /// A renewal is already pending.
    Follower(OutcomeReceiver),
}

#[derive(Debug, Default)]
pub(crate) struct RefreshCoordinator {
    slot: Mutex<Option<OutcomeReceiver>>,
}

impl RefreshCoordinator {
    /// Subscribes to the pending renewal, or claims the slot if there is none.
    pub(crate) fn join(&self) -> Ticket {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);

        // A closed channel means the leader went away without publishing.
        if let Some(pending) = slot.as_ref().filter(|rx| rx.has_changed().is_ok()) {
            return Ticket::Follower(pending.clone());
        }

        let (tx, rx) = watch::channel(None);
        *slot = Some(rx.clone());
        Ticket::Leader(tx, rx)
    }

    /// Empties the slot and publishes `outcome` to every waiter.
    pub(crate) fn complete(&self, tx: &OutcomeSender, outcome: RefreshOutcome) {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        tx.send_replace(Some(outcome));
    }

    /// Returns `true` while a renewal is pending.
    pub(crate) fn is_pending(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|rx| rx.has_changed().is_ok())
    }
}

/// Waits for the outcome of a renewal.
///
/// A leader that disappears without publishing counts as a failure.
pub(crate) async fn wait(mut rx: OutcomeReceiver) -> RefreshOutcome {
    rx.wait_for(Option::is_some)
        .await
        .ok()
        .and_then(|outcome| (*outcome).clone())
        .unwrap_or(RefreshOutcome::Failed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_join_leads_and_second_follows() {
        let coordinator = RefreshCoordinator::default();

        let first = coordinator.join();
        let second = coordinator.join();

        assert!(matches!(first, Ticket::Leader(..)));
        assert!(matches!(second, Ticket::Follower(_)));
        assert!(coordinator.is_pending());
    }

    #[tokio::test]
    async fn test_all_waiters_see_the_same_outcome() {
        let coordinator = RefreshCoordinator::default();
        let Ticket::Leader(tx, leader_rx) = coordinator.join() else {
            panic!("first join must lead");
        };
        let Ticket::Follower(follower_rx) = coordinator.join() else {
            panic!("second join must follow");
        };

        let renewed = RefreshOutcome::Renewed(Session::new("new"));
        coordinator.complete(&tx, renewed.clone());

        assert_eq!(wait(leader_rx).await, renewed);
        assert_eq!(wait(follower_rx).await, renewed);
    }

    #[test]
    fn test_complete_resets_slot() {
        let coordinator = RefreshCoordinator::default();
        let Ticket::Leader(tx, _rx) = coordinator.join() else {
            panic!("first join must lead");
        };

        coordinator.complete(&tx, RefreshOutcome::Failed);

        assert!(!coordinator.is_pending());
        assert!(matches!(coordinator.join(), Ticket::Leader(..)));
    }

    #[tokio::test]
    async fn test_abandoned_leader_counts_as_failure_and_frees_slot() {
        let coordinator = RefreshCoordinator::default();
        let Ticket::Leader(tx, _rx) = coordinator.join() else {
            panic!("first join must lead");
        };
        let Ticket::Follower(follower_rx) = coordinator.join() else {
            panic!("second join must follow");
        };

        drop(tx);

        assert_eq!(wait(follower_rx).await, RefreshOutcome::Failed);
        assert!(!coordinator.is_pending());
        assert!(matches!(coordinator.join(), Ticket::Leader(..)));
    }
}
