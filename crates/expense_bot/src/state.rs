use std::{collections::HashMap, sync::Arc};

use ledger::{MoneyCents, RecordKey};
use tokio::sync::Mutex;

use crate::transport::ConversationId;

/// Expense waiting for the user's yes/no before it is written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct PendingExpense {
    pub value: MoneyCents,
    pub description: String,
    pub suggested_category: String,
}

/// A record already written as `Other`, waiting for the user to accept the
/// suggested category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct PendingCommit {
    pub key: RecordKey,
    pub suggested_category: String,
}

/// Unresolved confirmation of one conversation. No session means idle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Session {
    AwaitingExpenseConfirmation(PendingExpense),
    AwaitingCategoryConfirmation(PendingCommit),
    AwaitingClearConfirmation,
}

/// Public view of where a conversation stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionKind {
    Idle,
    AwaitingExpenseConfirmation,
    AwaitingCategoryConfirmation,
    AwaitingClearConfirmation,
}

impl From<Option<&Session>> for SessionKind {
    fn from(session: Option<&Session>) -> Self {
        match session {
            None => SessionKind::Idle,
            Some(Session::AwaitingExpenseConfirmation(_)) => {
                SessionKind::AwaitingExpenseConfirmation
            }
            Some(Session::AwaitingCategoryConfirmation(_)) => {
                SessionKind::AwaitingCategoryConfirmation
            }
            Some(Session::AwaitingClearConfirmation) => SessionKind::AwaitingClearConfirmation,
        }
    }
}

pub(crate) type SessionSlot = Arc<Mutex<Option<Session>>>;

/// Sessions keyed by conversation, one lock per conversation.
///
/// Holding a slot's lock for the whole handling of a message serializes the
/// events of that conversation while other conversations proceed.
#[derive(Clone, Default)]
pub(crate) struct SessionStore {
    inner: Arc<Mutex<HashMap<ConversationId, SessionSlot>>>,
}

impl SessionStore {
    pub(crate) async fn slot(&self, conversation: &ConversationId) -> SessionSlot {
        let mut guard = self.inner.lock().await;
        guard
            .entry(conversation.clone())
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone()
    }

    pub(crate) async fn kind(&self, conversation: &ConversationId) -> SessionKind {
        let slot = {
            let guard = self.inner.lock().await;
            guard.get(conversation).cloned()
        };
        let Some(slot) = slot else {
            return SessionKind::Idle;
        };
        let session = slot.lock().await;
        SessionKind::from(session.as_ref())
    }

    /// Drops the slot of an idle conversation nobody else is holding.
    pub(crate) async fn release(&self, conversation: &ConversationId) {
        let mut guard = self.inner.lock().await;
        if guard.get(conversation).is_some_and(idle_and_unused) {
            guard.remove(conversation);
        }
    }

    /// Forgets every pending session. Returns how many were dropped.
    ///
    /// Each slot is emptied under its own lock, so a handler still running
    /// finishes first and later messages of that conversation queue on the
    /// same slot.
    pub(crate) async fn reset_all(&self) -> usize {
        let slots: Vec<SessionSlot> = self.inner.lock().await.values().cloned().collect();

        let mut dropped = 0;
        for slot in &slots {
            if slot.lock().await.take().is_some() {
                dropped += 1;
            }
        }
        drop(slots);

        self.inner.lock().await.retain(|_, slot| !idle_and_unused(slot));
        dropped
    }

    pub(crate) async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}

fn idle_and_unused(slot: &SessionSlot) -> bool {
    Arc::strong_count(slot) == 1 && slot.try_lock().is_ok_and(|s| s.is_none())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_conversation_is_idle() {
        let store = SessionStore::default();
        assert_eq!(store.kind(&"42".into()).await, SessionKind::Idle);
    }

    #[tokio::test]
    async fn slot_is_shared_per_conversation() {
        let store = SessionStore::default();
        let id = ConversationId::from("42");

        *store.slot(&id).await.lock().await = Some(Session::AwaitingClearConfirmation);
        assert_eq!(store.kind(&id).await, SessionKind::AwaitingClearConfirmation);
        assert_eq!(store.kind(&"7".into()).await, SessionKind::Idle);
    }

    #[tokio::test]
    async fn release_keeps_busy_or_pending_slots() {
        let store = SessionStore::default();
        let idle = ConversationId::from("idle");
        let pending = ConversationId::from("pending");

        drop(store.slot(&idle).await);
        *store.slot(&pending).await.lock().await = Some(Session::AwaitingClearConfirmation);

        let held = store.slot(&idle).await;
        store.release(&idle).await;
        assert_eq!(store.len().await, 2);
        drop(held);

        store.release(&idle).await;
        store.release(&pending).await;
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn reset_all_drops_everything() {
        let store = SessionStore::default();
        *store.slot(&"a".into()).await.lock().await = Some(Session::AwaitingClearConfirmation);
        *store.slot(&"b".into()).await.lock().await = Some(Session::AwaitingClearConfirmation);

        assert_eq!(store.reset_all().await, 2);
        assert_eq!(store.kind(&"a".into()).await, SessionKind::Idle);
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn reset_waits_for_a_running_handler_and_keeps_its_slot() {
        let store = SessionStore::default();
        let id = ConversationId::from("a");
        let slot = store.slot(&id).await;
        let mut running = slot.lock().await;

        let resetting = tokio::spawn({
            let store = store.clone();
            async move { store.reset_all().await }
        });
        tokio::task::yield_now().await;

        // A message arriving now must queue behind the running handler.
        assert!(Arc::ptr_eq(&slot, &store.slot(&id).await));

        *running = Some(Session::AwaitingClearConfirmation);
        drop(running);

        assert_eq!(resetting.await.unwrap(), 1);
        assert_eq!(store.kind(&id).await, SessionKind::Idle);
    }
}
