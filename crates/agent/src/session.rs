//! Per-session conversation state.
//!
//! A session holds at most one outstanding `PendingAction`. A new
//! utterance that is not a confirmation or cancellation reply replaces it:
//! last utterance wins, nothing queues behind. Sessions are independent;
//! the store lock is held only for the map operation, never across an
//! await.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use porcher_core::{ActionKind, ParameterSet, StageSource};

/// The action a session is waiting to confirm.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingAction {
    pub action: ActionKind,
    pub parameters: ParameterSet,
    pub missing: Vec<String>,
    pub confidence: f64,
    pub source: StageSource,
    pub issued_at: DateTime<Utc>,
}

/// How an utterance relates to an outstanding confirmation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reply {
    Affirm,
    Cancel,
    NewUtterance,
}

/// Classifies a folded utterance as a confirmation reply. Only whole,
/// short replies count; anything longer is a brand-new utterance.
pub fn interpret_reply(folded: &str) -> Reply {
    const AFFIRM: &[&str] = &[
        "oui", "ok", "okay", "d accord", "confirme", "je confirme", "c est bon", "vas y",
        "valide", "exact", "correct",
    ];
    const CANCEL: &[&str] = &[
        "non", "annule", "annuler", "laisse tomber", "stop", "non merci", "pas ca",
    ];

    if AFFIRM.contains(&folded) {
        Reply::Affirm
    } else if CANCEL.contains(&folded) {
        Reply::Cancel
    } else {
        Reply::NewUtterance
    }
}

/// Pending-confirmation slots keyed by session id.
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, PendingAction>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self, session_id: &str) -> Option<PendingAction> {
        self.lock().get(session_id).cloned()
    }

    pub fn set_pending(&self, session_id: &str, pending: PendingAction) {
        self.lock().insert(session_id.to_string(), pending);
    }

    pub fn take_pending(&self, session_id: &str) -> Option<PendingAction> {
        self.lock().remove(session_id)
    }

    pub fn pending_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, PendingAction>> {
        self.sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{interpret_reply, PendingAction, Reply, SessionStore};
    use porcher_core::{fold_text, ActionKind, ParameterSet, StageSource};

    fn pending(action: ActionKind) -> PendingAction {
        PendingAction {
            action,
            parameters: ParameterSet::new(),
            missing: Vec::new(),
            confidence: 0.9,
            source: StageSource::Fallback,
            issued_at: Utc::now(),
        }
    }

    #[test]
    fn short_replies_are_classified() {
        assert_eq!(interpret_reply(&fold_text("Oui")), Reply::Affirm);
        assert_eq!(interpret_reply(&fold_text("d'accord")), Reply::Affirm);
        assert_eq!(interpret_reply(&fold_text("non")), Reply::Cancel);
        assert_eq!(interpret_reply(&fold_text("laisse tomber")), Reply::Cancel);
        assert_eq!(interpret_reply(&fold_text("j ai vendu 5 porcs")), Reply::NewUtterance);
        // A sentence that merely starts like a confirmation is new input.
        assert_eq!(interpret_reply(&fold_text("oui mais pas maintenant")), Reply::NewUtterance);
    }

    #[test]
    fn one_pending_slot_per_session_last_wins() {
        let store = SessionStore::new();
        store.set_pending("s1", pending(ActionKind::CreateRevenu));
        store.set_pending("s1", pending(ActionKind::CreatePesee));

        assert_eq!(store.pending_count(), 1);
        assert_eq!(store.pending("s1").map(|p| p.action), Some(ActionKind::CreatePesee));
    }

    #[test]
    fn sessions_do_not_share_state() {
        let store = SessionStore::new();
        store.set_pending("s1", pending(ActionKind::CreateRevenu));

        assert!(store.pending("s2").is_none());
        assert_eq!(store.take_pending("s1").map(|p| p.action), Some(ActionKind::CreateRevenu));
        assert!(store.pending("s1").is_none());
    }
}
