//! The live status of one narrative thread.

use serde::{Deserialize, Serialize};

use crate::story::NarrativeThread;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadStatus {
    Active,
    Advancing,
    Stalled,
    Resolved,
    Spawned,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrativeThreadState {
    pub thread: NarrativeThread,
    pub status: ThreadStatus,
    pub tension: u8,
    pub notes: String,
}

impl NarrativeThreadState {
    pub fn new(thread: NarrativeThread, status: ThreadStatus, tension: u8, notes: impl Into<String>) -> Self {
        Self {
            thread,
            status,
            tension: tension.clamp(1, 10),
            notes: notes.into(),
        }
    }

    /// Applies an update produced by "advance thread states", enforcing the
    /// invariant that `resolved` is absorbing: once a thread is `resolved`
    /// it can never be demoted back to any other status, even if the LLM's
    /// update tries to (SPEC_FULL.md §4.7 step 2 / §8).
    pub fn apply_update(&mut self, new_status: ThreadStatus, new_tension: u8, new_notes: impl Into<String>) {
        if self.status == ThreadStatus::Resolved {
            // Absorbing: tension/notes may still be refreshed, status cannot.
            self.tension = new_tension.clamp(1, 10);
            self.notes = new_notes.into();
            return;
        }
        self.status = new_status;
        self.tension = new_tension.clamp(1, 10);
        self.notes = new_notes.into();
    }

    /// Forces a status directly (used by the director's `choose_thread`),
    /// bumping tension by 2 (clamped to 10) when forcing to `advancing`,
    /// per SPEC_FULL.md §4.10. `resolved` is still absorbing even here.
    pub fn force_status(&mut self, new_status: ThreadStatus) {
        if self.status == ThreadStatus::Resolved {
            return;
        }
        if new_status == ThreadStatus::Advancing {
            self.tension = (self.tension + 2).min(10);
        }
        self.status = new_status;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(status: ThreadStatus) -> NarrativeThreadState {
        NarrativeThreadState::new(NarrativeThread::new("thread"), status, 5, "")
    }

    #[test]
    fn resolved_is_absorbing_against_update() {
        let mut s = state(ThreadStatus::Resolved);
        s.apply_update(ThreadStatus::Active, 9, "trying to demote");
        assert_eq!(s.status, ThreadStatus::Resolved);
    }

    #[test]
    fn resolved_is_absorbing_against_force() {
        let mut s = state(ThreadStatus::Resolved);
        s.force_status(ThreadStatus::Stalled);
        assert_eq!(s.status, ThreadStatus::Resolved);
    }

    #[test]
    fn non_resolved_update_applies_normally() {
        let mut s = state(ThreadStatus::Active);
        s.apply_update(ThreadStatus::Stalled, 3, "quieted down");
        assert_eq!(s.status, ThreadStatus::Stalled);
        assert_eq!(s.tension, 3);
    }

    #[test]
    fn forcing_advancing_bumps_tension_clamped() {
        let mut s = state(ThreadStatus::Active);
        s.tension = 9;
        s.force_status(ThreadStatus::Advancing);
        assert_eq!(s.tension, 10);
        assert_eq!(s.status, ThreadStatus::Advancing);
    }

    #[test]
    fn tension_is_clamped_on_construction() {
        let s = NarrativeThreadState::new(NarrativeThread::new("t"), ThreadStatus::Active, 50, "");
        assert_eq!(s.tension, 10);
    }
}
