use std::sync::Arc;

use super::events::SessionManagerEvent;
use crate::session::RtcSession;

/// An edge between a room having no call and having one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Transition {
    Started,
    Ended,
}

impl Transition {
    /// Edge-triggered: only a change of the active predicate is a transition
    pub fn detect(was_active: bool, is_active: bool) -> Option<Self> {
        match (was_active, is_active) {
            (false, true) => Some(Transition::Started),
            (true, false) => Some(Transition::Ended),
            _ => None,
        }
    }

    pub fn into_event(self, room_id: String, session: Arc<dyn RtcSession>) -> SessionManagerEvent {
        match self {
            Transition::Started => SessionManagerEvent::SessionStarted { room_id, session },
            Transition::Ended => SessionManagerEvent::SessionEnded { room_id, session },
        }
    }
}

/// Outcome of refreshing one session against the latest room state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MembershipRefresh {
    pub was_active: bool,
    pub is_active: bool,
}

impl MembershipRefresh {
    /// Runs the session's membership update and records the before/after state
    ///
    /// A session seen for the first time counts as previously inactive, so
    /// first sight can start a call but never end one.
    pub fn apply(session: &dyn RtcSession, is_new_session: bool) -> Self {
        let was_active = session.is_active() && !is_new_session;
        session.on_rtc_session_member_update();
        let is_active = session.is_active();

        Self {
            was_active,
            is_active,
        }
    }

    pub fn transition(&self) -> Option<Transition> {
        Transition::detect(self.was_active, self.is_active)
    }
}
