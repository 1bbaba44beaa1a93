use std::collections::HashSet;

use serde::Serialize;
use uuid::Uuid;

use super::{Attendee, TrainingError};

/// Who signed up for a session and who completed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionRoster {
    pub session: Uuid,
    pub registered: Vec<Uuid>,
    pub completed: Vec<Uuid>,
}

pub fn session_roster(session: Uuid, attendees: &[Attendee]) -> SessionRoster {
    let registered: Vec<&Attendee> = attendees.iter().filter(|a| a.registered_for(session)).collect();
    SessionRoster {
        session,
        completed: registered
            .iter()
            .filter(|a| a.completed(session))
            .map(|a| a.id)
            .collect(),
        registered: registered.iter().map(|a| a.id).collect(),
    }
}

/// Marks which registered attendees completed `session`.
///
/// Registered attendees missing from `completed` lose the session from their
/// completed list. Returns only the attendees whose record changed.
pub fn record_attendance(
    session: Uuid,
    attendees: &[Attendee],
    completed: &HashSet<Uuid>,
) -> Result<Vec<Attendee>, TrainingError> {
    if let Some(stray) = completed
        .iter()
        .find(|id| !attendees.iter().any(|a| a.id == **id && a.registered_for(session)))
    {
        let name = attendees
            .iter()
            .find(|a| a.id == *stray)
            .map_or_else(|| stray.to_string(), |a| a.name.clone());
        return Err(TrainingError::NotRegistered(name));
    }

    let mut changed = Vec::new();
    for attendee in attendees.iter().filter(|a| a.registered_for(session)) {
        let done = completed.contains(&attendee.id);
        if done == attendee.completed(session) {
            continue;
        }
        let mut updated = attendee.clone();
        if done {
            updated.complete_sessions.push(session);
        } else {
            updated.complete_sessions.retain(|s| *s != session);
        }
        changed.push(updated);
    }
    Ok(changed)
}
