use crate::session::Session;

/// Keeps the sessions whose label, project, tag, id or working directory
/// contain `query`, ignoring case. Input order is preserved.
pub fn filter(sessions: &[Session], query: &str) -> Vec<Session> {
    if query.is_empty() {
        return sessions.to_vec();
    }

    let query = query.to_lowercase();
    sessions
        .iter()
        .filter(|s| matches(s, &query))
        .cloned()
        .collect()
}

fn matches(session: &Session, lowered_query: &str) -> bool {
    [
        session.label(),
        session.project_display.as_str(),
        session.tag(),
        session.id.as_str(),
        session.cwd.as_str(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(lowered_query))
}
