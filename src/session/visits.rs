// Visit counter kept in the session

use chrono::{DateTime, Duration, Utc};

use super::store::Session;

/// Count a visit if at least `interval` has passed since the last one
///
/// A session without history starts at one visit. Returns the current
/// count.
pub fn record_visit(session: &mut Session, now: DateTime<Utc>, interval: Duration) -> u32 {
    let data = session.data_mut();
    let mut visits = data.visits.unwrap_or(1);
    let last_visit = data.last_visit.unwrap_or(now);

    if now.signed_duration_since(last_visit) >= interval && now != last_visit {
        visits = visits.saturating_add(1);
        data.last_visit = Some(now);
    } else {
        data.last_visit = Some(last_visit);
    }

    data.visits = Some(visits);
    visits
}
