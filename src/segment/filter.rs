//! Safe-window selection

use chrono::{DateTime, Utc};

use crate::types::SerializableEvent;

/// The prefix of `events` that ends at the last event stamped at or before
/// `cutoff`, order preserved
///
/// `events` is ordered by id, so for well-formed ids this is exactly the
/// events whose id-embedded timestamp is at or before `cutoff`. An id with no
/// decodable timestamp is safe only when a later event in the prefix is: the
/// checkpoint moves past it, so it has to land in a segment. Trailing
/// undecodable ids wait. Raising `cutoff` never removes an event that a lower
/// cutoff included.
pub fn safe_events(events: &[SerializableEvent], cutoff: DateTime<Utc>) -> Vec<SerializableEvent> {
    let end = events
        .iter()
        .rposition(|e| e.timestamp().map_or(false, |ts| ts <= cutoff))
        .map_or(0, |last| last + 1);
    events[..end].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SortableUniqueId;
    use chrono::TimeZone;

    fn event_at(sec: u32) -> SerializableEvent {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, sec).unwrap();
        SerializableEvent::new(SortableUniqueId::generate_at(at), "Tick", vec![sec as u8])
    }

    fn at(sec: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, sec).unwrap()
    }

    #[test]
    fn test_cutoff_is_inclusive() {
        let events: Vec<_> = (0..4).map(event_at).collect();

        // now = 3s, safe window = 2s
        let safe = safe_events(&events, at(1));

        assert_eq!(safe.len(), 2);
        assert_eq!(safe[0], events[0]);
        assert_eq!(safe[1], events[1]);
    }

    #[test]
    fn test_monotonic_in_cutoff() {
        let events: Vec<_> = (0..10).map(event_at).collect();

        let mut previous: Vec<SerializableEvent> = Vec::new();
        for cutoff in 0..12 {
            let current = safe_events(&events, at(cutoff.min(59)));
            assert!(previous.iter().all(|e| current.contains(e)));
            assert!(current.len() >= previous.len());
            previous = current;
        }
    }

    #[test]
    fn test_trailing_undecodable_ids_wait() {
        let mut bad = event_at(0);
        bad.sortable_unique_id = SortableUniqueId::from_raw("not-an-id");

        assert!(safe_events(&[bad.clone()], at(59)).is_empty());
        assert!(safe_events(&[], at(59)).is_empty());

        let events = vec![event_at(1), bad];
        assert_eq!(safe_events(&events, at(59)), events[..1].to_vec());
    }

    #[test]
    fn test_undecodable_id_before_safe_event_is_kept() {
        let mut bad = event_at(0);
        // sorts ahead of every well-formed id
        bad.sortable_unique_id = SortableUniqueId::from_raw("0-bad");
        let events = vec![bad, event_at(1), event_at(2), event_at(5)];

        let safe = safe_events(&events, at(2));

        assert_eq!(safe, events[..3].to_vec());
        assert!(safe_events(&events[..1], at(2)).is_empty());
    }
}
