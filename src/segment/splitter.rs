//! Partitioning an ordered event list into bounded chunks

use crate::types::SerializableEvent;

/// Split `events` into ordered, non-empty chunks
///
/// A chunk rotates before the next event when it already holds `max_events`
/// events, or when adding the event's payload would push it past `max_bytes`
/// and the chunk is non-empty. An event larger than `max_bytes` on its own
/// still gets a chunk to itself. Concatenating the chunks yields `events`.
pub fn split(
    events: &[SerializableEvent],
    max_events: usize,
    max_bytes: u64,
) -> Vec<Vec<SerializableEvent>> {
    let max_events = max_events.max(1);
    let mut chunks = Vec::new();
    let mut current: Vec<SerializableEvent> = Vec::new();
    let mut current_bytes: u64 = 0;

    for event in events {
        let size = event.payload_size();
        let full = current.len() >= max_events;
        let overflow = !current.is_empty() && current_bytes.saturating_add(size) > max_bytes;
        if full || overflow {
            chunks.push(std::mem::take(&mut current));
            current_bytes = 0;
        }
        current_bytes = current_bytes.saturating_add(size);
        current.push(event.clone());
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SortableUniqueId;
    use chrono::{TimeZone, Utc};

    fn events(sizes: &[usize]) -> Vec<SerializableEvent> {
        let base = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        sizes
            .iter()
            .enumerate()
            .map(|(i, size)| {
                let at = base + chrono::Duration::milliseconds(i as i64);
                SerializableEvent::new(SortableUniqueId::generate(at, 0), "E", vec![0u8; *size])
            })
            .collect()
    }

    fn lengths(chunks: &[Vec<SerializableEvent>]) -> Vec<usize> {
        chunks.iter().map(Vec::len).collect()
    }

    #[test]
    fn test_count_bound() {
        let input = events(&[1, 1, 1, 1, 1]);
        let chunks = split(&input, 2, u64::MAX);

        assert_eq!(lengths(&chunks), vec![2, 2, 1]);
        assert_eq!(chunks[0], input[0..2].to_vec());
        assert_eq!(chunks[1], input[2..4].to_vec());
        assert_eq!(chunks[2], input[4..5].to_vec());
    }

    #[test]
    fn test_byte_bound() {
        let input = events(&[40, 40, 40, 10]);
        let chunks = split(&input, 100, 100);

        assert_eq!(lengths(&chunks), vec![2, 2]);
    }

    #[test]
    fn test_exact_byte_fit_stays_together() {
        let input = events(&[50, 50, 1]);
        let chunks = split(&input, 100, 100);

        assert_eq!(lengths(&chunks), vec![2, 1]);
    }

    #[test]
    fn test_oversized_event_gets_own_chunk() {
        let input = events(&[10, 500, 10]);
        let chunks = split(&input, 100, 100);

        assert_eq!(lengths(&chunks), vec![1, 1, 1]);
        assert_eq!(chunks[1][0].payload.len(), 500);
    }

    #[test]
    fn test_empty_input() {
        assert!(split(&[], 10, 10).is_empty());
    }

    #[test]
    fn test_concatenation_reconstructs_input_and_bounds_hold() {
        let sizes: Vec<usize> = (0..57).map(|i| (i * 37) % 90).collect();
        let input = events(&sizes);

        for max_events in [1usize, 2, 3, 7, 100] {
            for max_bytes in [1u64, 50, 89, 200, 10_000] {
                let chunks = split(&input, max_events, max_bytes);
                let flat: Vec<_> = chunks.iter().flatten().cloned().collect();
                assert_eq!(flat, input);

                for chunk in &chunks {
                    assert!(!chunk.is_empty());
                    assert!(chunk.len() <= max_events);
                    let bytes: u64 = chunk.iter().map(|e| e.payload_size()).sum();
                    assert!(bytes <= max_bytes || chunk.len() == 1);
                }
            }
        }
    }
}
