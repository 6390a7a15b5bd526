use std::sync::Arc;

use arc_swap::ArcSwapOption;
use sensorbridge_frame::SensorRecord;

/// Single-slot holder for the most recent valid record.
///
/// One writer (the ingestion pipeline) publishes; any number of readers
/// read concurrently. Publishing swaps in a new `Arc` atomically, so a
/// reader gets either the previous record or the new one in full, never a
/// mix. Neither side takes a lock.
#[derive(Debug, Default)]
pub struct LatestValueStore {
    slot: ArcSwapOption<SensorRecord>,
}

impl LatestValueStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the held record.
    pub fn publish(&self, record: SensorRecord) {
        self.slot.store(Some(Arc::new(record)));
    }

    /// Current record, or `None` if nothing has been published yet.
    pub fn read(&self) -> Option<Arc<SensorRecord>> {
        self.slot.load_full()
    }

    /// Whether a record has been published.
    pub fn is_empty(&self) -> bool {
        self.slot.load().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let store = LatestValueStore::new();
        assert!(store.is_empty());
        assert!(store.read().is_none());
    }

    #[test]
    fn publish_replaces_previous_record() {
        let store = LatestValueStore::new();
        store.publish(SensorRecord::new(22.1, 55.0));
        store.publish(SensorRecord::new(23.0, 50.0));

        assert!(!store.is_empty());
        assert_eq!(*store.read().unwrap(), SensorRecord::new(23.0, 50.0));
    }

    #[test]
    fn reader_keeps_its_snapshot_across_publish() {
        let store = LatestValueStore::new();
        store.publish(SensorRecord::new(1.0, 2.0));
        let snapshot = store.read().unwrap();

        store.publish(SensorRecord::new(3.0, 4.0));
        assert_eq!(*snapshot, SensorRecord::new(1.0, 2.0));
        assert_eq!(*store.read().unwrap(), SensorRecord::new(3.0, 4.0));
    }

    #[test]
    fn concurrent_readers_never_see_torn_records() {
        let store = Arc::new(LatestValueStore::new());

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..20_000 {
                        if let Some(record) = store.read() {
                            // Every published record has humidity == 2 * temperature.
                            assert_eq!(record.humidity, record.temperature * 2.0);
                        }
                    }
                })
            })
            .collect();

        for i in 0..20_000 {
            let t = i as f64;
            store.publish(SensorRecord::new(t, t * 2.0));
        }

        for reader in readers {
            reader.join().unwrap();
        }
    }
}
