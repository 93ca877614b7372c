use crate::frame::FrameData;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::trace;

/// Single-slot store holding only the most recent frame.
///
/// The capture producer calls [`FrameBuffer::publish`] at camera rate; it
/// overwrites the slot and never waits on a consumer. Consumers read the
/// latest frame when a classification cycle is admitted. Frames are never
/// queued, so a slow consumer simply misses intermediate frames.
pub struct FrameBuffer {
    slot: Mutex<Option<FrameData>>,
    /// Counter producers use to stamp frames
    frame_counter: AtomicU64,
    /// Whether the frame in the slot has been read by a consumer
    consumed: AtomicBool,
    stats: FrameBufferStats,
}

/// Counters for frame buffer monitoring
#[derive(Debug)]
pub struct FrameBufferStats {
    /// Total frames published
    pub frames_published: AtomicU64,
    /// Frames read by a consumer
    pub frames_taken: AtomicU64,
    /// Frames overwritten before any consumer read them
    pub frames_dropped: AtomicU64,
}

impl FrameBufferStats {
    fn new() -> Self {
        Self {
            frames_published: AtomicU64::new(0),
            frames_taken: AtomicU64::new(0),
            frames_dropped: AtomicU64::new(0),
        }
    }

    /// Get current statistics as a snapshot
    pub fn snapshot(&self) -> FrameBufferStatsSnapshot {
        FrameBufferStatsSnapshot {
            frames_published: self.frames_published.load(Ordering::Relaxed),
            frames_taken: self.frames_taken.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of frame buffer statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBufferStatsSnapshot {
    pub frames_published: u64,
    pub frames_taken: u64,
    pub frames_dropped: u64,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            frame_counter: AtomicU64::new(0),
            consumed: AtomicBool::new(true),
            stats: FrameBufferStats::new(),
        }
    }

    /// Overwrite the stored frame. O(1); the lock is held only for the swap.
    pub fn publish(&self, frame: FrameData) {
        trace!("Publishing frame {}", frame.id);

        let previous = self.slot.lock().replace(frame);
        let previous_consumed = self.consumed.swap(false, Ordering::AcqRel);

        if previous.is_some() && !previous_consumed {
            self.stats.frames_dropped.fetch_add(1, Ordering::Relaxed);
        }
        self.stats.frames_published.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the most recently published frame, if any
    pub fn latest(&self) -> Option<FrameData> {
        let frame = self.slot.lock().clone();
        if frame.is_some() {
            self.mark_taken();
        }
        frame
    }

    /// Get the latest frame only if it is newer than `last_seen_id`.
    ///
    /// Lets a periodic consumer read each frame at most once.
    pub fn latest_newer_than(&self, last_seen_id: Option<u64>) -> Option<FrameData> {
        let frame = {
            let slot = self.slot.lock();
            match (slot.as_ref(), last_seen_id) {
                (Some(frame), Some(seen)) if frame.id <= seen => None,
                (Some(frame), _) => Some(frame.clone()),
                (None, _) => None,
            }
        };

        if let Some(frame) = &frame {
            trace!("Consumer took frame {}", frame.id);
            self.mark_taken();
        }
        frame
    }

    /// Allocate the next frame id for a producer
    pub fn next_frame_id(&self) -> u64 {
        self.frame_counter.fetch_add(1, Ordering::Relaxed)
    }

    /// Drop the stored frame
    pub fn clear(&self) {
        *self.slot.lock() = None;
        self.consumed.store(true, Ordering::Release);
    }

    pub fn has_frame(&self) -> bool {
        self.slot.lock().is_some()
    }

    pub fn stats(&self) -> FrameBufferStatsSnapshot {
        self.stats.snapshot()
    }

    fn mark_taken(&self) {
        self.consumed.store(true, Ordering::Release);
        self.stats.frames_taken.fetch_add(1, Ordering::Relaxed);
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameFormat;
    use std::sync::Arc;
    use std::time::SystemTime;

    fn create_test_frame(id: u64) -> FrameData {
        FrameData::new(id, SystemTime::now(), vec![0u8; 16], 2, 2, FrameFormat::Bgra)
    }

    #[test]
    fn test_empty_buffer() {
        let buffer = FrameBuffer::new();
        assert!(buffer.latest().is_none());
        assert!(!buffer.has_frame());
        assert_eq!(buffer.stats().frames_taken, 0);
    }

    #[test]
    fn test_publish_overwrites() {
        let buffer = FrameBuffer::new();
        buffer.publish(create_test_frame(1));
        buffer.publish(create_test_frame(2));
        buffer.publish(create_test_frame(3));

        assert_eq!(buffer.latest().unwrap().id, 3);

        let stats = buffer.stats();
        assert_eq!(stats.frames_published, 3);
        assert_eq!(stats.frames_dropped, 2);
        assert_eq!(stats.frames_taken, 1);
    }

    #[test]
    fn test_latest_newer_than_reads_each_frame_once() {
        let buffer = FrameBuffer::new();
        assert!(buffer.latest_newer_than(None).is_none());

        buffer.publish(create_test_frame(5));
        let first = buffer.latest_newer_than(None).unwrap();
        assert_eq!(first.id, 5);
        assert!(buffer.latest_newer_than(Some(first.id)).is_none());

        buffer.publish(create_test_frame(6));
        assert_eq!(buffer.latest_newer_than(Some(5)).unwrap().id, 6);
    }

    #[test]
    fn test_clear() {
        let buffer = FrameBuffer::new();
        buffer.publish(create_test_frame(1));
        buffer.clear();
        assert!(buffer.latest().is_none());

        // Clearing an unread frame is not counted as a drop
        buffer.publish(create_test_frame(2));
        assert_eq!(buffer.stats().frames_dropped, 0);
    }

    #[test]
    fn test_frame_ids_are_monotonic() {
        let buffer = FrameBuffer::new();
        let a = buffer.next_frame_id();
        let b = buffer.next_frame_id();
        assert!(b > a);
    }

    #[test]
    fn test_concurrent_publish_and_read() {
        let buffer = Arc::new(FrameBuffer::new());

        let producer = {
            let buffer = Arc::clone(&buffer);
            std::thread::spawn(move || {
                for _ in 0..1000 {
                    let id = buffer.next_frame_id();
                    buffer.publish(create_test_frame(id));
                }
            })
        };

        let consumer = {
            let buffer = Arc::clone(&buffer);
            std::thread::spawn(move || {
                let mut last_seen = None;
                for _ in 0..1000 {
                    if let Some(frame) = buffer.latest_newer_than(last_seen) {
                        if let Some(seen) = last_seen {
                            assert!(frame.id > seen);
                        }
                        last_seen = Some(frame.id);
                    }
                }
            })
        };

        producer.join().unwrap();
        consumer.join().unwrap();

        assert_eq!(buffer.stats().frames_published, 1000);
        assert_eq!(buffer.latest().unwrap().id, 999);
    }
}
