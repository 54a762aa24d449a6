/// Ring of reusable frames shared by the producer and the consumer.
///
/// `write` counts frames the producer has finished, `read` counts frames the
/// consumer has applied. Frame `n` lives in slot `n % N`. The producer may
/// only open a frame while fewer than `N - 1` finished frames wait, so the
/// slot being built never aliases the slot being drawn.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::engine_trace;
use crate::frame::Frame;
use crate::log::EngineLog;

pub struct FrameRing {
    frames: Box<[Mutex<Frame>]>,
    write: AtomicU32,
    read: AtomicU32,
    log: EngineLog,
}

impl FrameRing {
    pub fn new(frames: Vec<Frame>, log: EngineLog) -> Self {
        Self {
            frames: frames.into_iter().map(Mutex::new).collect(),
            write: AtomicU32::new(0),
            read: AtomicU32::new(0),
            log,
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Open the next frame for writing; `None` while the consumer lags behind.
    pub fn begin_frame(&self) -> Option<MutexGuard<'_, Frame>> {
        let write = self.write.load(Ordering::Acquire);
        let read = self.read.load(Ordering::Acquire);
        if (write - read) as usize >= self.frames.len().saturating_sub(1) {
            engine_trace!(self.log, "vista::FrameRing", "No frame available ({} waiting)", write - read);
            return None;
        }
        let mut frame = self.lock(write);
        frame.initialize_frame(write);
        Some(frame)
    }

    /// Publish the frame returned by `begin_frame`.
    pub fn end_frame(&self, frame: MutexGuard<'_, Frame>) {
        drop(frame);
        self.write.fetch_add(1, Ordering::AcqRel);
    }

    pub fn write_index(&self) -> u32 {
        self.write.load(Ordering::Acquire)
    }

    pub fn read_index(&self) -> u32 {
        self.read.load(Ordering::Acquire)
    }

    /// Index of the oldest finished frame not yet applied
    pub(crate) fn next_unread(&self) -> Option<u32> {
        let read = self.read.load(Ordering::Acquire);
        (read != self.write.load(Ordering::Acquire)).then_some(read)
    }

    pub(crate) fn mark_read(&self) {
        self.read.fetch_add(1, Ordering::AcqRel);
    }

    /// Index of the most recently applied frame
    pub fn last_read(&self) -> Option<u32> {
        self.read.load(Ordering::Acquire).checked_sub(1)
    }

    pub(crate) fn lock(&self, index: u32) -> MutexGuard<'_, Frame> {
        let slot = index as usize % self.frames.len();
        self.frames[slot].lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[path = "frame_ring_tests.rs"]
mod tests;
