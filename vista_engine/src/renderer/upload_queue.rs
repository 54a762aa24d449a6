/// Bounded FIFO staging CPU data for the consumer thread.
///
/// One producer pushes and one consumer pops. Both sides only ever touch
/// slots the other side has released, so the per-slot locks are never
/// contended; they exist to hand the item across threads.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::graphics_device::{BufferUsage, Image};

pub struct PendingQueue<T> {
    slots: Box<[Mutex<Option<T>>]>,
    write: AtomicUsize,
    read: AtomicUsize,
}

impl<T> PendingQueue<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity.max(1)).map(|_| Mutex::new(None)).collect(),
            write: AtomicUsize::new(0),
            read: AtomicUsize::new(0),
        }
    }

    /// Append `item`; hands it back when the queue is full.
    pub fn push(&self, item: T) -> Result<(), T> {
        let write = self.write.load(Ordering::Acquire);
        let read = self.read.load(Ordering::Acquire);
        if write - read >= self.slots.len() {
            return Err(item);
        }
        *self.slot(write).lock().unwrap_or_else(PoisonError::into_inner) = Some(item);
        self.write.store(write + 1, Ordering::Release);
        Ok(())
    }

    /// Oldest item, if any
    pub fn pop(&self) -> Option<T> {
        let read = self.read.load(Ordering::Acquire);
        if read == self.write.load(Ordering::Acquire) {
            return None;
        }
        let item = self.slot(read).lock().unwrap_or_else(PoisonError::into_inner).take();
        self.read.store(read + 1, Ordering::Release);
        item
    }

    pub fn len(&self) -> usize {
        self.write.load(Ordering::Acquire) - self.read.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn slot(&self, index: usize) -> &Mutex<Option<T>> {
        &self.slots[index % self.slots.len()]
    }
}

/// Geometry waiting to become a device buffer
#[derive(Debug, Clone, PartialEq)]
pub struct PendingGeometry {
    pub id: u32,
    pub usage: BufferUsage,
    pub stride: u32,
    pub count: u32,
    pub data: Vec<u8>,
}

/// Texture waiting to be created; `None` unloads the id
#[derive(Debug, Clone, PartialEq)]
pub struct PendingTexture {
    pub id: u32,
    pub image: Option<Image>,
}

#[cfg(test)]
#[path = "upload_queue_tests.rs"]
mod tests;
