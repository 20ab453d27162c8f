//! Bounded recycler of capture buffers between the camera and the inference task.
//!
//! Buffers cycle free -> (hardware writes) -> ready -> (inference reads) -> free,
//! always in the same rotation. `free_idx` is only advanced by the free side and
//! `ready_idx` only by the ready side, so each has a single writer.

use core::sync::atomic::{AtomicUsize, Ordering};

use embassy_sync::blocking_mutex::raw::RawMutex;
use heapless::Vec;

use crate::error::Fatal;
use crate::sync::Semaphore;

/// Hard upper bound on queue depth
pub const BQUEUE_MAX_BUFFERS: usize = 2;

pub struct BufferQueue<M: RawMutex, B: Copy, const N: usize = BQUEUE_MAX_BUFFERS> {
    buffers: Vec<B, N>,
    free: Semaphore<M>,
    ready: Semaphore<M>,
    free_idx: AtomicUsize,
    ready_idx: AtomicUsize,
}

impl<M: RawMutex, B: Copy, const N: usize> BufferQueue<M, B, N> {
    /// All buffers start free
    pub fn new(buffers: &[B]) -> Result<Self, Fatal> {
        let buffers: Vec<B, N> = Vec::from_slice(buffers).map_err(|_| Fatal::QueueCapacity {
            requested: buffers.len(),
            max: N,
        })?;
        let count = buffers.len();

        Ok(Self {
            buffers,
            free: Semaphore::new(count, count),
            ready: Semaphore::new(0, count),
            free_idx: AtomicUsize::new(0),
            ready_idx: AtomicUsize::new(0),
        })
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Non-blocking variant for interrupt context
    pub fn try_acquire_free(&self) -> Option<B> {
        if !self.free.try_acquire() {
            return None;
        }

        Some(self.advance(&self.free_idx))
    }

    pub async fn acquire_free(&self) -> B {
        self.free.acquire().await;
        self.advance(&self.free_idx)
    }

    /// Called once the hardware has finished writing the buffer taken by the
    /// last `acquire_free`. Safe in interrupt context.
    pub fn release_as_ready(&self) -> Result<(), Fatal> {
        self.ready.release().map_err(|_| Fatal::Semaphore("bqueue ready"))
    }

    pub async fn acquire_ready(&self) -> B {
        self.ready.acquire().await;
        self.advance(&self.ready_idx)
    }

    pub fn release_as_free(&self) -> Result<(), Fatal> {
        self.free.release().map_err(|_| Fatal::Semaphore("bqueue free"))
    }

    pub fn free_permits(&self) -> usize {
        self.free.permits()
    }

    pub fn ready_permits(&self) -> usize {
        self.ready.permits()
    }

    fn advance(&self, idx: &AtomicUsize) -> B {
        // single writer per index, a plain load/store pair is enough
        let current = idx.load(Ordering::Acquire);
        idx.store((current + 1) % self.buffers.len(), Ordering::Release);

        self.buffers[current]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    type Queue = BufferQueue<NoopRawMutex, u8, BQUEUE_MAX_BUFFERS>;

    #[test]
    fn test_capacity_exceeded() {
        let err = Queue::new(&[0, 1, 2]).err();
        assert_eq!(err, Some(Fatal::QueueCapacity { requested: 3, max: 2 }));
    }

    #[test]
    fn test_fifo_rotation() {
        let queue = Queue::new(&[10, 20]).unwrap();
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.free_permits(), 2);

        assert_eq!(queue.try_acquire_free(), Some(10));
        queue.release_as_ready().unwrap();
        assert_eq!(queue.try_acquire_free(), Some(20));
        queue.release_as_ready().unwrap();
        assert_eq!(queue.try_acquire_free(), None);

        assert_eq!(block_on(queue.acquire_ready()), 10);
        queue.release_as_free().unwrap();
        assert_eq!(block_on(queue.acquire_ready()), 20);
        queue.release_as_free().unwrap();

        // rotation wraps back to the first buffer
        assert_eq!(queue.try_acquire_free(), Some(10));
    }

    #[test]
    fn test_release_past_capacity_is_fatal() {
        let queue = Queue::new(&[1, 2]).unwrap();
        assert_eq!(queue.release_as_free(), Err(Fatal::Semaphore("bqueue free")));

        queue.release_as_ready().unwrap();
        queue.release_as_ready().unwrap();
        assert_eq!(queue.release_as_ready(), Err(Fatal::Semaphore("bqueue ready")));
    }

    #[test]
    fn test_single_buffer_queue() {
        let queue = BufferQueue::<NoopRawMutex, u8, 1>::new(&[7]).unwrap();
        assert_eq!(block_on(queue.acquire_free()), 7);
        assert_eq!(queue.try_acquire_free(), None);
    }
}
