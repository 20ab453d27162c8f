//! Counting semaphore usable from interrupt handlers and async tasks.
//!
//! `try_acquire` and `release` never wait and are safe in interrupt context.
//! `acquire` is the task-side blocking variant.

use core::cell::RefCell;
use core::future::poll_fn;
use core::task::Poll;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::waitqueue::WakerRegistration;

/// Release past the configured maximum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SemaphoreFull;

struct State {
    permits: usize,
    max: usize,
    waker: WakerRegistration,
}

pub struct Semaphore<M: RawMutex> {
    state: Mutex<M, RefCell<State>>,
}

impl<M: RawMutex> Semaphore<M> {
    pub const fn new(initial: usize, max: usize) -> Self {
        Self {
            state: Mutex::new(RefCell::new(State {
                permits: initial,
                max,
                waker: WakerRegistration::new(),
            })),
        }
    }

    /// Takes a permit if one is available
    pub fn try_acquire(&self) -> bool {
        self.state.lock(|state| {
            let mut state = state.borrow_mut();
            if state.permits > 0 {
                state.permits -= 1;
                true
            } else {
                false
            }
        })
    }

    /// Waits until a permit is available and takes it
    pub async fn acquire(&self) {
        poll_fn(|cx| {
            self.state.lock(|state| {
                let mut state = state.borrow_mut();
                if state.permits > 0 {
                    state.permits -= 1;
                    Poll::Ready(())
                } else {
                    state.waker.register(cx.waker());
                    Poll::Pending
                }
            })
        })
        .await
    }

    /// Gives a permit back and wakes the waiter
    pub fn release(&self) -> Result<(), SemaphoreFull> {
        self.state.lock(|state| {
            let mut state = state.borrow_mut();
            if state.permits >= state.max {
                return Err(SemaphoreFull);
            }
            state.permits += 1;
            state.waker.wake();
            Ok(())
        })
    }

    pub fn permits(&self) -> usize {
        self.state.lock(|state| state.borrow().permits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    #[test]
    fn test_try_acquire_and_release() {
        let sem = Semaphore::<NoopRawMutex>::new(1, 2);
        assert!(sem.try_acquire());
        assert!(!sem.try_acquire());
        assert_eq!(sem.permits(), 0);

        assert_eq!(sem.release(), Ok(()));
        assert_eq!(sem.release(), Ok(()));
        assert_eq!(sem.release(), Err(SemaphoreFull));
        assert_eq!(sem.permits(), 2);
    }

    #[test]
    fn test_acquire_ready_permit() {
        let sem = Semaphore::<NoopRawMutex>::new(1, 1);
        block_on(sem.acquire());
        assert_eq!(sem.permits(), 0);
    }
}
