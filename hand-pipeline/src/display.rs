//! Snapshot handoff from the inference task to the display task.
//!
//! The writer copies a whole `CycleReport` in under the lock, then signals.
//! The reader waits for the signal and copies the whole `DisplayInfo` out, so
//! rendering never holds the lock. Updates arriving faster than the display
//! overwrite each other and the reader always sees the latest one.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use hand_shared::{CycleReport, DisplayInfo};

use crate::sync::Semaphore;

pub struct SharedDisplay<M: RawMutex> {
    info: Mutex<M, RefCell<DisplayInfo>>,
    update: Semaphore<M>,
}

impl<M: RawMutex> SharedDisplay<M> {
    pub fn new() -> Self {
        Self {
            info: Mutex::new(RefCell::new(DisplayInfo::default())),
            update: Semaphore::new(0, 1),
        }
    }

    /// Stores the report and wakes the display task. Overlay flags and the
    /// display's own timing are left alone.
    pub fn publish(&self, report: &CycleReport) {
        self.info.lock(|info| info.borrow_mut().report = *report);
        // a pending update the display has not consumed yet already covers this one
        let _ = self.update.release();
    }

    pub async fn wait_update(&self) {
        self.update.acquire().await
    }

    pub fn try_update(&self) -> bool {
        self.update.try_acquire()
    }

    pub fn snapshot(&self) -> DisplayInfo {
        self.info.lock(|info| *info.borrow())
    }

    pub fn toggle_landmarks(&self) {
        self.info.lock(|info| {
            let mut info = info.borrow_mut();
            info.overlay.landmarks = !info.overlay.landmarks;
        });
    }

    pub fn toggle_detection(&self) {
        self.info.lock(|info| {
            let mut info = info.borrow_mut();
            info.overlay.detection = !info.overlay.detection;
        });
    }
}

impl<M: RawMutex> Default for SharedDisplay<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    #[test]
    fn test_publish_signals_once() {
        let display = SharedDisplay::<NoopRawMutex>::new();
        assert!(!display.try_update());

        let mut report = CycleReport::default();
        report.cycle = 1;
        display.publish(&report);
        report.cycle = 2;
        display.publish(&report);

        assert!(display.try_update());
        assert!(!display.try_update());
        // the latest report wins
        assert_eq!(display.snapshot().report.cycle, 2);
    }

    #[test]
    fn test_toggles_survive_publish() {
        let display = SharedDisplay::<NoopRawMutex>::new();
        display.toggle_landmarks();
        display.toggle_detection();

        display.publish(&CycleReport::default());

        let info = display.snapshot();
        assert!(!info.overlay.landmarks);
        assert!(info.overlay.detection);
    }
}
