use parking_lot::{Condvar, Mutex};
use std::sync::Arc;

/// A way of handing the latest meter snapshot from the tick thread to the render thread such that
/// the tick thread never blocks.
///
/// Only works with 1 waiter & 1 updater.
pub struct MonitorData<T> {
    inner: Arc<Shared<T>>,
}

// derive would require `T: Clone`
impl<T> Clone for MonitorData<T> {
    fn clone(&self) -> Self {
        MonitorData {
            inner: self.inner.clone(),
        }
    }
}

struct Shared<T> {
    data: Mutex<Inner<T>>,
    waker: Condvar,
}

struct Inner<T> {
    value: T,
    new_data: bool,
    shutdown: bool,
}

impl<T> MonitorData<T> {
    pub fn new(inner: T) -> Self {
        MonitorData {
            inner: Arc::new(Shared {
                data: Mutex::new(Inner {
                    value: inner,
                    new_data: false,
                    shutdown: false,
                }),
                waker: Condvar::new(),
            }),
        }
    }

    /// Replace the value through `cb` and wake the waiter. If the mutex is locked then skip over,
    /// returning `false`; the next tick will publish a fresher value anyway.
    pub fn update(&self, cb: impl FnOnce(&mut T)) -> bool {
        let mut data = match self.inner.data.try_lock() {
            Some(lock) => lock,
            None => return false,
        };
        data.new_data = true;
        cb(&mut data.value);
        self.inner.waker.notify_one();
        true
    }

    /// Like [`MonitorData::update`], but waits for the lock instead of skipping. For transitions the
    /// waiter must not miss.
    pub fn replace(&self, cb: impl FnOnce(&mut T)) {
        let mut data = self.inner.data.lock();
        data.new_data = true;
        cb(&mut data.value);
        self.inner.waker.notify_one();
    }

    /// Call `cb` with each new value until [`MonitorData::shutdown`] is called.
    pub fn on_changed(&self, mut cb: impl FnMut(&T)) {
        let mut data = self.inner.data.lock();
        loop {
            while !data.new_data && !data.shutdown {
                self.inner.waker.wait(&mut data);
            }
            if data.shutdown {
                break;
            }
            cb(&data.value);
            data.new_data = false;
        }
    }

    /// Stop any waiter in `on_changed`. Blocks until the waiter has released the value.
    pub fn shutdown(&self) {
        let mut data = self.inner.data.lock();
        data.shutdown = true;
        self.inner.waker.notify_all();
    }
}

impl<T: Clone> MonitorData<T> {
    /// A copy of the current value, waiting for the lock if necessary.
    pub fn latest(&self) -> T {
        self.inner.data.lock().value.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_update_and_latest() {
        let data = MonitorData::new(0u32);
        assert!(data.update(|v| *v = 3));
        assert_eq!(data.latest(), 3);
    }

    #[test]
    fn test_update_skips_when_locked() {
        let data = MonitorData::new(0u32);
        let guard = data.inner.data.lock();
        assert!(!data.update(|v| *v = 1));
        drop(guard);
        assert_eq!(data.latest(), 0);
    }

    #[test]
    fn test_waiter_sees_value_and_stops() {
        let data = MonitorData::new(0u32);
        let (tx, rx) = crossbeam_channel::bounded(1);
        let waiter = {
            let data = data.clone();
            thread::spawn(move || {
                data.on_changed(|v| {
                    let _ = tx.try_send(*v);
                });
            })
        };
        // keep publishing until the waiter picks a value up
        let seen = loop {
            data.update(|v| *v = 7);
            if let Ok(v) = rx.recv_timeout(std::time::Duration::from_millis(10)) {
                break v;
            }
        };
        assert_eq!(seen, 7);
        data.shutdown();
        waiter.join().unwrap();
    }

    #[test]
    fn test_replace_waits_for_lock() {
        let data = MonitorData::new(0u32);
        let guard = data.inner.data.lock();
        let writer = {
            let data = data.clone();
            thread::spawn(move || data.replace(|v| *v = 9))
        };
        thread::sleep(std::time::Duration::from_millis(20));
        assert_eq!(guard.value, 0);
        drop(guard);
        writer.join().unwrap();
        assert_eq!(data.latest(), 9);
    }
}
