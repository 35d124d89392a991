// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! Watcher registry and the notification worker thread.
//!
//! Notifications are queued by the manager and delivered in order from a
//! dedicated thread. Delivery holds the registry's read lock, so removing a
//! watcher waits for an in-flight delivery and nothing reaches a watcher
//! after its removal returns. Watchers must not add or remove watchers from
//! inside the callback.

use crossbeam::channel::{unbounded, Receiver, Sender};
use ozw_core::notification::{Notification, WatcherFn};
use parking_lot::{Mutex, RwLock};
use std::ffi::c_void;
use std::sync::Arc;
use std::thread::JoinHandle;

#[derive(Clone, Copy)]
struct Watcher {
    func: WatcherFn,
    context: usize,
}

impl Watcher {
    #[inline]
    fn matches(&self, func: WatcherFn, context: *mut c_void) -> bool {
        self.func as usize == func as usize && self.context == context as usize
    }
}

enum Event {
    Notify(Notification),
    Shutdown,
}

pub struct Notifier {
    watchers: Arc<RwLock<Vec<Watcher>>>,
    sender: Sender<Event>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Notifier {
    pub fn start() -> Self {
        let watchers = Arc::new(RwLock::new(Vec::new()));
        let (sender, receiver) = unbounded();
        let worker = {
            let watchers = Arc::clone(&watchers);
            std::thread::Builder::new()
                .name("ozw-notifications".to_string())
                .spawn(move || Self::run(receiver, watchers))
                .map_err(|e| tracing::error!(error = %e, "failed to spawn notification thread"))
                .ok()
        };
        Self {
            watchers,
            sender,
            worker: Mutex::new(worker),
        }
    }

    fn run(receiver: Receiver<Event>, watchers: Arc<RwLock<Vec<Watcher>>>) {
        for event in receiver.iter() {
            match event {
                Event::Notify(notification) => {
                    let watchers = watchers.read();
                    tracing::trace!(
                        kind = notification.kind().as_str(),
                        watchers = watchers.len(),
                        "delivering notification"
                    );
                    for watcher in watchers.iter() {
                        (watcher.func)(&notification, watcher.context as *mut c_void);
                    }
                }
                Event::Shutdown => break,
            }
        }
    }

    pub fn add(&self, func: WatcherFn, context: *mut c_void) -> bool {
        let mut watchers = self.watchers.write();
        if watchers.iter().any(|w| w.matches(func, context)) {
            return false;
        }
        watchers.push(Watcher {
            func,
            context: context as usize,
        });
        true
    }

    pub fn remove(&self, func: WatcherFn, context: *mut c_void) -> bool {
        let mut watchers = self.watchers.write();
        match watchers.iter().position(|w| w.matches(func, context)) {
            Some(pos) => {
                watchers.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn emit(&self, notification: Notification) {
        if self.sender.send(Event::Notify(notification)).is_err() {
            tracing::warn!("notification dropped, worker has stopped");
        }
    }

    /// Delivers every queued notification, then stops the worker.
    pub fn shutdown(&self) {
        if let Some(worker) = self.worker.lock().take() {
            let _ = self.sender.send(Event::Shutdown);
            if worker.join().is_err() {
                tracing::error!("notification thread panicked");
            }
        }
    }
}

impl Drop for Notifier {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ozw_core::notification::NotificationType;
    use ozw_core::value_id::ValueId;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn count(_n: &Notification, context: *mut c_void) {
        let counter = unsafe { &*(context as *const AtomicUsize) };
        counter.fetch_add(1, Ordering::SeqCst);
    }

    fn note() -> Notification {
        Notification::new(NotificationType::ValueChanged, ValueId::from_parts(1, 0, 0))
    }

    #[test]
    fn test_duplicate_pair_is_refused() {
        let notifier = Notifier::start();
        let counter = AtomicUsize::new(0);
        let ctx = &counter as *const _ as *mut c_void;
        assert!(notifier.add(count, ctx));
        assert!(!notifier.add(count, ctx));
        assert!(notifier.remove(count, ctx));
        assert!(!notifier.remove(count, ctx));
    }

    #[test]
    fn test_shutdown_flushes_queue() {
        let notifier = Notifier::start();
        let counter = AtomicUsize::new(0);
        let ctx = &counter as *const _ as *mut c_void;
        notifier.add(count, ctx);
        for _ in 0..10 {
            notifier.emit(note());
        }
        notifier.shutdown();
        assert_eq!(counter.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn test_nothing_delivered_after_remove() {
        let notifier = Notifier::start();
        let counter = AtomicUsize::new(0);
        let ctx = &counter as *const _ as *mut c_void;
        notifier.add(count, ctx);
        notifier.remove(count, ctx);
        notifier.emit(note());
        notifier.shutdown();
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
