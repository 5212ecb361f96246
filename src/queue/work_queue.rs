use parking_lot::Mutex;
use std::collections::VecDeque;
use tokio::sync::Notify;

/// Multi-producer, multi-consumer FIFO whose `pop` waits for an item.
pub struct WorkQueue<T> {
    items: Mutex<VecDeque<T>>,
    available: Notify,
}

impl<T> WorkQueue<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            available: Notify::new(),
        }
    }

    /// Appends `item` and wakes one waiting consumer.
    pub fn push(&self, item: T) {
        self.items.lock().push_back(item);
        self.available.notify_one();
    }

    /// Removes the oldest item, waiting until one is available.
    pub async fn pop(&self) -> T {
        loop {
            // Register interest before checking so a push racing with the
            // check leaves a permit behind instead of a lost wakeup.
            let notified = self.available.notified();

            let item = self.items.lock().pop_front();
            if let Some(item) = item {
                return item;
            }

            notified.await;
        }
    }

    /// Removes the oldest item if there is one, without waiting.
    pub fn try_pop(&self) -> Option<T> {
        self.items.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Drops every queued item.
    pub fn drain(&self) -> usize {
        let mut items = self.items.lock();
        let count = items.len();
        items.clear();
        count
    }
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
