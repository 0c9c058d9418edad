//! Synchronous publish/subscribe for repository change announcements.
//!
//! The repository publishes one short text message per mutation. Anything
//! implementing [`Subscriber`] (including plain closures) can listen. Delivery
//! happens inline, in registration order, before `publish` returns.

/// Receives text messages published through a [`NotificationHub`].
pub trait Subscriber {
    fn handle(&mut self, message: &str);
}

impl<F> Subscriber for F
where
    F: FnMut(&str),
{
    fn handle(&mut self, message: &str) {
        self(message)
    }
}

/// Handle returned by [`NotificationHub::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
pub struct NotificationHub {
    subscribers: Vec<(SubscriptionId, Box<dyn Subscriber>)>,
    next_id: u64,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, subscriber: Box<dyn Subscriber>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, subscriber));
        id
    }

    /// Removes a subscriber. Returns `false` if the handle was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    /// Delivers `message` to every current subscriber.
    ///
    /// Returns the number of subscribers that received it.
    pub fn publish(&mut self, message: &str) -> usize {
        log::debug!(
            "event=notify subscribers={} message={:?}",
            self.subscribers.len(),
            message
        );
        for (_, subscriber) in self.subscribers.iter_mut() {
            subscriber.handle(message);
        }
        self.subscribers.len()
    }
}

impl std::fmt::Debug for NotificationHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationHub")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder(tag: &'static str, log: &Rc<RefCell<Vec<String>>>) -> Box<dyn Subscriber> {
        let log = Rc::clone(log);
        Box::new(move |msg: &str| log.borrow_mut().push(format!("{tag}:{msg}")))
    }

    #[test]
    fn publish_with_no_subscribers() {
        let mut hub = NotificationHub::new();
        assert_eq!(hub.publish("hello"), 0);
    }

    #[test]
    fn delivers_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut hub = NotificationHub::new();
        hub.subscribe(recorder("a", &log));
        hub.subscribe(recorder("b", &log));

        assert_eq!(hub.publish("one"), 2);
        assert_eq!(*log.borrow(), vec!["a:one", "b:one"]);
    }

    #[test]
    fn unsubscribed_listeners_stop_receiving() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut hub = NotificationHub::new();
        let first = hub.subscribe(recorder("a", &log));
        hub.subscribe(recorder("b", &log));

        assert!(hub.unsubscribe(first));
        assert!(!hub.unsubscribe(first));
        assert_eq!(hub.publish("two"), 1);
        assert_eq!(*log.borrow(), vec!["b:two"]);
    }
}
