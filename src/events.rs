use std::collections::HashMap;

/// Events delivered to subscribers. Progress and focus are independent
/// channels; neither carries sequence numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Transcription progress reported by the engine, 0..=100.
    Progress(u8),
    /// The host window regained focus.
    Focus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Progress,
    Focus,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Progress(_) => EventKind::Progress,
            Event::Focus => EventKind::Focus,
        }
    }
}

/// Token returned by `subscribe`. Must be released through
/// `unsubscribe_all` when the owning component's lifecycle ends, otherwise
/// the handler keeps firing against state that no longer exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionHandle {
    id: u64,
    kind: EventKind,
}

type Handler = Box<dyn FnMut(&Event)>;

/// Registry of event handlers. Handlers for a kind run in registration
/// order, once per published event.
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    handlers: HashMap<EventKind, Vec<(u64, Handler)>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, kind: EventKind, handler: F) -> SubscriptionHandle
    where
        F: FnMut(&Event) + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        self.handlers
            .entry(kind)
            .or_default()
            .push((id, Box::new(handler)));
        SubscriptionHandle { id, kind }
    }

    pub fn publish(&mut self, event: Event) {
        if let Some(handlers) = self.handlers.get_mut(&event.kind()) {
            for (_id, handler) in handlers.iter_mut() {
                handler(&event);
            }
        }
    }

    /// Releases every handle in the set and drains it. Idempotent: handles
    /// already released are ignored.
    pub fn unsubscribe_all(&mut self, handles: &mut Vec<SubscriptionHandle>) {
        for handle in handles.drain(..) {
            if let Some(registered) = self.handlers.get_mut(&handle.kind) {
                registered.retain(|(id, _)| *id != handle.id);
            }
        }
    }

    #[cfg(test)]
    fn subscriber_count(&self, kind: EventKind) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn handlers_run_in_registration_order() {
        let mut bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        for tag in ["first", "second"] {
            let seen = Rc::clone(&seen);
            bus.subscribe(EventKind::Progress, move |event| {
                if let Event::Progress(p) = event {
                    seen.borrow_mut().push((tag, *p));
                }
            });
        }
        bus.publish(Event::Progress(42));
        assert_eq!(*seen.borrow(), vec![("first", 42), ("second", 42)]);
    }

    #[test]
    fn channels_are_independent() {
        let mut bus = EventBus::new();
        let focus_count = Rc::new(RefCell::new(0));
        {
            let focus_count = Rc::clone(&focus_count);
            bus.subscribe(EventKind::Focus, move |_| {
                *focus_count.borrow_mut() += 1;
            });
        }
        bus.publish(Event::Progress(10));
        assert_eq!(*focus_count.borrow(), 0);
        bus.publish(Event::Focus);
        assert_eq!(*focus_count.borrow(), 1);
    }

    #[test]
    fn unsubscribe_all_stops_delivery() {
        let mut bus = EventBus::new();
        let seen = Rc::new(RefCell::new(0));
        let mut handles = Vec::new();
        {
            let seen = Rc::clone(&seen);
            handles.push(bus.subscribe(EventKind::Progress, move |_| {
                *seen.borrow_mut() += 1;
            }));
        }
        bus.publish(Event::Progress(1));
        bus.unsubscribe_all(&mut handles);
        bus.publish(Event::Progress(2));
        assert_eq!(*seen.borrow(), 1);
        assert!(handles.is_empty());
        assert_eq!(bus.subscriber_count(EventKind::Progress), 0);
    }

    #[test]
    fn unsubscribe_all_is_idempotent() {
        let mut bus = EventBus::new();
        let mut handles = vec![bus.subscribe(EventKind::Focus, |_| {})];
        let mut stale = handles.clone();
        bus.unsubscribe_all(&mut handles);
        bus.unsubscribe_all(&mut stale);
        assert_eq!(bus.subscriber_count(EventKind::Focus), 0);
    }
}
