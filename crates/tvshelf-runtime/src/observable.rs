use tokio::sync::watch;

/// A single observable state field.
///
/// Each write replaces the whole value and wakes every subscriber, so an
/// observer only ever sees complete values. Writes never fail, even with no
/// subscribers. Only this crate can write; everyone else reads or subscribes.
#[derive(Debug)]
pub struct Observable<T> {
    tx: watch::Sender<T>,
}

impl<T> Observable<T> {
    pub fn new(initial: T) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub(crate) fn set(&self, value: T) {
        self.tx.send_replace(value);
    }

    /// Receiver that is notified on every subsequent write.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }
}

impl<T: Clone> Observable<T> {
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }
}

impl<T: PartialEq> Observable<T> {
    /// Write `value` only if it differs, so subscribers are not woken for nothing.
    pub(crate) fn set_if_changed(&self, value: T) {
        self.tx.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }
}

impl<T: Default> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
