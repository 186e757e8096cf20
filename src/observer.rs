//! Consumers of published measurements.

use crate::types::Subscription;

/// Receives the values of one subscription.
///
/// Called at most once per poll cycle, and only with a defined value.
pub trait Sink {
    fn publish(&mut self, value: f32);
}

impl<F: FnMut(f32)> Sink for F {
    fn publish(&mut self, value: f32) {
        self(value)
    }
}

/// A subscription bound to its sink.
pub struct Observer<S: Sink> {
    pub subscription: Subscription,
    pub sink: S,
}

impl<S: Sink> Observer<S> {
    pub fn new(subscription: Subscription, sink: S) -> Self {
        Self { subscription, sink }
    }
}
