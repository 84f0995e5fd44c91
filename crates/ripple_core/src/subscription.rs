//! Listener registration handles
//!
//! Every subscription API in this workspace returns a [`Subscription`].
//! Dropping the handle deregisters the listener; `detach()` keeps the
//! listener registered for the life of its source.

use smallvec::SmallVec;

type Cancel = Box<dyn FnOnce() + Send>;

/// Handle for a registered listener
///
/// The listener stays registered for as long as the handle is alive.
/// Dropping the handle (or calling [`Subscription::unsubscribe`])
/// deregisters it.
pub struct Subscription {
    cancels: SmallVec<[Cancel; 1]>,
}

impl Subscription {
    /// Create a subscription that runs `cancel` on deregistration
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        let mut cancels: SmallVec<[Cancel; 1]> = SmallVec::new();
        cancels.push(Box::new(cancel));
        Self { cancels }
    }

    /// A subscription with nothing to deregister
    pub fn empty() -> Self {
        Self {
            cancels: SmallVec::new(),
        }
    }

    /// Merge several subscriptions into one handle
    ///
    /// The merged handle deregisters all parts when dropped.
    pub fn join(parts: impl IntoIterator<Item = Subscription>) -> Self {
        let mut cancels: SmallVec<[Cancel; 1]> = SmallVec::new();
        for mut part in parts {
            cancels.extend(part.cancels.drain(..));
        }
        Self { cancels }
    }

    /// Deregister the listener now
    pub fn unsubscribe(self) {
        // Drop runs the cancel functions.
    }

    /// Keep the listener registered for the life of its source
    pub fn detach(mut self) {
        self.cancels.clear();
    }

    /// Whether this handle still holds any registrations
    pub fn is_active(&self) -> bool {
        !self.cancels.is_empty()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        for cancel in self.cancels.drain(..) {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("registrations", &self.cancels.len())
            .finish()
    }
}
