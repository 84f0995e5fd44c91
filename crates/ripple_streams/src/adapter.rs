//! Host framework adapter
//!
//! The host UI framework registers its hooks once at application
//! bootstrap, typically from a module constructor. Installation is
//! idempotent and guarded by a single-assignment cell; a second install
//! leaves the first hooks in place.
//!
//! The one integration the hooks currently carry is the
//! change-detection trigger: [`HostAdapter::forward_dispatches`]
//! subscribes a store's dispatch side channel and invokes the trigger
//! on every labeled mutation, so external dispatches (devtools,
//! imported actions) re-run the host's update tick.

use std::fmt;
use std::sync::{Arc, OnceLock};

use ripple_core::{Store, Subscription};

/// Hooks supplied by the host framework
#[derive(Clone)]
pub struct HostHooks {
    /// Re-run the host framework's change-detection tick
    pub change_tick: Arc<dyn Fn() + Send + Sync>,
}

impl fmt::Debug for HostHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostHooks").finish_non_exhaustive()
    }
}

/// Global adapter singleton
static HOST_ADAPTER: OnceLock<HostAdapter> = OnceLock::new();

/// Process-wide registration of host framework hooks
#[derive(Debug)]
pub struct HostAdapter {
    hooks: HostHooks,
}

impl HostAdapter {
    /// Install the host hooks
    ///
    /// Call once at application bootstrap. Re-installing is a no-op;
    /// the first hooks stay in place.
    pub fn install(hooks: HostHooks) {
        if HOST_ADAPTER.set(HostAdapter { hooks }).is_err() {
            tracing::debug!("host adapter already installed");
        }
    }

    /// Get the installed adapter
    ///
    /// # Panics
    ///
    /// Panics if [`HostAdapter::install`] has not been called.
    pub fn get() -> &'static HostAdapter {
        HOST_ADAPTER
            .get()
            .expect("host adapter not installed. Call HostAdapter::install() at app startup.")
    }

    /// Get the installed adapter, if any
    pub fn try_get() -> Option<&'static HostAdapter> {
        HOST_ADAPTER.get()
    }

    /// Whether hooks have been installed
    pub fn is_installed() -> bool {
        HOST_ADAPTER.get().is_some()
    }

    /// Invoke the host's change-detection trigger
    pub fn change_tick(&self) {
        (self.hooks.change_tick)();
    }

    /// Forward every labeled mutation of `store` into the host's
    /// change-detection trigger
    pub fn forward_dispatches<S: Clone + Send + Sync + 'static>(
        &self,
        store: &Store<S>,
    ) -> Subscription {
        let tick = self.hooks.change_tick.clone();
        store.on_dispatch(move |dispatch| {
            tracing::trace!(
                label = dispatch.label.as_str(),
                version = dispatch.version,
                "forwarding dispatch to host tick"
            );
            tick();
        })
    }
}
