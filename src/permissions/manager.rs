//! Owner of the live permission configuration.

use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;

use super::{PermissionChange, PermissionConfig};
use crate::{Error, Result};

/// Holds the current [`PermissionConfig`] behind an atomic pointer.
///
/// Readers call [`snapshot`](Self::snapshot) without locking and keep the
/// returned value for the rest of their evaluation. Writers are serialized
/// and publish a complete new config with a single swap.
pub struct PolicyManager {
    current: ArcSwap<PermissionConfig>,
    write_lock: Mutex<()>,
}

impl PolicyManager {
    pub fn new(initial: PermissionConfig) -> Self {
        Self {
            current: ArcSwap::from_pointee(initial),
            write_lock: Mutex::new(()),
        }
    }

    pub fn snapshot(&self) -> Arc<PermissionConfig> {
        self.current.load_full()
    }

    pub fn is_locked_down(&self) -> bool {
        self.current.load().lockdown
    }

    /// Applies `change` after the lockdown and user-confirmation gates.
    ///
    /// Lockdown is checked first, so a locked-down manager always answers
    /// [`Error::LockedDown`].
    pub fn update(
        &self,
        change: &PermissionChange,
        user_confirmed: bool,
    ) -> Result<Arc<PermissionConfig>> {
        let _guard = self.write_lock.lock();
        let current = self.current.load_full();

        if current.lockdown {
            tracing::warn!(change = %change, "Permission update refused: lockdown is active");
            return Err(Error::LockedDown);
        }

        if !user_confirmed {
            tracing::warn!(change = %change, "Permission update refused: user confirmation missing");
            return Err(Error::ConfirmationRequired);
        }

        let next = Arc::new(change.apply(&current)?);
        self.current.store(Arc::clone(&next));

        tracing::info!(
            change = %change,
            from = %current.mode_label(),
            to = %next.mode_label(),
            version = next.version,
            "Permission configuration updated"
        );

        Ok(next)
    }
}

impl Default for PolicyManager {
    fn default() -> Self {
        Self::new(PermissionConfig::default())
    }
}

impl std::fmt::Debug for PolicyManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyManager")
            .field("current", &self.current.load_full())
            .finish()
    }
}
