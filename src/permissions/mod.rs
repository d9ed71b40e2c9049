//! Permission policy: preset modes, confirmation overlays and runtime updates.

mod change;
mod config;
mod manager;
mod modes;
mod rules;
mod selection;

pub use change::PermissionChange;
pub use config::{PermissionConfig, PermissionShape, PermissionStatus};
pub use manager::PolicyManager;
pub use modes::PresetMode;
pub use rules::{Decision, Denial};
pub use selection::CategorySelection;

use crate::classifier::OperationCategory;

/// Skip list to suggest when an agent keeps hitting confirmations under
/// `mode`: everything the preset allows.
pub fn suggested_skip_list(mode: PresetMode) -> Vec<OperationCategory> {
    mode.allowed_categories().to_vec()
}
