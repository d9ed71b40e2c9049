//! The live permission configuration value.

use serde::Serialize;

use super::{CategorySelection, PresetMode};
use crate::classifier::{FileDirection, OperationCategory};

/// Which of the two policy shapes is active.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PermissionShape {
    /// Preset allow-table plus a confirmation overlay.
    Preset {
        mode: PresetMode,
        confirm: CategorySelection,
    },
    /// Everything allowed; confirmation governed by a skip list.
    FineGrained { skip: CategorySelection },
}

/// Immutable permission policy.
///
/// Values are never mutated in place. Updates build a new value with a
/// higher `version` and swap it in through
/// [`PolicyManager`](super::PolicyManager).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PermissionConfig {
    pub shape: PermissionShape,
    /// Freezes the configuration until process restart.
    pub lockdown: bool,
    pub version: u64,
}

impl PermissionConfig {
    pub fn preset(mode: PresetMode) -> Self {
        Self::preset_with(mode, CategorySelection::None)
    }

    /// Preset shape with a confirmation overlay. SESSION is never confirmed
    /// and is dropped from the overlay.
    pub fn preset_with(mode: PresetMode, confirm: CategorySelection) -> Self {
        Self {
            shape: PermissionShape::Preset {
                mode,
                confirm: confirm.without(OperationCategory::Session),
            },
            lockdown: false,
            version: 0,
        }
    }

    /// Fine-grained shape. SESSION is always part of an explicit skip list.
    pub fn fine_grained(skip: CategorySelection) -> Self {
        let skip = match skip {
            CategorySelection::Explicit(_) => skip.with(OperationCategory::Session),
            other => other,
        };
        Self {
            shape: PermissionShape::FineGrained { skip },
            lockdown: false,
            version: 0,
        }
    }

    pub fn with_lockdown(mut self, lockdown: bool) -> Self {
        self.lockdown = lockdown;
        self
    }

    pub(crate) fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    pub fn preset_mode(&self) -> Option<PresetMode> {
        match &self.shape {
            PermissionShape::Preset { mode, .. } => Some(*mode),
            PermissionShape::FineGrained { .. } => None,
        }
    }

    pub fn is_fine_grained(&self) -> bool {
        matches!(self.shape, PermissionShape::FineGrained { .. })
    }

    pub fn is_locked_down(&self) -> bool {
        self.lockdown
    }

    /// `readonly`, `readwrite`, `dba` or `fine-grained`.
    pub fn mode_label(&self) -> String {
        match &self.shape {
            PermissionShape::Preset { mode, .. } => mode.to_string(),
            PermissionShape::FineGrained { .. } => "fine-grained".to_string(),
        }
    }

    pub fn confirm_queries(&self) -> CategorySelection {
        match &self.shape {
            PermissionShape::Preset { confirm, .. } => confirm.clone(),
            PermissionShape::FineGrained { .. } => CategorySelection::None,
        }
    }

    /// Skip list as reported; SESSION is listed even when nothing else is.
    pub fn skip_confirmation(&self) -> Vec<String> {
        match &self.shape {
            PermissionShape::Preset { .. } => Vec::new(),
            PermissionShape::FineGrained {
                skip: CategorySelection::None,
            } => vec![OperationCategory::Session.as_str().to_string()],
            PermissionShape::FineGrained { skip } => skip.to_strings(),
        }
    }

    /// Categories that pass the allow check, FILE split by direction.
    pub fn allowed_categories(&self) -> Vec<String> {
        self.partition_categories().0
    }

    pub fn blocked_categories(&self) -> Vec<String> {
        self.partition_categories().1
    }

    fn partition_categories(&self) -> (Vec<String>, Vec<String>) {
        let mode = match &self.shape {
            PermissionShape::Preset { mode, .. } => *mode,
            PermissionShape::FineGrained { .. } => PresetMode::Dba,
        };

        let mut allowed = Vec::new();
        let mut blocked = Vec::new();
        for category in OperationCategory::ALL {
            if category == OperationCategory::File {
                for direction in [FileDirection::Export, FileDirection::Import] {
                    let label = format!("file_{}", direction);
                    if mode.allows(category, Some(direction)) {
                        allowed.push(label);
                    } else {
                        blocked.push(label);
                    }
                }
            } else if mode.allows(category, None) {
                allowed.push(category.as_str().to_string());
            } else {
                blocked.push(category.as_str().to_string());
            }
        }
        (allowed, blocked)
    }

    /// One-paragraph description for status output.
    pub fn summary(&self) -> String {
        let mut summary = match &self.shape {
            PermissionShape::Preset { mode, confirm } => {
                let confirm = match confirm {
                    CategorySelection::None => "none".to_string(),
                    CategorySelection::All => "all allowed operations except SESSION".to_string(),
                    explicit => explicit.to_string(),
                };
                format!(
                    "Preset mode '{}': {}. Confirmation required for: {}.",
                    mode,
                    mode.description(),
                    confirm
                )
            }
            PermissionShape::FineGrained { skip } => {
                let skipped = match skip {
                    CategorySelection::All => "all operations".to_string(),
                    CategorySelection::None => "session only".to_string(),
                    explicit => explicit.to_string(),
                };
                format!(
                    "Fine-grained mode: all operations allowed. Confirmation skipped for: {}.",
                    skipped
                )
            }
        };

        if self.lockdown {
            summary.push_str(" Runtime permission changes are disabled (lockdown).");
        }
        summary
    }

    /// Serializable view used by the status tool.
    pub fn status(&self) -> PermissionStatus {
        PermissionStatus {
            mode: if self.is_fine_grained() {
                "fine-grained"
            } else {
                "preset"
            },
            preset_mode: self.preset_mode(),
            confirm_queries: self.confirm_queries().to_strings(),
            skip_confirmation: self.skip_confirmation(),
            disable_runtime_permission_changes: self.lockdown,
            version: self.version,
            allowed_categories: self.allowed_categories(),
            blocked_categories: self.blocked_categories(),
            summary: self.summary(),
        }
    }
}

impl Default for PermissionConfig {
    fn default() -> Self {
        Self::preset(PresetMode::Readonly)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct PermissionStatus {
    pub mode: &'static str,
    pub preset_mode: Option<PresetMode>,
    pub confirm_queries: Vec<String>,
    pub skip_confirmation: Vec<String>,
    pub disable_runtime_permission_changes: bool,
    pub version: u64,
    pub allowed_categories: Vec<String>,
    pub blocked_categories: Vec<String>,
    pub summary: String,
}
