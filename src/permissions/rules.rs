//! Policy evaluation.

use serde::Serialize;

use super::{PermissionConfig, PermissionShape, PresetMode};
use crate::classifier::{FileDirection, OperationCategory};

/// Outcome of evaluating one operation category against a config.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied(Denial),
    NeedsConfirmation,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Denied(_))
    }

    pub fn needs_confirmation(&self) -> bool {
        matches!(self, Self::NeedsConfirmation)
    }
}

/// Why an operation fell outside the preset's allow table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Denial {
    pub category: OperationCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<FileDirection>,
    pub mode: PresetMode,
    pub suggested: Option<PresetMode>,
}

impl Denial {
    fn subject(&self) -> String {
        match (self.category, self.direction) {
            (OperationCategory::File, Some(FileDirection::Export)) => "FILE export".to_string(),
            (OperationCategory::File, _) => "FILE import".to_string(),
            (category, _) => category.to_string(),
        }
    }
}

impl std::fmt::Display for Denial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} operations are not allowed in {} mode",
            self.subject(),
            self.mode
        )?;
        if let Some(suggested) = self.suggested {
            write!(f, "; consider {} mode", suggested)?;
        }
        Ok(())
    }
}

impl PermissionConfig {
    /// Evaluates a category against this snapshot.
    ///
    /// SESSION is always allowed. Everything else must pass the allow table
    /// first; confirmation only applies to allowed operations.
    pub fn evaluate(
        &self,
        category: OperationCategory,
        direction: Option<FileDirection>,
    ) -> Decision {
        if category.is_session() {
            return Decision::Allowed;
        }

        match &self.shape {
            PermissionShape::Preset { mode, confirm } => {
                if !mode.allows(category, direction) {
                    return Decision::Denied(Denial {
                        category,
                        direction,
                        mode: *mode,
                        suggested: mode.next(),
                    });
                }
                if confirm.contains(category) {
                    Decision::NeedsConfirmation
                } else {
                    Decision::Allowed
                }
            }
            PermissionShape::FineGrained { skip } => {
                if skip.contains(category) {
                    Decision::Allowed
                } else {
                    Decision::NeedsConfirmation
                }
            }
        }
    }
}
