//! Requested modifications to the permission configuration.

use super::{CategorySelection, PermissionConfig, PermissionShape, PresetMode};
use crate::{Error, Result};

/// A runtime update request. At least one field must be set.
///
/// `skip_confirmation` selects the fine-grained shape and cannot be combined
/// with the preset fields in a single change.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PermissionChange {
    pub mode: Option<PresetMode>,
    pub confirm_queries: Option<CategorySelection>,
    pub skip_confirmation: Option<CategorySelection>,
}

impl PermissionChange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(mut self, mode: PresetMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn confirm_queries(mut self, selection: CategorySelection) -> Self {
        self.confirm_queries = Some(selection);
        self
    }

    pub fn skip_confirmation(mut self, selection: CategorySelection) -> Self {
        self.skip_confirmation = Some(selection);
        self
    }

    /// Parses raw tool arguments. Blank strings count as absent.
    pub fn parse(
        mode: Option<&str>,
        confirm_queries: Option<&str>,
        skip_confirmation: Option<&str>,
    ) -> Result<Self> {
        fn present(value: Option<&str>) -> Option<&str> {
            value.map(str::trim).filter(|v| !v.is_empty())
        }

        let mode = present(mode)
            .map(|m| m.parse::<PresetMode>())
            .transpose()
            .map_err(Error::InvalidChange)?;
        let confirm_queries = present(confirm_queries)
            .map(CategorySelection::parse)
            .transpose()
            .map_err(|e| Error::InvalidChange(format!("confirm_queries: {}", e)))?;
        let skip_confirmation = present(skip_confirmation)
            .map(CategorySelection::parse)
            .transpose()
            .map_err(|e| Error::InvalidChange(format!("skip_confirmation: {}", e)))?;

        Ok(Self {
            mode,
            confirm_queries,
            skip_confirmation,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.mode.is_none() && self.confirm_queries.is_none() && self.skip_confirmation.is_none()
    }

    /// Checks the change on its own, independent of the current config.
    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(Error::InvalidChange(
                "specify at least one of: mode, confirm_queries, skip_confirmation".into(),
            ));
        }
        if self.skip_confirmation.is_some()
            && (self.mode.is_some() || self.confirm_queries.is_some())
        {
            return Err(Error::InvalidChange(
                "skip_confirmation switches to fine-grained mode and cannot be combined with \
                 mode or confirm_queries"
                    .into(),
            ));
        }
        Ok(())
    }

    /// Builds the next config from `current`. Lockdown is carried over and
    /// the version is bumped.
    pub(crate) fn apply(&self, current: &PermissionConfig) -> Result<PermissionConfig> {
        self.validate()?;

        let next = if let Some(skip) = &self.skip_confirmation {
            PermissionConfig::fine_grained(skip.clone())
        } else {
            let (mode, overlay) = match (&current.shape, self.mode) {
                (PermissionShape::Preset { mode, confirm }, requested) => {
                    (requested.unwrap_or(*mode), confirm.clone())
                }
                (PermissionShape::FineGrained { .. }, Some(requested)) => {
                    (requested, CategorySelection::None)
                }
                (PermissionShape::FineGrained { .. }, None) => {
                    return Err(Error::InvalidChange(
                        "confirm_queries only applies to preset modes (readonly, readwrite, dba); \
                         currently in fine-grained mode, set mode as well to switch back"
                            .into(),
                    ));
                }
            };
            let confirm = self.confirm_queries.clone().unwrap_or(overlay);
            PermissionConfig::preset_with(mode, confirm)
        };

        Ok(next
            .with_lockdown(current.lockdown)
            .with_version(current.version + 1))
    }
}

impl std::fmt::Display for PermissionChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();
        if let Some(mode) = self.mode {
            parts.push(format!("mode={}", mode));
        }
        if let Some(confirm) = &self.confirm_queries {
            parts.push(format!("confirm_queries={}", confirm));
        }
        if let Some(skip) = &self.skip_confirmation {
            parts.push(format!("skip_confirmation={}", skip));
        }
        write!(f, "{}", parts.join(" "))
    }
}
