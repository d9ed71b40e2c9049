//! Category selections for confirmation overlays and skip lists.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::classifier::OperationCategory;

/// A set of categories, or one of the two special selections.
///
/// Textual input such as `"dml, ddl"`, `"all"` or `"none"` is resolved once
/// by [`CategorySelection::parse`]; nothing downstream sees sentinel strings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SelectionInput", into = "Vec<String>")]
pub enum CategorySelection {
    #[default]
    None,
    All,
    Explicit(BTreeSet<OperationCategory>),
}

impl CategorySelection {
    /// Builds an explicit selection. An empty set collapses to `None`.
    pub fn explicit(categories: impl IntoIterator<Item = OperationCategory>) -> Self {
        let set: BTreeSet<_> = categories.into_iter().collect();
        if set.is_empty() {
            Self::None
        } else {
            Self::Explicit(set)
        }
    }

    pub fn contains(&self, category: OperationCategory) -> bool {
        match self {
            Self::None => false,
            Self::All => true,
            Self::Explicit(set) => set.contains(&category),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Parses a comma-separated list.
    pub fn parse(input: &str) -> Result<Self, String> {
        Self::parse_items(input.split(','))
    }

    /// Parses individual items. Items are trimmed and case-insensitive;
    /// blanks are ignored. `all` and `none`/`disable` must stand alone.
    pub fn parse_items<I, S>(items: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let items: Vec<String> = items
            .into_iter()
            .map(|item| item.as_ref().trim().to_lowercase())
            .filter(|item| !item.is_empty())
            .collect();

        match items.as_slice() {
            [] => return Ok(Self::None),
            [single] if single == "all" => return Ok(Self::All),
            [single] if single == "none" || single == "disable" => return Ok(Self::None),
            _ => {}
        }

        if let Some(special) = items
            .iter()
            .find(|item| matches!(item.as_str(), "all" | "none" | "disable"))
        {
            return Err(format!(
                "'{}' cannot be combined with other categories",
                special
            ));
        }

        let categories = items
            .iter()
            .map(|item| item.parse::<OperationCategory>())
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Self::explicit(categories))
    }

    pub(crate) fn with(self, category: OperationCategory) -> Self {
        match self {
            Self::All => Self::All,
            Self::None => Self::explicit([category]),
            Self::Explicit(mut set) => {
                set.insert(category);
                Self::Explicit(set)
            }
        }
    }

    pub(crate) fn without(self, category: OperationCategory) -> Self {
        match self {
            Self::Explicit(mut set) => {
                set.remove(&category);
                Self::explicit(set)
            }
            other => other,
        }
    }

    /// Lowercase category names, or `["ALL"]`, or an empty list.
    pub fn to_strings(&self) -> Vec<String> {
        match self {
            Self::None => Vec::new(),
            Self::All => vec!["ALL".to_string()],
            Self::Explicit(set) => set.iter().map(|c| c.as_str().to_string()).collect(),
        }
    }
}

impl std::fmt::Display for CategorySelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::All => write!(f, "ALL"),
            Self::Explicit(_) => write!(f, "{}", self.to_strings().join(", ")),
        }
    }
}

impl std::str::FromStr for CategorySelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<CategorySelection> for Vec<String> {
    fn from(selection: CategorySelection) -> Self {
        selection.to_strings()
    }
}

/// Accepts either a JSON list or a comma-separated string.
#[derive(Deserialize)]
#[serde(untagged)]
enum SelectionInput {
    List(Vec<String>),
    Text(String),
}

impl TryFrom<SelectionInput> for CategorySelection {
    type Error = String;

    fn try_from(input: SelectionInput) -> Result<Self, Self::Error> {
        match input {
            SelectionInput::List(items) => Self::parse_items(items),
            SelectionInput::Text(text) => Self::parse(&text),
        }
    }
}
