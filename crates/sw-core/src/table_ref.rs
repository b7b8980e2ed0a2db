//! Fully qualified warehouse table references (`project.dataset.table`).
//!
//! A project maps to a warehouse catalog, a dataset to a schema. Project ids
//! may themselves contain dots (domain-scoped projects), so parsing splits
//! from the right.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TableRef {
    pub project: String,
    pub dataset: String,
    pub table: String,
}

impl TableRef {
    #[must_use]
    pub fn new(project: &str, dataset: &str, table: &str) -> Self {
        Self {
            project: project.to_string(),
            dataset: dataset.to_string(),
            table: table.to_string(),
        }
    }

    /// Parse `project.dataset.table`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidTableRef`] if any of the three parts is missing or empty.
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        let mut parts = input.trim().rsplitn(3, '.');
        let table = parts.next().unwrap_or_default();
        let dataset = parts.next().unwrap_or_default();
        let project = parts.next().unwrap_or_default();

        if [project, dataset, table].iter().any(|part| part.is_empty()) {
            return Err(CoreError::InvalidTableRef(input.to_string()));
        }

        Ok(Self::new(project, dataset, table))
    }

    /// SQL form with every part quoted: `"project"."dataset"."table"`.
    #[must_use]
    pub fn quoted(&self) -> String {
        format!(
            "{}.{}.{}",
            quote_ident(&self.project),
            quote_ident(&self.dataset),
            quote_ident(&self.table)
        )
    }
}

/// Quote a SQL identifier, doubling embedded quotes.
#[must_use]
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.project, self.dataset, self.table)
    }
}

impl FromStr for TableRef {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TableRef {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TableRef> for String {
    fn from(value: TableRef) -> Self {
        value.to_string()
    }
}
