//! Per-person aggregated results.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::extraction::cleaner::format_amount;

/// Remark attached to an agent once aggregation is finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Observation {
    /// Name, first name and at least one amount were found.
    #[default]
    None,
    /// Name or first name could not be read.
    Unreadable,
    /// The person was identified but no positive amount was attached.
    NoAmountFound,
}

impl Observation {
    /// Text written in the OBSERVATIONS column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Observation::None => "",
            Observation::Unreadable => "UNREADABLE",
            Observation::NoAmountFound => "NO AMOUNT FOUND",
        }
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything extracted for one person in a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSummary {
    /// Normalized `name_firstname` key.
    pub key: String,
    pub name: String,
    pub first_name: String,
    /// Amounts in extraction order.
    pub amounts: Vec<Decimal>,
    /// Sum of `amounts`.
    pub total: Decimal,
    /// Pages that contributed, ascending.
    pub pages: Vec<u32>,
    pub observation: Observation,
}

impl AgentSummary {
    /// Flatten into the spreadsheet row layout.
    pub fn export_row(&self) -> ExportRow {
        ExportRow {
            name: self.name.clone(),
            first_name: self.first_name.clone(),
            total: format_amount(self.total),
            amounts: self
                .amounts
                .iter()
                .map(|a| format_amount(*a))
                .collect::<Vec<_>>()
                .join(", "),
            pages: self
                .pages
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join(", "),
            observations: self.observation.as_str().to_string(),
        }
    }
}

/// One exported row: NAME, FIRSTNAME, TOTAL, AMOUNTS, PAGES, OBSERVATIONS.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ExportRow {
    pub name: String,
    #[serde(rename = "FIRSTNAME")]
    pub first_name: String,
    pub total: String,
    pub amounts: String,
    pub pages: String,
    pub observations: String,
}

impl ExportRow {
    pub const HEADERS: [&'static str; 6] =
        ["NAME", "FIRSTNAME", "TOTAL", "AMOUNTS", "PAGES", "OBSERVATIONS"];

    pub fn as_record(&self) -> [&str; 6] {
        [
            &self.name,
            &self.first_name,
            &self.total,
            &self.amounts,
            &self.pages,
            &self.observations,
        ]
    }
}

/// Output of one document run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProcessingResult {
    /// Agents sorted by display name.
    pub agents: Vec<AgentSummary>,
    /// Distinct pages whose text layer was read.
    pub processed_pages: u32,
    /// Pages in the document.
    pub total_pages: u32,
}

/// Outcome of one document inside a batch.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentOutcome {
    /// Caller-supplied document name (usually the file name).
    pub name: String,
    #[serde(flatten)]
    pub status: DocumentStatus,
}

/// Whether a batch document was processed.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DocumentStatus {
    Processed { result: ProcessingResult },
    Failed { error: String },
}

/// Output of a batch run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchResult {
    /// One entry per input document, in input order.
    pub documents: Vec<DocumentOutcome>,
}

impl BatchResult {
    /// Agents of every processed document, document by document.
    pub fn agents(&self) -> impl Iterator<Item = &AgentSummary> {
        self.documents.iter().flat_map(|doc| match &doc.status {
            DocumentStatus::Processed { result } => result.agents.as_slice(),
            DocumentStatus::Failed { .. } => [].as_slice(),
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.documents.iter().filter_map(|doc| match &doc.status {
            DocumentStatus::Failed { error } => Some((doc.name.as_str(), error.as_str())),
            DocumentStatus::Processed { .. } => None,
        })
    }

    pub fn processed_count(&self) -> usize {
        self.documents
            .iter()
            .filter(|doc| matches!(doc.status, DocumentStatus::Processed { .. }))
            .count()
    }
}
