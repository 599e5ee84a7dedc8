//! Extracted job posting representation.

use serde::{Deserialize, Serialize};

/// Salary range attached to a posting, when the source disclosed one.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Salary {
    /// Lower bound in the posting's currency.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<u64>,
    /// Upper bound in the posting's currency.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<u64>,
    /// ISO 4217 currency code when stated, e.g. `USD`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

/// A job posting extracted from a URL or a pasted description.
///
/// Fields the extraction engine could not resolve stay `None`; the cleaned
/// description is always present.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    /// Job title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Hiring company.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    /// Location as stated by the posting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Cleaned, plain-text description body.
    pub description: String,
    /// Individual requirement lines, when the source structure exposed them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requirements: Vec<String>,
    /// Salary range, when disclosed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary: Option<Salary>,
    /// Canonical source URL, absent for description-based extraction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}
