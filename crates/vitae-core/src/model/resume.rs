//! Resume representation with typed sections.
//!
//! Multiple section shapes coexist in stored resumes, so sections are a
//! tagged union with an [`ResumeSection::Unknown`] residual variant that
//! preserves unrecognized shapes instead of dropping them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single resume section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResumeSection {
    Summary {
        text: String,
    },
    Experience {
        company: String,
        title: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        start: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        end: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        highlights: Vec<String>,
    },
    Education {
        institution: String,
        degree: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        year: Option<String>,
    },
    Skills {
        #[serde(default)]
        items: Vec<String>,
    },
    Projects {
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        highlights: Vec<String>,
    },
    /// Forward-compatibility escape hatch for section shapes this build does
    /// not model.
    #[serde(untagged)]
    Unknown(HashMap<String, Value>),
}

/// A stored resume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resume {
    /// Stable resume identifier.
    pub id: String,
    /// Candidate display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Contact email.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Ordered sections.
    #[serde(default)]
    pub sections: Vec<ResumeSection>,
}

impl Resume {
    /// Creates an empty resume with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            email: None,
            sections: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_sections_survive_round_trips() -> anyhow::Result<()> {
        let json = serde_json::json!({
            "id": "res_1",
            "sections": [
                {"type": "summary", "text": "Systems engineer."},
                {"certification": "CKA", "issued": "2024"}
            ]
        });

        let resume: Resume = serde_json::from_value(json.clone())?;
        assert_eq!(resume.sections.len(), 2);
        assert!(matches!(resume.sections[0], ResumeSection::Summary { .. }));
        assert!(matches!(resume.sections[1], ResumeSection::Unknown(_)));

        let back = serde_json::to_value(&resume)?;
        assert_eq!(back["sections"][1]["certification"], "CKA");
        Ok(())
    }
}
