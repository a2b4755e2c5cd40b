use serde::{ Deserialize, Serialize };
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PracticeType {
    Cosmetic,
    Dental,
    Wellness,
    HealthcareGeneral,
    /// Assigned to synthetic leads built without any page content.
    HealthcareBasic,
}

impl PracticeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PracticeType::Cosmetic => "cosmetic",
            PracticeType::Dental => "dental",
            PracticeType::Wellness => "wellness",
            PracticeType::HealthcareGeneral => "healthcare-general",
            PracticeType::HealthcareBasic => "healthcare-basic",
        }
    }

    /// Lenient parse used for LLM output; unknown labels yield `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().replace(['_', ' '], "-").as_str() {
            "cosmetic" | "aesthetic" => Some(PracticeType::Cosmetic),
            "dental" => Some(PracticeType::Dental),
            "wellness" => Some(PracticeType::Wellness),
            "healthcare-general" | "general" => Some(PracticeType::HealthcareGeneral),
            "healthcare-basic" => Some(PracticeType::HealthcareBasic),
            _ => None,
        }
    }
}

impl fmt::Display for PracticeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A candidate healthcare business extracted from a practice URL or a search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub company: String,
    pub website: String,
    pub services: Vec<String>,
    pub treatments: Vec<String>,
    pub specializations: Vec<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub location: Option<String>,
    pub practice_type: PracticeType,
    pub lead_score: u8,
    /// False for synthetic fallback records.
    pub enriched: bool,
}
