//! Parsing of structured lead fields returned by the LLM.

use super::{ calculate_lead_score, LeadSignals, ScoreWeights };
use super::{ MAX_SERVICES, MAX_SPECIALIZATIONS, MAX_TREATMENTS };
use crate::models::lead::{ Lead, PracticeType };
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExtractedFields {
    pub company: Option<String>,
    pub services: Vec<String>,
    pub treatments: Vec<String>,
    pub specializations: Vec<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub location: Option<String>,
    pub practice_type: Option<String>,
}

/// Cuts the outermost `{...}` object out of a reply that may wrap it in prose or code fences.
pub fn extract_json_payload(raw: &str) -> Option<&str> {
    let text = raw.trim();
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end > start {
        Some(&text[start..=end])
    } else {
        None
    }
}

pub fn parse_extracted_fields(raw: &str) -> Option<ExtractedFields> {
    let payload = extract_json_payload(raw)?;
    serde_json::from_str(payload).ok()
}

fn cleaned(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let t = v.trim();
        if t.is_empty() || t.eq_ignore_ascii_case("null") || t.eq_ignore_ascii_case("unknown") {
            None
        } else {
            Some(t.to_string())
        }
    })
}

fn cleaned_list(values: Vec<String>, limit: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for v in values {
        let t = v.trim();
        if t.is_empty() || out.iter().any(|o| o.eq_ignore_ascii_case(t)) {
            continue;
        }
        out.push(t.to_string());
        if out.len() == limit {
            break;
        }
    }
    out
}

/// Overrides regex results with every non-empty LLM field, then rescores.
pub fn merge_into(lead: &mut Lead, fields: ExtractedFields, weights: &ScoreWeights) {
    if let Some(company) = cleaned(fields.company) {
        lead.company = company;
    }
    let services = cleaned_list(fields.services, MAX_SERVICES);
    if !services.is_empty() {
        lead.services = services;
    }
    let treatments = cleaned_list(fields.treatments, MAX_TREATMENTS);
    if !treatments.is_empty() {
        lead.treatments = treatments;
    }
    let specializations = cleaned_list(fields.specializations, MAX_SPECIALIZATIONS);
    if !specializations.is_empty() {
        lead.specializations = specializations;
    }
    if let Some(phone) = cleaned(fields.phone) {
        lead.phone = Some(phone);
    }
    if let Some(email) = cleaned(fields.email).filter(|e| e.contains('@')) {
        lead.email = Some(email);
    }
    if let Some(location) = cleaned(fields.location) {
        lead.location = Some(location);
    }
    if let Some(practice_type) = fields.practice_type.as_deref().and_then(PracticeType::from_label) {
        lead.practice_type = practice_type;
    }
    lead.lead_score = calculate_lead_score(&LeadSignals::from_lead(lead), weights);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract_lead;

    #[test]
    fn payload_is_recovered_from_fenced_reply() {
        let raw = "Sure! Here is the data:\n```json\n{\"company\": \"Oran Aesthetics\"}\n```";
        assert_eq!(extract_json_payload(raw), Some("{\"company\": \"Oran Aesthetics\"}"));
        assert_eq!(extract_json_payload("no json at all"), None);
        assert_eq!(extract_json_payload("} backwards {"), None);
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let fields = parse_extracted_fields(r#"{"phone": "020 2157338"}"#).unwrap();
        assert_eq!(fields.phone.as_deref(), Some("020 2157338"));
        assert!(fields.services.is_empty());
        assert!(fields.company.is_none());
    }

    #[test]
    fn merge_overrides_non_empty_fields_and_rescores() {
        let mut lead = extract_lead(
            "A clinic.",
            "https://oranaesthetics.nl/en/",
            "Oranaesthetics",
            &ScoreWeights::URL_AUDIT
        );
        assert_eq!(lead.lead_score, 50);

        let fields = parse_extracted_fields(
            r#"{
                "company": "Oran Aesthetics",
                "services": ["Skin improvement", " ", "skin improvement"],
                "treatments": ["Botox", "Filler"],
                "email": "info@oranaesthetics.nl",
                "location": "unknown",
                "practice_type": "aesthetic"
            }"#
        ).unwrap();
        merge_into(&mut lead, fields, &ScoreWeights::URL_AUDIT);

        assert_eq!(lead.company, "Oran Aesthetics");
        assert_eq!(lead.services, vec!["Skin improvement"]);
        assert_eq!(lead.treatments, vec!["Botox", "Filler"]);
        assert_eq!(lead.location, None);
        assert_eq!(lead.practice_type, PracticeType::Cosmetic);
        // 50 + 5 + 6 + 15
        assert_eq!(lead.lead_score, 76);
    }
}
