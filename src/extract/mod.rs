//! Regex based field extraction for healthcare practice pages.
//!
//! Every extractor walks an ordered list of patterns and keeps the first
//! match(es). There is no confidence scoring: first match wins.

pub mod score;
pub mod structured;

use crate::models::lead::{ Lead, PracticeType };
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use url::Url;

pub use score::{ calculate_lead_score, LeadSignals, ScoreWeights };

pub const MAX_SERVICES: usize = 5;
pub const MAX_TREATMENTS: usize = 5;
pub const MAX_SPECIALIZATIONS: usize = 3;
const MAX_SERVICE_CHARS: usize = 100;
const FALLBACK_COMPANY: &str = "Unknown Practice";

lazy_static! {
    static ref SERVICE_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)(?:we offer|our services|services include|we provide)[^.!?]*[.!?]").unwrap(),
        Regex::new(
            r"(?i)(?:cosmetic|aesthetic|medical|dental|surgical)\s+(?:services?|procedures?|treatments?)"
        ).unwrap()
    ];
    static ref TREATMENT_PATTERNS: Vec<Regex> = vec![
        Regex::new(
            r"(?i)(?:botox|dermal fillers?|laser therapy|chemical peels?|microneedling|coolsculpting)"
        ).unwrap(),
        Regex::new(r"(?i)(?:facelift|rhinoplasty|breast augmentation|liposuction|tummy tuck)").unwrap(),
        Regex::new(
            r"(?i)\b(?:injectables|huidtherapie|huidverjonging|tandbleken|filler behandelingen?)\b"
        ).unwrap()
    ];
    static ref SPECIALIZATION_PATTERNS: Vec<Regex> = vec![
        Regex::new(
            r"(?i)(?:cosmetic surgery|plastic surgery|aesthetic medicine|dermatology|wellness)"
        ).unwrap(),
        Regex::new(r"(?i)(?:orthodontics|dentistry|physiotherapy|dermatologie)").unwrap()
    ];
    static ref PHONE_PATTERNS: Vec<Regex> = vec![
        // North American numbers, optional +1 prefix.
        Regex::new(r"(?:\+?1[-.\s]?)?\(?[0-9]{3}\)?[-.\s]?[0-9]{3}[-.\s]?[0-9]{4}").unwrap(),
        // Dutch numbers such as "020 214 62 50" or "+31 20 2157338".
        Regex::new(r"(?:\+31\s?|0)[1-9](?:[\s-]*[0-9]){8}").unwrap()
    ];
    static ref EMAIL_PATTERN: Regex = Regex::new(
        r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}"
    ).unwrap();
    static ref LOCATION_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)(?:located in|based in|serving|gevestigd in)\s+([^,.!?\n]+)").unwrap(),
        Regex::new(r"([A-Z][a-z]+,\s*[A-Z]{2})").unwrap()
    ];
    static ref COSMETIC_PATTERN: Regex = Regex::new(r"(?i)cosmetic|aesthetic|plastic surgery").unwrap();
    static ref DENTAL_PATTERN: Regex = Regex::new(r"(?i)dental|dentist").unwrap();
    static ref WELLNESS_PATTERN: Regex = Regex::new(r"(?i)wellness|\bspa\b").unwrap();
}

/// Collects every match of every pattern, in pattern order, dropping
/// case-insensitive duplicates and stopping at `limit`.
fn collect_matches<F>(text: &str, patterns: &[Regex], limit: usize, keep: F) -> Vec<String>
    where F: Fn(&str) -> bool
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for pattern in patterns {
        for m in pattern.find_iter(text) {
            let candidate = m.as_str().trim();
            if candidate.is_empty() || !keep(candidate) {
                continue;
            }
            if seen.insert(candidate.to_lowercase()) {
                out.push(candidate.to_string());
                if out.len() == limit {
                    return out;
                }
            }
        }
    }
    out
}

pub fn extract_services(text: &str) -> Vec<String> {
    collect_matches(text, &SERVICE_PATTERNS, MAX_SERVICES, |s| s.chars().count() < MAX_SERVICE_CHARS)
}

pub fn extract_treatments(text: &str) -> Vec<String> {
    collect_matches(text, &TREATMENT_PATTERNS, MAX_TREATMENTS, |_| true)
}

pub fn extract_specializations(text: &str) -> Vec<String> {
    collect_matches(text, &SPECIALIZATION_PATTERNS, MAX_SPECIALIZATIONS, |_| true)
}

pub fn extract_phone(text: &str) -> Option<String> {
    PHONE_PATTERNS.iter()
        .find_map(|p| p.find(text))
        .map(|m| m.as_str().trim().to_string())
}

pub fn extract_email(text: &str) -> Option<String> {
    EMAIL_PATTERN.find(text).map(|m| m.as_str().to_string())
}

pub fn extract_location(text: &str) -> Option<String> {
    LOCATION_PATTERNS.iter()
        .filter_map(|p| p.captures(text))
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().trim().to_string()))
        .find(|loc| !loc.is_empty())
}

pub fn determine_practice_type(text: &str) -> PracticeType {
    if COSMETIC_PATTERN.is_match(text) {
        PracticeType::Cosmetic
    } else if DENTAL_PATTERN.is_match(text) {
        PracticeType::Dental
    } else if WELLNESS_PATTERN.is_match(text) {
        PracticeType::Wellness
    } else {
        PracticeType::HealthcareGeneral
    }
}

/// "www.smith-aesthetics.com" -> "Smith Aesthetics"
pub fn company_from_hostname(hostname: &str) -> String {
    let host = hostname.strip_prefix("www.").unwrap_or(hostname);
    let label = host.split('.').next().unwrap_or(host);
    let company = label
        .replace('-', " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(c) => format!("{}{}", c.to_uppercase(), chars.as_str()),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ");

    if company.is_empty() {
        FALLBACK_COMPANY.to_string()
    } else {
        company
    }
}

pub fn company_from_url(url: &Url) -> String {
    company_from_hostname(url.host_str().unwrap_or_default())
}

/// Runs every extractor over `content` and scores the result.
pub fn extract_lead(content: &str, website: &str, company: &str, weights: &ScoreWeights) -> Lead {
    let mut lead = Lead {
        company: company.to_string(),
        website: website.to_string(),
        services: extract_services(content),
        treatments: extract_treatments(content),
        specializations: extract_specializations(content),
        phone: extract_phone(content),
        email: extract_email(content),
        location: extract_location(content),
        practice_type: determine_practice_type(content),
        lead_score: 0,
        enriched: true,
    };
    lead.lead_score = calculate_lead_score(&LeadSignals::from_lead(&lead), weights);
    lead
}

/// Synthetic record used whenever search content is unavailable.
pub fn fallback_lead(url: &Url) -> Lead {
    Lead {
        company: company_from_url(url),
        website: url.to_string(),
        services: vec!["Healthcare Services".to_string()],
        treatments: vec!["Consultation".to_string()],
        specializations: vec!["General Healthcare".to_string()],
        phone: None,
        email: None,
        location: None,
        practice_type: PracticeType::HealthcareBasic,
        lead_score: 30,
        enriched: false,
    }
}
