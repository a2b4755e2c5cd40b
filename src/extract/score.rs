use crate::models::lead::Lead;

pub const MAX_SCORE: u32 = 100;

/// Additive weights for the lead score heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreWeights {
    pub base: u32,
    pub per_service: u32,
    pub service_cap: u32,
    pub per_treatment: u32,
    pub treatment_cap: u32,
    /// Added once when a phone or an email is present.
    pub any_contact: u32,
    pub phone: u32,
    pub email: u32,
    pub location: u32,
}

impl ScoreWeights {
    /// Leads built from a practice URL submitted by a user.
    pub const URL_AUDIT: ScoreWeights = ScoreWeights {
        base: 50,
        per_service: 5,
        service_cap: 25,
        per_treatment: 3,
        treatment_cap: 20,
        any_contact: 15,
        phone: 0,
        email: 0,
        location: 0,
    };

    /// Leads built from chat search hits, where contact details carry more weight.
    pub const SEARCH_RESULT: ScoreWeights = ScoreWeights {
        base: 30,
        per_service: 5,
        service_cap: 20,
        per_treatment: 3,
        treatment_cap: 15,
        any_contact: 0,
        phone: 15,
        email: 10,
        location: 10,
    };
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LeadSignals {
    pub services: usize,
    pub treatments: usize,
    pub has_phone: bool,
    pub has_email: bool,
    pub has_location: bool,
}

impl LeadSignals {
    pub fn from_lead(lead: &Lead) -> Self {
        Self {
            services: lead.services.len(),
            treatments: lead.treatments.len(),
            has_phone: lead.phone.is_some(),
            has_email: lead.email.is_some(),
            has_location: lead.location.is_some(),
        }
    }
}

fn capped(count: usize, per_item: u32, cap: u32) -> u32 {
    let count = u32::try_from(count).unwrap_or(u32::MAX);
    count.saturating_mul(per_item).min(cap)
}

/// Weighted sum of the lead signals, clipped to `0..=100`.
pub fn calculate_lead_score(signals: &LeadSignals, weights: &ScoreWeights) -> u8 {
    let mut score = weights.base;
    score = score.saturating_add(capped(signals.services, weights.per_service, weights.service_cap));
    score = score.saturating_add(
        capped(signals.treatments, weights.per_treatment, weights.treatment_cap)
    );
    if signals.has_phone || signals.has_email {
        score = score.saturating_add(weights.any_contact);
    }
    if signals.has_phone {
        score = score.saturating_add(weights.phone);
    }
    if signals.has_email {
        score = score.saturating_add(weights.email);
    }
    if signals.has_location {
        score = score.saturating_add(weights.location);
    }
    score.min(MAX_SCORE) as u8
}
