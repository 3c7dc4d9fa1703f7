//! Static keyword shortcut for short text inputs.

use triage_config::GuardrailRules;
use triage_core::{format_confidence, DiseasePrediction};

/// Inputs at or above this many characters always go to the model.
pub const GUARDRAIL_MAX_CHARS: usize = 60;

const SIMPLE_MATCH_MARKER: &str = " (Simple Match)";

/// Matches short inputs against an ordered keyword list.
///
/// Matching is a case-insensitive substring test. Rules are tried in list
/// order and the first hit wins.
#[derive(Debug, Clone)]
pub struct GuardrailMatcher {
    /// `(lowercased keyword, disease)` in match order.
    rules: Vec<(String, String)>,
}

impl GuardrailMatcher {
    pub fn new(rules: &GuardrailRules) -> Self {
        Self {
            rules: rules
                .iter()
                .map(|r| (r.keyword.to_lowercase(), r.disease.clone()))
                .collect(),
        }
    }

    /// Returns true if `text` is short enough to be checked at all.
    pub fn applies_to(text: &str) -> bool {
        text.chars().count() < GUARDRAIL_MAX_CHARS
    }

    /// Returns the synthetic prediction for `text`, if a rule fires.
    pub fn check(&self, text: &str) -> Option<DiseasePrediction> {
        if !Self::applies_to(text) {
            return None;
        }

        let haystack = text.to_lowercase();
        self.rules
            .iter()
            .find(|(keyword, _)| haystack.contains(keyword.as_str()))
            .map(|(_, disease)| DiseasePrediction {
                disease: disease.clone(),
                confidence: format!("{}{}", format_confidence(1.0), SIMPLE_MATCH_MARKER),
            })
    }
}
