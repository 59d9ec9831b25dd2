//! Tunable constants for the claim-analysis pipeline.

use serde::{Deserialize, Serialize};

/// A named fallacy with the phrase cues that indicate it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FallacyPattern {
    pub name: String,
    pub cues: Vec<String>,
}

impl FallacyPattern {
    fn new(name: &str, cues: &[&str]) -> Self {
        Self {
            name: name.to_owned(),
            cues: cues.iter().map(|c| (*c).to_owned()).collect(),
        }
    }
}

/// Shared configuration for every pipeline unit and router.
///
/// One instance is built per graph and handed to each consumer behind an
/// `Arc`, so thresholds used in several places (the low-credibility cutoff
/// feeds both the bypass router and the verdict tiers) are defined once.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Scores below this mark a known disinformation source.
    pub low_credibility_threshold: i64,
    /// Scores above this mark a trusted source.
    pub high_credibility_threshold: i64,

    /// Verdict confidence tiers.
    pub high_confidence: f64,
    pub medium_confidence: f64,
    pub low_confidence: f64,

    pub low_credibility_domains: Vec<String>,
    pub high_credibility_domains: Vec<String>,

    /// Category name to the keywords that vote for it.
    pub category_keywords: Vec<(String, Vec<String>)>,

    pub manipulative_phrases: Vec<String>,
    pub fallacy_patterns: Vec<FallacyPattern>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let owned = |items: &[&str]| -> Vec<String> {
            items.iter().map(|s| (*s).to_owned()).collect()
        };
        Self {
            low_credibility_threshold: 20,
            high_credibility_threshold: 80,
            high_confidence: 0.95,
            medium_confidence: 0.80,
            low_confidence: 0.65,
            low_credibility_domains: owned(&[
                "sketchy-site.net",
                "fake-news.com",
                "conspiracy-theory.org",
            ]),
            high_credibility_domains: owned(&[
                "reuters.com",
                "bbc.com",
                "ap.org",
                "factcheck.org",
                "snopes.com",
            ]),
            category_keywords: vec![
                (
                    "health".into(),
                    owned(&["cancer", "cure", "disease", "medicine", "health", "medical"]),
                ),
                (
                    "finance".into(),
                    owned(&["stock", "market", "currency", "investment", "bank", "crypto"]),
                ),
                (
                    "politics".into(),
                    owned(&["election", "government", "policy", "politician", "vote"]),
                ),
                (
                    "science".into(),
                    owned(&["research", "study", "discovery", "scientific", "experiment"]),
                ),
            ],
            manipulative_phrases: owned(&[
                "shocking",
                "you won't believe",
                "they don't want you to know",
                "secret",
                "hidden truth",
                "conspiracy",
                "cover-up",
            ]),
            fallacy_patterns: vec![
                FallacyPattern::new("false_dilemma", &["either", "or", "must", "only"]),
                FallacyPattern::new("appeal_to_emotion", &["feel", "emotion", "heart", "fear"]),
                FallacyPattern::new("ad_hominem", &["stupid", "idiot", "liar", "corrupt"]),
                FallacyPattern::new(
                    "slippery_slope",
                    &["will lead to", "inevitable", "surely", "certainly"],
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_consistent() {
        let config = PipelineConfig::default();
        assert!(config.low_credibility_threshold < config.high_credibility_threshold);
        assert!(config.low_confidence < config.medium_confidence);
        assert!(config.medium_confidence < config.high_confidence);
        assert!(!config.fallacy_patterns.is_empty());
    }

    #[test]
    fn serde_round_trip() {
        let config = PipelineConfig::default();
        let encoded = serde_json::to_string(&config).unwrap();
        let decoded: PipelineConfig = serde_json::from_str(&encoded).unwrap();
        assert_eq!(
            decoded.manipulative_phrases,
            config.manipulative_phrases
        );
    }
}
