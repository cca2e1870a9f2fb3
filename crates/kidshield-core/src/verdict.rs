//! Threshold combination for the message analyzer.
//!
//! A message is flagged when it is semantically close to one of the
//! offensive reference sentences, or when the toxicity classifier assigns
//! a harmful label with enough confidence.

use serde::{Deserialize, Serialize};

/// Minimum max-similarity against the reference set to count as offensive.
pub const SIMILARITY_THRESHOLD: f32 = 0.78;

/// Classifier score must be strictly above this for a harmful label to count.
pub const TOXICITY_THRESHOLD: f32 = 0.75;

/// Classifier labels treated as harmful (compared case-insensitively).
pub const HARMFUL_LABELS: &[&str] = &["toxic", "insult", "threat"];

/// Characters of input passed to the classifier.
pub const CLASSIFIER_MAX_CHARS: usize = 512;

/// Label reported when analysis could not run.
pub const ERROR_LABEL: &str = "error";

/// Fixed reference sentences the similarity stage compares against.
pub const OFFENSIVE_EXAMPLES: &[&str] = &[
    "I will kill you",
    "You are an idiot",
    "You are useless",
    "I will hurt you",
    "Die",
    "Shut up, loser",
    "You stupid",
    "I hate you",
    "Go to hell",
];

/// Normalize text before embedding.
pub fn clean(text: &str) -> String {
    text.trim().to_lowercase()
}

/// First [`CLASSIFIER_MAX_CHARS`] characters of `text`.
pub fn truncate_for_classifier(text: &str) -> &str {
    match text.char_indices().nth(CLASSIFIER_MAX_CHARS) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Round to 3 decimal places.
pub fn round3(score: f32) -> f32 {
    (score * 1000.0).round() / 1000.0
}

/// Scores go out as JSON numbers; NaN and infinities become 0.0.
fn finite_or_zero(score: f32) -> f32 {
    if score.is_finite() { score } else { 0.0 }
}

/// Outcome of the similarity stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Similarity {
    pub score: f32,
}

impl Similarity {
    pub fn is_similar(&self) -> bool {
        self.score >= SIMILARITY_THRESHOLD
    }
}

/// Outcome of the classifier stage.
#[derive(Debug, Clone, PartialEq)]
pub struct Toxicity {
    pub label: String,
    pub score: f32,
}

impl Toxicity {
    /// Build from a raw classifier output, rounding the score.
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score: round3(finite_or_zero(score)),
        }
    }

    /// Stand-in when the classifier stage fails.
    pub fn error() -> Self {
        Self {
            label: ERROR_LABEL.to_string(),
            score: 0.0,
        }
    }

    pub fn is_toxic(&self) -> bool {
        let label = self.label.to_lowercase();
        HARMFUL_LABELS.contains(&label.as_str()) && self.score > TOXICITY_THRESHOLD
    }
}

/// Final per-message verdict as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub flag: u8,
    pub similarity_score: f32,
    pub tox_label: String,
    pub tox_score: f32,
}

impl Verdict {
    /// Combine both stages: flag if either one fires.
    pub fn combine(similarity: Similarity, toxicity: Toxicity) -> Self {
        let flagged = similarity.is_similar() || toxicity.is_toxic();
        Self {
            flag: u8::from(flagged),
            similarity_score: finite_or_zero(similarity.score),
            tox_label: toxicity.label,
            tox_score: finite_or_zero(toxicity.score),
        }
    }

    /// Safe default used when analysis fails.
    pub fn degraded() -> Self {
        Self {
            flag: 0,
            similarity_score: 0.0,
            tox_label: ERROR_LABEL.to_string(),
            tox_score: 0.0,
        }
    }

    pub fn is_flagged(&self) -> bool {
        self.flag == 1
    }
}

/// Result of analyzing one message.
///
/// Inference failures are not errors for the caller: they produce a
/// [`Degraded`](Assessment::Degraded) assessment that renders as the safe
/// default verdict.
#[derive(Debug, Clone, PartialEq)]
pub enum Assessment {
    Scored(Verdict),
    Degraded { reason: String },
}

impl Assessment {
    pub fn degraded(reason: impl Into<String>) -> Self {
        Self::Degraded {
            reason: reason.into(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    /// The verdict to report, substituting the safe default when degraded.
    pub fn into_verdict(self) -> Verdict {
        match self {
            Self::Scored(verdict) => verdict,
            Self::Degraded { .. } => Verdict::degraded(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sim(score: f32) -> Similarity {
        Similarity { score }
    }

    #[test]
    fn clean_trims_and_lowercases() {
        assert_eq!(clean("  You Are AN Idiot \n"), "you are an idiot");
    }

    #[test]
    fn truncate_keeps_short_text() {
        assert_eq!(truncate_for_classifier("hello"), "hello");
    }

    #[test]
    fn truncate_counts_characters_not_bytes() {
        let text = "é".repeat(600);
        let cut = truncate_for_classifier(&text);
        assert_eq!(cut.chars().count(), CLASSIFIER_MAX_CHARS);
    }

    #[test]
    fn toxicity_score_rounded() {
        let t = Toxicity::new("toxic", 0.987_654);
        assert_eq!(t.score, 0.988);
    }

    #[test]
    fn similarity_threshold_is_inclusive() {
        assert!(sim(0.78).is_similar());
        assert!(!sim(0.779).is_similar());
    }

    #[test]
    fn toxicity_threshold_is_exclusive() {
        assert!(!Toxicity::new("toxic", 0.75).is_toxic());
        assert!(Toxicity::new("toxic", 0.751).is_toxic());
    }

    #[test]
    fn harmful_labels_case_insensitive() {
        assert!(Toxicity::new("TOXIC", 0.9).is_toxic());
        assert!(Toxicity::new("Insult", 0.9).is_toxic());
        assert!(Toxicity::new("threat", 0.9).is_toxic());
        assert!(!Toxicity::new("non-toxic", 0.99).is_toxic());
        assert!(!Toxicity::new("neutral", 0.99).is_toxic());
    }

    #[test]
    fn combine_flags_on_similarity_alone() {
        let v = Verdict::combine(sim(0.85), Toxicity::new("non-toxic", 0.97));
        assert_eq!(v.flag, 1);
        assert_eq!(v.tox_label, "non-toxic");
    }

    #[test]
    fn combine_flags_on_classifier_alone() {
        let v = Verdict::combine(sim(0.1), Toxicity::new("toxic", 0.92));
        assert!(v.is_flagged());
    }

    #[test]
    fn combine_clean_message() {
        let v = Verdict::combine(sim(0.2), Toxicity::new("non-toxic", 0.99));
        assert_eq!(v.flag, 0);
        assert_eq!(v.similarity_score, 0.2);
        assert_eq!(v.tox_score, 0.99);
    }

    #[test]
    fn degraded_assessment_renders_safe_default() {
        let v = Assessment::degraded("model exploded").into_verdict();
        assert_eq!(v, Verdict::degraded());
        assert_eq!(v.flag, 0);
        assert_eq!(v.tox_label, "error");
        assert_eq!(v.similarity_score, 0.0);
        assert_eq!(v.tox_score, 0.0);
    }

    #[test]
    fn verdict_serializes_flag_as_integer() {
        let v = Verdict::combine(sim(0.9), Toxicity::new("toxic", 0.9));
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["flag"], 1);
        assert_eq!(json["tox_label"], "toxic");
    }

    #[test]
    fn non_finite_scores_serialize_as_zero() {
        let v = Verdict::combine(sim(f32::NAN), Toxicity::new("toxic", f32::INFINITY));
        assert_eq!(v.flag, 0);
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["similarity_score"], 0.0);
        assert_eq!(json["tox_score"], 0.0);
    }

    #[test]
    fn classifier_error_stand_in_never_flags() {
        let t = Toxicity::error();
        assert_eq!(t.label, "error");
        assert_eq!(t.score, 0.0);
        assert!(!t.is_toxic());
    }
}
