//! Keyword screen: a model-free detector for development and low-resource hosts.
//!
//! Harassment keywords are checked before general offensive keywords, so a
//! message containing both is reported as harassment.

use crate::verdict::{Assessment, Verdict};
use crate::MessageAnalyzer;

pub const HARASSMENT_LABEL: &str = "Harassment";
pub const HARASSMENT_SCORE: f32 = 0.95;
pub const TOXIC_LABEL: &str = "Toxic";
pub const TOXIC_SCORE: f32 = 0.9;
pub const SAFE_LABEL: &str = "Safe";

pub const DEFAULT_HARASSMENT_WORDS: &[&str] = &[
    "harassment",
    "harass",
    "bully",
    "bullying",
    "abuse",
    "abusive",
    "harami",
    "madarchod",
    "behenchod",
    "chutiya",
    "gandu",
    "bhenchod",
];

pub const DEFAULT_OFFENSIVE_WORDS: &[&str] = &[
    "kill",
    "hurt",
    "die",
    "stupid",
    "idiot",
    "hate",
    "threat",
    "violence",
    "bad",
    "dangerous",
];

/// Case-insensitive substring screen over two keyword lists.
#[derive(Debug, Clone)]
pub struct KeywordScreen {
    harassment: Vec<String>,
    offensive: Vec<String>,
}

impl Default for KeywordScreen {
    fn default() -> Self {
        Self::new(
            DEFAULT_HARASSMENT_WORDS.iter().copied(),
            DEFAULT_OFFENSIVE_WORDS.iter().copied(),
        )
    }
}

impl KeywordScreen {
    /// Build a screen from custom lists. Keywords are lowercased; blanks dropped.
    pub fn new<H, O>(harassment: H, offensive: O) -> Self
    where
        H: IntoIterator,
        H::Item: AsRef<str>,
        O: IntoIterator,
        O::Item: AsRef<str>,
    {
        Self {
            harassment: prepare(harassment),
            offensive: prepare(offensive),
        }
    }

    pub fn harassment_words(&self) -> &[String] {
        &self.harassment
    }

    pub fn offensive_words(&self) -> &[String] {
        &self.offensive
    }

    /// Screen a message.
    pub fn screen(&self, text: &str) -> Verdict {
        let lower = text.to_lowercase();

        let (flag, label, score) = if contains_any(&lower, &self.harassment) {
            (1, HARASSMENT_LABEL, HARASSMENT_SCORE)
        } else if contains_any(&lower, &self.offensive) {
            (1, TOXIC_LABEL, TOXIC_SCORE)
        } else {
            (0, SAFE_LABEL, 0.0)
        };

        Verdict {
            flag,
            similarity_score: 0.0,
            tox_label: label.to_string(),
            tox_score: score,
        }
    }
}

impl MessageAnalyzer for KeywordScreen {
    fn analyze(&self, text: &str) -> Assessment {
        let verdict = self.screen(text);
        tracing::debug!(flag = verdict.flag, label = %verdict.tox_label, "keyword screen");
        Assessment::Scored(verdict)
    }
}

fn prepare<I>(words: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    words
        .into_iter()
        .map(|w| w.as_ref().trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles.iter().any(|n| haystack.contains(n.as_str()))
}
