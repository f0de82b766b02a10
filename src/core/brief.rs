//! The brief: everything the user tells us about the copy they want.
//!
//! The UI owns the brief; the orchestrator only reads it for the duration of
//! one call.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Whether we write from scratch or improve copy the user already has.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum BriefMode {
    #[default]
    CreateNew,
    ImproveExisting {
        original_copy: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BusinessFacts {
    pub business_name: String,
    pub industry: String,
    pub product_description: String,
    pub key_message: String,
    pub call_to_action: String,
    pub keywords: Vec<String>,
    pub competitors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AudienceProfile {
    pub target_audience: String,
    pub pain_points: String,
    pub reading_level: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ToneProfile {
    pub tone: String,
    /// Free-form notes like "avoid jargon" or "British spelling".
    pub writing_style: String,
    pub content_type: String,
    pub language: String,
}

/// One named section of the output, with its word allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSpec {
    pub name: String,
    pub word_budget: u32,
}

impl SectionSpec {
    pub fn new(name: &str, word_budget: u32) -> Self {
        Self {
            name: name.to_string(),
            word_budget,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FeatureToggles {
    pub generate_score: bool,
    pub generate_seo: bool,
    pub generate_geo: bool,
    pub strict_word_count: bool,
    pub force_keywords: bool,
    pub force_elaboration: bool,
}

/// Word-count adherence policy parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WordPolicy {
    /// Allowed deviation for regular-length copy, in percent of the target.
    pub tolerance_percent: f64,
    /// Targets below this many words count as short copy.
    pub short_threshold: u32,
    /// Allowed deviation for short copy, in percent.
    pub short_tolerance_percent: f64,
    /// Revisions allowed after the first draft.
    pub max_revisions: u32,
}

impl WordPolicy {
    pub const MAX_REVISIONS_CEILING: u32 = 10;
}

impl Default for WordPolicy {
    fn default() -> Self {
        Self {
            tolerance_percent: 2.0,
            short_threshold: 100,
            short_tolerance_percent: 20.0,
            max_revisions: 3,
        }
    }
}

/// The configuration model behind every generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Brief {
    pub mode: BriefMode,
    pub business: BusinessFacts,
    pub audience: AudienceProfile,
    pub tone: ToneProfile,
    pub word_count: Option<u32>,
    pub sections: Vec<SectionSpec>,
    pub features: FeatureToggles,
    pub word_policy: WordPolicy,
}

impl Brief {
    /// Largest target, explicit or summed from sections, that validates.
    pub const MAX_TARGET_WORDS: u32 = 20_000;

    /// The explicit word count, else the sum of section budgets.
    ///
    /// The sum saturates; `validate` rejects totals above
    /// [`Self::MAX_TARGET_WORDS`].
    pub fn effective_target(&self) -> Option<u32> {
        match self.word_count {
            Some(target) => Some(target),
            None if !self.sections.is_empty() => Some(
                self.sections
                    .iter()
                    .fold(0u32, |total, s| total.saturating_add(s.word_budget)),
            ),
            None => None,
        }
    }

    fn section_total(&self) -> Option<u32> {
        self.sections
            .iter()
            .try_fold(0u32, |total, s| total.checked_add(s.word_budget))
    }

    pub fn language(&self) -> &str {
        let language = self.tone.language.trim();
        if language.is_empty() {
            "English"
        } else {
            language
        }
    }

    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.business
            .keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
    }

    /// Reject briefs no provider call should be made for.
    pub fn validate(&self) -> Result<()> {
        if let Some(target) = self.word_count {
            if target == 0 {
                return Err(Error::Validation(
                    "target word count must be greater than zero".to_string(),
                ));
            }
            if target > Self::MAX_TARGET_WORDS {
                return Err(Error::Validation(format!(
                    "target word count must be at most {}, got {}",
                    Self::MAX_TARGET_WORDS,
                    target
                )));
            }
        }

        match &self.mode {
            BriefMode::CreateNew => {
                if self.business.product_description.trim().is_empty()
                    && self.business.key_message.trim().is_empty()
                {
                    return Err(Error::Validation(
                        "describe the product or the key message".to_string(),
                    ));
                }
            }
            BriefMode::ImproveExisting { original_copy } => {
                if original_copy.trim().is_empty() {
                    return Err(Error::Validation(
                        "improve mode needs the existing copy".to_string(),
                    ));
                }
            }
        }

        for section in &self.sections {
            if section.name.trim().is_empty() {
                return Err(Error::Validation("section names cannot be empty".to_string()));
            }
            if section.word_budget == 0 {
                return Err(Error::Validation(format!(
                    "section '{}' needs a word budget",
                    section.name
                )));
            }
        }
        match self.section_total() {
            Some(total) if total <= Self::MAX_TARGET_WORDS => {}
            _ => {
                return Err(Error::Validation(format!(
                    "section budgets must add up to at most {} words",
                    Self::MAX_TARGET_WORDS
                )))
            }
        }

        let policy = &self.word_policy;
        for (label, pct) in [
            ("tolerance", policy.tolerance_percent),
            ("short-content tolerance", policy.short_tolerance_percent),
        ] {
            if !(pct.is_finite() && pct >= 0.0 && pct <= 100.0) {
                return Err(Error::Validation(format!(
                    "{} must be between 0 and 100 percent, got {}",
                    label, pct
                )));
            }
        }
        if policy.max_revisions > WordPolicy::MAX_REVISIONS_CEILING {
            return Err(Error::Validation(format!(
                "at most {} revisions are allowed",
                WordPolicy::MAX_REVISIONS_CEILING
            )));
        }

        Ok(())
    }
}
