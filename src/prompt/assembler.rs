//! Prompt assembly.
//!
//! Pure functions from a brief (and, for derivations, a source node) to a
//! system/user prompt pair. No I/O, no shared state: the same input always
//! yields the same prompts.

use std::fmt::Write as _;

use serde::Serialize;

use super::styles::Style;
use crate::core::{Brief, BriefMode, ContentNode, SeoFieldKind};
use crate::error::{Error, Result};
use crate::orchestration::Tolerance;

/// The two halves of every provider request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

impl PromptPair {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.system.len() + self.user.len()
    }

    pub fn is_empty(&self) -> bool {
        self.system.is_empty() && self.user.is_empty()
    }
}

/// What we are asking the provider to write.
#[derive(Debug, Clone, Copy)]
pub enum Request<'a> {
    Base {
        brief: &'a Brief,
    },
    Alternative {
        brief: &'a Brief,
        source: &'a ContentNode,
    },
    Styled {
        source: &'a ContentNode,
        style: &'a Style,
    },
    Humanized {
        source: &'a ContentNode,
    },
}

const COPYWRITER_ROLE: &str = "You are a senior marketing copywriter. You write clear, specific, \
persuasive copy for real businesses and you follow instructions about length, structure and \
keywords exactly.";

const OUTPUT_RULES: &str = "Return only the finished copy. No preamble, no notes to the editor, \
no word counts, no surrounding quotes.";

const JSON_RULES: &str = "Respond with a single JSON object and nothing else. Scores are integers \
from 0 to 100.";

pub fn assemble(request: &Request<'_>) -> Result<PromptPair> {
    match request {
        Request::Base { brief } => Ok(base_prompt(brief)),
        Request::Alternative { brief, source } => {
            let source_text = require_text(source)?;
            Ok(alternative_prompt(brief, source_text))
        }
        Request::Styled { source, style } => {
            let source_text = require_text(source)?;
            Ok(styled_prompt(source_text, style))
        }
        Request::Humanized { source } => {
            let source_text = require_text(source)?;
            Ok(humanized_prompt(source_text))
        }
    }
}

fn require_text(source: &ContentNode) -> Result<&str> {
    if source.text.trim().is_empty() {
        return Err(Error::Validation(format!(
            "node {} has no text to transform",
            source.id.short()
        )));
    }
    Ok(&source.text)
}

fn system_prompt(brief: &Brief) -> String {
    let mut system = String::from(COPYWRITER_ROLE);
    let _ = write!(system, "\n\nWrite in {}.", brief.language());
    if !brief.tone.tone.trim().is_empty() {
        let _ = write!(system, " Tone: {}.", brief.tone.tone.trim());
    }
    if !brief.tone.writing_style.trim().is_empty() {
        let _ = write!(system, " Style notes: {}.", brief.tone.writing_style.trim());
    }
    let _ = write!(system, "\n\n{}", OUTPUT_RULES);
    system
}

fn push_field(out: &mut String, label: &str, value: &str) {
    let value = value.trim();
    if !value.is_empty() {
        let _ = writeln!(out, "- {}: {}", label, value);
    }
}

fn describe_brief(brief: &Brief) -> String {
    let mut out = String::new();
    let facts = &brief.business;
    let _ = writeln!(out, "## Business");
    push_field(&mut out, "Business", &facts.business_name);
    push_field(&mut out, "Industry", &facts.industry);
    push_field(&mut out, "Product or service", &facts.product_description);
    push_field(&mut out, "Key message", &facts.key_message);
    push_field(&mut out, "Call to action", &facts.call_to_action);
    if !facts.competitors.is_empty() {
        push_field(&mut out, "Differentiate from", &facts.competitors.join(", "));
    }

    let audience = &brief.audience;
    let _ = writeln!(out, "\n## Audience");
    push_field(&mut out, "Target audience", &audience.target_audience);
    push_field(&mut out, "Pain points", &audience.pain_points);
    push_field(&mut out, "Reading level", &audience.reading_level);
    push_field(&mut out, "Content type", &brief.tone.content_type);
    out
}

/// Every enabled toggle becomes an explicit instruction.
fn requirements(brief: &Brief) -> Vec<String> {
    let mut rules = Vec::new();
    let features = &brief.features;

    if let Some(target) = brief.effective_target() {
        // Same band the adherence loop accepts.
        let tolerance =
            Tolerance::select(target, &brief.word_policy, features.strict_word_count);
        match tolerance {
            Tolerance::Exact => {
                rules.push(format!("The copy must contain exactly {} words.", target))
            }
            Tolerance::Percent(pct) => {
                let (low, high) = tolerance.band(target);
                rules.push(format!(
                    "Aim for {} words (within {}%, {} to {} words).",
                    target, pct, low, high
                ));
            }
        }
    }

    if !brief.sections.is_empty() {
        let mut rule =
            String::from("Produce exactly the following sections, in this order, with these word allocations:");
        for (i, section) in brief.sections.iter().enumerate() {
            let _ = write!(
                rule,
                "\n  {}. {} ({} words)",
                i + 1,
                section.name.trim(),
                section.word_budget
            );
        }
        rules.push(rule);
    }

    let keywords: Vec<&str> = brief.keywords().collect();
    if !keywords.is_empty() {
        if features.force_keywords {
            rules.push(format!(
                "Integrate every listed keyword at least once, verbatim: {}.",
                keywords.join(", ")
            ));
        } else {
            rules.push(format!(
                "Work these keywords in where they read naturally: {}.",
                keywords.join(", ")
            ));
        }
    }

    if features.force_elaboration {
        rules.push(
            "Elaborate every point with concrete detail, examples and outcomes. Do not summarize or \
             compress to save words."
                .to_string(),
        );
    }

    rules
}

fn push_requirements(out: &mut String, rules: &[String]) {
    if rules.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n## Requirements");
    for rule in rules {
        let _ = writeln!(out, "- {}", rule);
    }
}

fn base_prompt(brief: &Brief) -> PromptPair {
    let mut user = String::new();
    match &brief.mode {
        BriefMode::CreateNew => {
            let _ = writeln!(user, "Write new marketing copy from this brief.\n");
        }
        BriefMode::ImproveExisting { original_copy } => {
            let _ = writeln!(
                user,
                "Improve the existing copy below using this brief. Keep what works, fix what \
                 doesn't, and sharpen the message.\n"
            );
            let _ = writeln!(user, "## Existing copy\n<<<\n{}\n>>>\n", original_copy.trim());
        }
    }
    user.push_str(&describe_brief(brief));
    push_requirements(&mut user, &requirements(brief));
    PromptPair::new(system_prompt(brief), user.trim_end())
}

fn alternative_prompt(brief: &Brief, source_text: &str) -> PromptPair {
    let mut user = String::new();
    let _ = writeln!(
        user,
        "Generate a divergent alternative to the copy below. Take a clearly different angle: a \
         new hook, a different lead benefit, a fresh structure. Keep the facts and the call to \
         action.\n"
    );
    let _ = writeln!(user, "## Copy to diverge from\n<<<\n{}\n>>>\n", source_text.trim());
    user.push_str(&describe_brief(brief));
    push_requirements(&mut user, &requirements(brief));
    PromptPair::new(system_prompt(brief), user.trim_end())
}

fn styled_prompt(source_text: &str, style: &Style) -> PromptPair {
    let system = format!(
        "{}\n\nYou are rewriting copy in the style of {}. {}\n\n{}",
        COPYWRITER_ROLE, style.name, style.instruction, OUTPUT_RULES
    );
    let user = format!(
        "Rewrite the copy below in the {} style. Preserve its facts, its structure and its \
         length (stay within 10% of the original word count).\n\n<<<\n{}\n>>>",
        style.name,
        source_text.trim()
    );
    PromptPair::new(system, user)
}

fn humanized_prompt(source_text: &str) -> PromptPair {
    let system = format!(
        "{}\n\nYou edit machine-written copy so it reads as if a thoughtful person wrote it: \
         varied sentence length, natural transitions, no filler phrases, no cliches, no lists \
         of three for their own sake.\n\n{}",
        COPYWRITER_ROLE, OUTPUT_RULES
    );
    let user = format!(
        "Humanize the copy below. Keep its meaning, its structure and its length.\n\n<<<\n{}\n>>>",
        source_text.trim()
    );
    PromptPair::new(system, user)
}

// ========== Word-count revision ==========

/// Which way a draft has to move to land on target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustment {
    Expand(u32),
    Trim(u32),
}

impl Adjustment {
    pub fn between(actual: u32, target: u32) -> Option<Self> {
        match actual.cmp(&target) {
            std::cmp::Ordering::Less => Some(Adjustment::Expand(target - actual)),
            std::cmp::Ordering::Greater => Some(Adjustment::Trim(actual - target)),
            std::cmp::Ordering::Equal => None,
        }
    }
}

/// Ask for a revision of `draft`, stating how far off it was.
///
/// `band` is the accepted range, inclusive.
pub fn revision_prompt(
    original: &PromptPair,
    draft: &str,
    actual: u32,
    target: u32,
    band: (u32, u32),
) -> PromptPair {
    let direction = match Adjustment::between(actual, target) {
        Some(Adjustment::Expand(n)) => format!(
            "It is {} words short. Add about {} words of substance (no padding).",
            n, n
        ),
        Some(Adjustment::Trim(n)) => format!(
            "It is {} words too long. Cut about {} words without losing key points.",
            n, n
        ),
        None => "It is on target; keep the length exactly as it is.".to_string(),
    };
    let range = if band.0 == band.1 {
        format!("exactly {} words", band.0)
    } else {
        format!("between {} and {} words", band.0, band.1)
    };
    let user = format!(
        "{}\n\n## Previous draft\n<<<\n{}\n>>>\n\n## Revision needed\nThe previous draft has {} \
         words; the target is {}. {} The revised copy must be {}. Return the full revised copy.",
        original.user,
        draft.trim(),
        actual,
        target,
        direction,
        range
    );
    PromptPair::new(original.system.clone(), user)
}

// ========== Auxiliary prompts ==========

fn context_line(context: Option<&Brief>) -> String {
    let Some(brief) = context else {
        return String::new();
    };
    let mut line = String::new();
    let audience = brief.audience.target_audience.trim();
    let tone = brief.tone.tone.trim();
    if !audience.is_empty() {
        let _ = write!(line, "Intended audience: {}. ", audience);
    }
    if !tone.is_empty() {
        let _ = write!(line, "Intended tone: {}. ", tone);
    }
    if !line.is_empty() {
        line.push('\n');
    }
    line
}

pub fn score_prompt(text: &str, context: Option<&Brief>) -> PromptPair {
    let system = format!(
        "You are a demanding conversion copy editor who grades marketing copy.\n\n{}",
        JSON_RULES
    );
    let user = format!(
        "{}Grade the copy below.\n\n<<<\n{}\n>>>\n\nReturn JSON with keys: \"overall\", \
         \"clarity\", \"persuasiveness\", \"toneMatch\", \"engagement\" (integers 0-100) and \
         \"explanation\" (two or three sentences).",
        context_line(context),
        text.trim()
    );
    PromptPair::new(system, user)
}

pub fn seo_prompt(text: &str, context: Option<&Brief>) -> PromptPair {
    let system = format!(
        "You are an SEO specialist writing on-page metadata.\n\n{}",
        JSON_RULES
    );
    let mut limits = String::new();
    for kind in SeoFieldKind::ALL {
        let _ = write!(limits, "\n- {}: at most {} characters", kind.label(), kind.limit());
    }
    let keywords = context
        .map(|b| b.keywords().collect::<Vec<_>>().join(", "))
        .filter(|k| !k.is_empty())
        .map(|k| format!("Target keywords: {}.\n", k))
        .unwrap_or_default();
    let user = format!(
        "{}{}Write SEO metadata for the copy below.\n\n<<<\n{}\n>>>\n\nLimit each SEO field to \
         its stated character maximum:{}\n\nReturn JSON with array keys \"urlSlugs\", \
         \"metaDescriptions\", \"h1Variants\", \"h2Headings\", \"ogTitles\", \"ogDescriptions\" \
         (three candidates each, plain strings; slugs lowercase and hyphenated).",
        context_line(context),
        keywords,
        text.trim(),
        limits
    );
    PromptPair::new(system, user)
}

pub fn geo_prompt(text: &str) -> PromptPair {
    let system = format!(
        "You assess how likely AI assistants are to quote or cite a piece of content when \
         answering user questions.\n\n{}",
        JSON_RULES
    );
    let user = format!(
        "Assess the copy below for generative-engine optimization.\n\n<<<\n{}\n>>>\n\nReturn \
         JSON with keys: \"overall\", \"answerability\", \"structure\", \"citationWorthiness\", \
         \"specificity\" (integers 0-100), \"explanation\" (string) and \"suggestions\" (array \
         of short strings).",
        text.trim()
    );
    PromptPair::new(system, user)
}

pub fn input_evaluation_prompt(brief: &Brief) -> PromptPair {
    let system = format!(
        "You review copywriting briefs before any copy is written and tell the client how to \
         make them stronger.\n\n{}",
        JSON_RULES
    );
    let mut user = String::from("Evaluate this brief.\n\n");
    user.push_str(&describe_brief(brief));
    push_requirements(&mut user, &requirements(brief));
    user.push_str(
        "\nReturn JSON with keys: \"score\" (0-100, how complete and specific the brief is), \
         \"summary\" (one sentence) and \"tips\" (array of concrete improvements, most \
         important first).",
    );
    PromptPair::new(system, user)
}
