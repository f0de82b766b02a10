//! Registry of named writing styles.
//!
//! Each style is plain data. Adding a style means adding a row.

use serde::Serialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleCategory {
    Copywriter,
    Brand,
    Author,
    Voice,
}

impl std::fmt::Display for StyleCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StyleCategory::Copywriter => write!(f, "copywriter"),
            StyleCategory::Brand => write!(f, "brand"),
            StyleCategory::Author => write!(f, "author"),
            StyleCategory::Voice => write!(f, "voice"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Style {
    pub id: &'static str,
    pub name: &'static str,
    pub category: StyleCategory,
    pub instruction: &'static str,
}

const fn style(
    id: &'static str,
    name: &'static str,
    category: StyleCategory,
    instruction: &'static str,
) -> Style {
    Style {
        id,
        name,
        category,
        instruction,
    }
}

use StyleCategory::{Author, Brand, Copywriter, Voice};

pub static STYLES: &[Style] = &[
    style(
        "steve-jobs",
        "Steve Jobs",
        Copywriter,
        "Short declarative sentences. Lead with the one thing that matters, build anticipation, \
         and land on a simple memorable line. Use plain words and confident superlatives sparingly.",
    ),
    style(
        "david-ogilvy",
        "David Ogilvy",
        Copywriter,
        "Fact-rich and specific. Lead with a headline that promises a benefit, support every \
         claim with a concrete detail, and respect the reader's intelligence.",
    ),
    style(
        "gary-halbert",
        "Gary Halbert",
        Copywriter,
        "Direct-response letter voice. Talk to one reader, open with a hook, stack benefits, \
         handle objections, and close with an urgent call to action.",
    ),
    style(
        "eugene-schwartz",
        "Eugene Schwartz",
        Copywriter,
        "Channel an existing desire. Match the reader's awareness level, intensify the desire \
         with vivid outcomes, then present the product as the mechanism.",
    ),
    style(
        "seth-godin",
        "Seth Godin",
        Copywriter,
        "Brief, thoughtful, slightly provocative. Short paragraphs, a single idea, and a \
         question that makes the reader rethink the status quo.",
    ),
    style(
        "joanna-wiebe",
        "Joanna Wiebe",
        Copywriter,
        "Conversion copy built from the customer's own words. Specific pain, specific relief, \
         crisp subheads, and microcopy that removes friction.",
    ),
    style(
        "apple",
        "Apple",
        Brand,
        "Minimal and polished. Few words per line, sensory detail, product as hero, and \
         sentence fragments used for rhythm.",
    ),
    style(
        "nike",
        "Nike",
        Brand,
        "Motivational and bold. Speak to the athlete in everyone, use imperative verbs, and \
         end on a rallying line.",
    ),
    style(
        "mailchimp",
        "Mailchimp",
        Brand,
        "Friendly, plainspoken, lightly humorous. Clear over clever, helpful first, and never \
         condescending.",
    ),
    style(
        "patagonia",
        "Patagonia",
        Brand,
        "Purpose-driven and candid. Ground claims in values and evidence, admit trade-offs, and \
         invite the reader to act responsibly.",
    ),
    style(
        "innocent",
        "Innocent Drinks",
        Brand,
        "Cheeky, warm and self-aware. Chatty asides, gentle jokes, and honest ingredient-level \
         detail.",
    ),
    style(
        "hemingway",
        "Ernest Hemingway",
        Author,
        "Spare prose. Short sentences, concrete nouns, strong verbs, almost no adjectives, and \
         meaning carried by what is left unsaid.",
    ),
    style(
        "maya-angelou",
        "Maya Angelou",
        Author,
        "Lyrical and dignified. Warm rhythm, personal resonance, and imagery that lifts the \
         reader without overstating.",
    ),
    style(
        "malcolm-gladwell",
        "Malcolm Gladwell",
        Author,
        "Open with a surprising anecdote, connect it to a counterintuitive insight, and reveal \
         how the product fits the pattern.",
    ),
    style(
        "dr-seuss",
        "Dr. Seuss",
        Author,
        "Playful rhyme and bouncy rhythm. Invented-sounding but clear words, repetition, and a \
         cheerful moral at the end.",
    ),
    style(
        "conversational",
        "Conversational",
        Voice,
        "Write like a knowledgeable friend talking over coffee. Contractions, second person, \
         and the occasional rhetorical question.",
    ),
    style(
        "professional",
        "Professional",
        Voice,
        "Polished and credible. Precise vocabulary, measured claims, and a clear structure \
         suitable for business readers.",
    ),
    style(
        "storytelling",
        "Storytelling",
        Voice,
        "Frame the copy as a short story: a character with a problem, a turning point, and a \
         resolution the product makes possible.",
    ),
    style(
        "urgent",
        "Urgent",
        Voice,
        "Create genuine time pressure. Lead with what the reader loses by waiting, keep \
         sentences tight, and repeat the call to action.",
    ),
    style(
        "luxury",
        "Luxury",
        Voice,
        "Understated elegance. Slow pacing, craftsmanship details, exclusivity implied rather \
         than stated, and no exclamation marks.",
    ),
    style(
        "playful",
        "Playful",
        Voice,
        "Light, witty and energetic. Wordplay where it helps, surprising comparisons, and a \
         grin in every paragraph.",
    ),
    style(
        "technical",
        "Technical",
        Voice,
        "Precise and spec-driven. Name the mechanisms, quantify performance, and anticipate an \
         expert reader's questions.",
    ),
    style(
        "empathetic",
        "Empathetic",
        Voice,
        "Acknowledge the reader's situation first, validate the feeling, then offer help \
         gently and concretely.",
    ),
];

pub fn all() -> &'static [Style] {
    STYLES
}

pub fn find(id: &str) -> Option<&'static Style> {
    let id = id.trim();
    STYLES.iter().find(|s| s.id.eq_ignore_ascii_case(id))
}

/// Look up a style or fail with [`Error::UnknownStyle`].
pub fn lookup(id: &str) -> Result<&'static Style> {
    find(id).ok_or_else(|| Error::UnknownStyle(id.to_string()))
}

pub fn by_category(category: StyleCategory) -> impl Iterator<Item = &'static Style> {
    STYLES.iter().filter(move |s| s.category == category)
}
