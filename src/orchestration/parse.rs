//! Parsing of auxiliary replies (score, SEO, GEO, input evaluation).
//!
//! Models often wrap JSON in a markdown fence or a sentence of preamble, so
//! the object is extracted before decoding. Anything that still fails to
//! decode is a malformed-response provider error.

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::core::{ContentScore, GeoScore, InputEvaluation, SeoField, SeoFieldKind, SeoMetadata};
use crate::error::ProviderError;

type ParseResult<T> = std::result::Result<T, ProviderError>;

static FENCED_JSON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(\{.*?\})\s*```").unwrap());

/// Pull the JSON object out of a model reply.
pub fn extract_json(reply: &str) -> Option<&str> {
    if let Some(captures) = FENCED_JSON_RE.captures(reply) {
        return captures.get(1).map(|m| m.as_str());
    }
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (start < end).then(|| &reply[start..=end])
}

fn decode<T: DeserializeOwned>(reply: &str, what: &str) -> ParseResult<T> {
    let json = extract_json(reply)
        .ok_or_else(|| ProviderError::malformed(format!("{} reply contains no JSON object", what)))?;
    serde_json::from_str(json)
        .map_err(|e| ProviderError::malformed(format!("{} reply is not valid: {}", what, e)))
}

/// Scores arrive as numbers of any shape; clamp to 0..=100.
fn clamp_score(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 100.0) as u8
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawScore {
    overall: f64,
    #[serde(default)]
    clarity: f64,
    #[serde(default)]
    persuasiveness: f64,
    #[serde(default)]
    tone_match: f64,
    #[serde(default)]
    engagement: f64,
    #[serde(default)]
    explanation: String,
}

pub fn parse_score(reply: &str) -> ParseResult<ContentScore> {
    let raw: RawScore = decode(reply, "score")?;
    Ok(ContentScore {
        overall: clamp_score(raw.overall),
        clarity: clamp_score(raw.clarity),
        persuasiveness: clamp_score(raw.persuasiveness),
        tone_match: clamp_score(raw.tone_match),
        engagement: clamp_score(raw.engagement),
        explanation: raw.explanation.trim().to_string(),
    })
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct RawSeo {
    url_slugs: Vec<String>,
    meta_descriptions: Vec<String>,
    h1_variants: Vec<String>,
    h2_headings: Vec<String>,
    og_titles: Vec<String>,
    og_descriptions: Vec<String>,
}

fn fields(kind: SeoFieldKind, values: Vec<String>) -> Vec<SeoField> {
    values
        .into_iter()
        .filter(|v| !v.trim().is_empty())
        .map(|v| SeoField::new(kind, v))
        .collect()
}

/// Character counts are measured here; any the model reports are ignored.
pub fn parse_seo(reply: &str) -> ParseResult<SeoMetadata> {
    let raw: RawSeo = decode(reply, "SEO")?;
    let seo = SeoMetadata {
        url_slugs: fields(SeoFieldKind::UrlSlug, raw.url_slugs),
        meta_descriptions: fields(SeoFieldKind::MetaDescription, raw.meta_descriptions),
        h1_variants: fields(SeoFieldKind::H1, raw.h1_variants),
        h2_headings: fields(SeoFieldKind::H2, raw.h2_headings),
        og_titles: fields(SeoFieldKind::OgTitle, raw.og_titles),
        og_descriptions: fields(SeoFieldKind::OgDescription, raw.og_descriptions),
    };
    if seo.is_empty() {
        return Err(ProviderError::malformed("SEO reply has no fields"));
    }
    Ok(seo)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGeo {
    overall: f64,
    #[serde(default)]
    answerability: f64,
    #[serde(default)]
    structure: f64,
    #[serde(default)]
    citation_worthiness: f64,
    #[serde(default)]
    specificity: f64,
    #[serde(default)]
    explanation: String,
    #[serde(default)]
    suggestions: Vec<String>,
}

pub fn parse_geo(reply: &str) -> ParseResult<GeoScore> {
    let raw: RawGeo = decode(reply, "GEO")?;
    Ok(GeoScore {
        overall: clamp_score(raw.overall),
        answerability: clamp_score(raw.answerability),
        structure: clamp_score(raw.structure),
        citation_worthiness: clamp_score(raw.citation_worthiness),
        specificity: clamp_score(raw.specificity),
        explanation: raw.explanation.trim().to_string(),
        suggestions: clean_list(raw.suggestions),
    })
}

#[derive(Deserialize)]
struct RawEvaluation {
    score: f64,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    tips: Vec<String>,
}

pub fn parse_input_evaluation(reply: &str) -> ParseResult<InputEvaluation> {
    let raw: RawEvaluation = decode(reply, "input evaluation")?;
    Ok(InputEvaluation {
        score: clamp_score(raw.score),
        summary: raw.summary.trim().to_string(),
        tips: clean_list(raw.tips),
    })
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
