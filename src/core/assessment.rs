//! Assessments attached to content nodes after generation: quality score,
//! SEO metadata and GEO (AI-assistant quotability) score. Also the input
//! evaluation returned for a brief, which never touches the graph.

use serde::{Deserialize, Serialize};

/// Quality assessment of a piece of copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentScore {
    /// 0–100.
    pub overall: u8,
    pub clarity: u8,
    pub persuasiveness: u8,
    pub tone_match: u8,
    pub engagement: u8,
    pub explanation: String,
}

/// The SEO fields we ask for, each with its character limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeoFieldKind {
    UrlSlug,
    MetaDescription,
    H1,
    H2,
    OgTitle,
    OgDescription,
}

impl SeoFieldKind {
    pub const ALL: [SeoFieldKind; 6] = [
        SeoFieldKind::UrlSlug,
        SeoFieldKind::MetaDescription,
        SeoFieldKind::H1,
        SeoFieldKind::H2,
        SeoFieldKind::OgTitle,
        SeoFieldKind::OgDescription,
    ];

    pub fn limit(&self) -> usize {
        match self {
            SeoFieldKind::UrlSlug => 60,
            SeoFieldKind::MetaDescription => 160,
            SeoFieldKind::H1 => 70,
            SeoFieldKind::H2 => 70,
            SeoFieldKind::OgTitle => 60,
            SeoFieldKind::OgDescription => 200,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SeoFieldKind::UrlSlug => "URL slug",
            SeoFieldKind::MetaDescription => "meta description",
            SeoFieldKind::H1 => "H1 heading",
            SeoFieldKind::H2 => "H2 heading",
            SeoFieldKind::OgTitle => "OpenGraph title",
            SeoFieldKind::OgDescription => "OpenGraph description",
        }
    }
}

/// One SEO candidate with its measured length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeoField {
    pub text: String,
    pub char_count: usize,
    pub limit: usize,
}

impl SeoField {
    /// Character count is always measured here, never taken from the provider.
    pub fn new(kind: SeoFieldKind, text: impl Into<String>) -> Self {
        let text = text.into().trim().to_string();
        Self {
            char_count: text.chars().count(),
            limit: kind.limit(),
            text,
        }
    }

    pub fn within_limit(&self) -> bool {
        self.char_count <= self.limit
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SeoMetadata {
    pub url_slugs: Vec<SeoField>,
    pub meta_descriptions: Vec<SeoField>,
    pub h1_variants: Vec<SeoField>,
    pub h2_headings: Vec<SeoField>,
    pub og_titles: Vec<SeoField>,
    pub og_descriptions: Vec<SeoField>,
}

impl SeoMetadata {
    pub fn fields(&self, kind: SeoFieldKind) -> &[SeoField] {
        match kind {
            SeoFieldKind::UrlSlug => &self.url_slugs,
            SeoFieldKind::MetaDescription => &self.meta_descriptions,
            SeoFieldKind::H1 => &self.h1_variants,
            SeoFieldKind::H2 => &self.h2_headings,
            SeoFieldKind::OgTitle => &self.og_titles,
            SeoFieldKind::OgDescription => &self.og_descriptions,
        }
    }

    pub fn is_empty(&self) -> bool {
        SeoFieldKind::ALL.iter().all(|k| self.fields(*k).is_empty())
    }

    /// Fields longer than their limit, paired with their kind.
    pub fn over_limit(&self) -> Vec<(SeoFieldKind, &SeoField)> {
        SeoFieldKind::ALL
            .iter()
            .flat_map(|kind| {
                self.fields(*kind)
                    .iter()
                    .filter(|f| !f.within_limit())
                    .map(move |f| (*kind, f))
            })
            .collect()
    }
}

/// How well copy lends itself to being quoted by AI assistants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoScore {
    pub overall: u8,
    pub answerability: u8,
    pub structure: u8,
    pub citation_worthiness: u8,
    pub specificity: u8,
    pub explanation: String,
    pub suggestions: Vec<String>,
}

/// Quality of a brief before anything is generated from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputEvaluation {
    pub score: u8,
    pub summary: String,
    pub tips: Vec<String>,
}
