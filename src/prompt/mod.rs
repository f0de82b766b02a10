//! Prompt assembly and the style registry.

pub mod assembler;
pub mod styles;

pub use assembler::{
    assemble, geo_prompt, input_evaluation_prompt, revision_prompt, score_prompt, seo_prompt,
    Adjustment, PromptPair, Request,
};
pub use styles::{Style, StyleCategory};
