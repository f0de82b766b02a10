//! Test fixtures for integration tests.
//!
//! Provides helpers for:
//! - A scripted provider that replays canned replies and records prompts
//! - Briefs with and without a word target
//! - Canned auxiliary JSON replies

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use copyloom::core::Brief;
use copyloom::prompt::PromptPair;
use copyloom::provider::{ProviderGateway, ProviderReply, TextProvider};
use copyloom::{Orchestrator, ProviderError};

/// One scripted provider turn.
#[derive(Debug, Clone)]
pub enum Step {
    Reply(String),
    Fail(ProviderError),
    /// Answers after a pause.
    Delayed(Duration, String),
    /// Never answers within a test's lifetime.
    Hang,
}

/// Provider that replays a fixed script.
pub struct ScriptedProvider {
    steps: Mutex<VecDeque<Step>>,
    prompts: Mutex<Vec<PromptPair>>,
}

impl ScriptedProvider {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn replies(replies: &[&str]) -> Arc<Self> {
        Self::new(replies.iter().map(|r| Step::Reply(r.to_string())).collect())
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<PromptPair> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn remaining(&self) -> usize {
        self.steps.lock().unwrap().len()
    }
}

#[async_trait]
impl TextProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, prompt: &PromptPair) -> Result<ProviderReply, ProviderError> {
        self.prompts.lock().unwrap().push(prompt.clone());
        let step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .expect("scripted provider ran out of steps");
        match step {
            Step::Reply(text) => {
                let tokens = text.split_whitespace().count() as u64 * 2;
                Ok(ProviderReply::new(text, tokens))
            }
            Step::Fail(err) => Err(err),
            Step::Delayed(pause, text) => {
                tokio::time::sleep(pause).await;
                Ok(ProviderReply::new(text, 1))
            }
            Step::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(ProviderError::transient("hang step woke up"))
            }
        }
    }
}

pub fn orchestrator(provider: &Arc<ScriptedProvider>) -> Orchestrator {
    let provider: Arc<dyn TextProvider> = provider.clone();
    Orchestrator::new(ProviderGateway::new(provider))
}

/// Copy with exactly `n` counted words.
pub fn words(n: usize) -> String {
    (0..n)
        .map(|i| format!("word{}", i))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn brief() -> Brief {
    let mut brief = Brief::default();
    brief.business.business_name = "Dawn Loaf".to_string();
    brief.business.product_description = "Sourdough delivered before 7am".to_string();
    brief.business.keywords = vec!["sourdough".to_string(), "delivery".to_string()];
    brief.audience.target_audience = "commuters".to_string();
    brief.tone.tone = "warm".to_string();
    brief
}

pub fn brief_with_target(target: u32) -> Brief {
    let mut brief = brief();
    brief.word_count = Some(target);
    brief
}

/// Poll until the provider has been called `n` times.
pub async fn wait_for_calls(provider: &ScriptedProvider, n: usize) {
    for _ in 0..500 {
        if provider.calls() >= n {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("provider was called {} times, expected {}", provider.calls(), n);
}

pub const SCORE_JSON: &str = r#"{"overall": 82, "clarity": 85, "persuasiveness": 78, "toneMatch": 88, "engagement": 76, "explanation": "Clear offer, warm tone."}"#;

pub const SEO_JSON: &str = r#"```json
{
  "urlSlugs": ["sourdough-delivery"],
  "metaDescriptions": ["Fresh sourdough at your door before 7am."],
  "h1Variants": ["Sourdough Before Sunrise"],
  "h2Headings": ["How delivery works"],
  "ogTitles": ["Dawn Loaf Sourdough Delivery"],
  "ogDescriptions": ["Wake up to warm bread."]
}
```"#;

pub const GEO_JSON: &str = r#"{"overall": 61, "answerability": 66, "structure": 58, "citationWorthiness": 55, "specificity": 70, "explanation": "Concrete times help.", "suggestions": ["Add delivery area"]}"#;
