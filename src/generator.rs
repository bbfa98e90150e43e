//! Summary generation from category instructions and fetched evidence.
//!
//! The prompt is fully determined by the instruction and the evidence: a
//! numbered context block, fixed structural requirements, and a request for a
//! trailing footnote-link section. Decoding runs at temperature zero.
//!
//! The footnote format is only requested from the model, never validated here.

use crate::api::{AskAsync, ChatMessage, ChatRequest};
use crate::error::GenerationError;
use crate::models::Evidence;
use crate::utils::{truncate_for_log, truncate_with_ellipsis};
use itertools::Itertools;
use std::fmt::Write as _;
use tracing::{error, info, instrument, warn};

pub const TEMPERATURE: f32 = 0.0;
pub const MAX_OUTPUT_TOKENS: u32 = 700;
pub const SNIPPET_MAX_CHARS: usize = 300;

const SYSTEM_PROMPT: &str = "You are a news editor writing concise, factual daily briefings. \
Use ONLY the articles supplied in the context. Do not add outside knowledge, speculation, or opinion.";

const USER_MESSAGE_REQUIREMENTS: &str = "\
Requirements:
1. Report only facts stated in the articles above. Keep a neutral, non-partisan tone.
2. Cover at most 5 distinct stories. For each story write a short markdown header (### ...) followed by one paragraph of 2-3 sentences.
3. After each factual claim, add a footnote marker such as [1] or [2] whose number matches the article index in the context.
4. Paraphrase. Do not lift short quoted fragments out of their original context.
5. If the articles do not contain enough information for a story, leave that story out rather than guessing.
6. End with a section titled \"Sources\" listing each footnote you used exactly once, one per line, as a markdown link reference: [n]: <source URL> \"<short label>\".";

/// Builds prompts and turns model output into summary text.
#[derive(Debug)]
pub struct SummaryGenerator<A> {
    api: A,
    model: String,
}

impl<A: AskAsync> SummaryGenerator<A> {
    pub fn new(api: A, model: impl Into<String>) -> Self {
        Self {
            api,
            model: model.into(),
        }
    }

    #[cfg(test)]
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Generate a summary for `category`.
    ///
    /// Returns the trimmed model output, or a [`GenerationError`] whose text is
    /// persisted in place of a summary. The API is not called when there is no
    /// usable evidence.
    #[instrument(level = "info", skip(self, instruction, evidence), fields(evidence = evidence.len()))]
    pub async fn generate(
        &self,
        category: &str,
        instruction: &str,
        evidence: &[Evidence],
    ) -> Result<String, GenerationError> {
        if evidence.is_empty() {
            info!("No evidence supplied; skipping generation");
            return Err(GenerationError::NoEvidence);
        }

        let usable: Vec<&Evidence> = evidence.iter().filter(|e| e.is_usable()).collect();
        if usable.is_empty() {
            warn!("All evidence lacked a link or snippet; skipping generation");
            return Err(GenerationError::UnusableEvidence);
        }

        let request = self.build_request(category, instruction, &usable);
        info!(
            sources = %usable.iter().map(|e| e.url.as_str()).join(", "),
            "Requesting summary"
        );

        let response = match self.api.ask(&request).await {
            Ok(r) => r,
            Err(e) => {
                error!(error = %e, "Generation API call failed");
                return Err(e);
            }
        };

        if response.finish_reason() == Some("length") {
            warn!("Generation hit the output token limit; summary may be cut short");
        }
        match response.content() {
            Some(text) => {
                info!(chars = text.len(), preview = %truncate_for_log(text, 120), "Summary generated");
                Ok(text.to_string())
            }
            None => {
                warn!("Generation API returned no content");
                Err(GenerationError::EmptyResponse)
            }
        }
    }

    /// The exact request sent for a category and its usable evidence.
    pub fn build_request(&self, category: &str, instruction: &str, usable: &[&Evidence]) -> ChatRequest {
        let user = format!(
            "Category: {category}\n\nInstruction: {instruction}\n\n{}\n{USER_MESSAGE_REQUIREMENTS}",
            context_block(usable)
        );
        ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(user)],
            temperature: TEMPERATURE,
            max_tokens: MAX_OUTPUT_TOKENS,
        }
    }
}

/// Numbered context block, one entry per evidence item, 1-based.
pub fn context_block(usable: &[&Evidence]) -> String {
    let mut block = String::from("Articles from the last 24 hours:\n");
    for (idx, item) in usable.iter().enumerate() {
        let source = if item.source_name.is_empty() {
            "unknown"
        } else {
            item.source_name.as_str()
        };
        let _ = write!(
            block,
            "\n[{n}] Title: {title}\n    URL: {url}\n    Source: {source}\n",
            n = idx + 1,
            title = item.title,
            url = item.url,
        );
        if let Some(ts) = item.published_at {
            let _ = writeln!(block, "    Published: {}", ts.to_rfc3339());
        }
        let _ = writeln!(
            block,
            "    Snippet: {}",
            truncate_with_ellipsis(&item.snippet, SNIPPET_MAX_CHARS)
        );
    }
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ChatChoice, ChatResponse};
    use std::cell::RefCell;

    enum Reply {
        Text(&'static str),
        Empty,
        Fail,
    }

    struct FakeApi {
        reply: Reply,
        requests: RefCell<Vec<ChatRequest>>,
    }

    impl FakeApi {
        fn new(reply: Reply) -> Self {
            Self {
                reply,
                requests: RefCell::new(Vec::new()),
            }
        }
    }

    impl AskAsync for FakeApi {
        async fn ask(&self, request: &ChatRequest) -> Result<ChatResponse, GenerationError> {
            self.requests.borrow_mut().push(request.clone());
            match self.reply {
                Reply::Text(t) => Ok(ChatResponse {
                    choices: vec![ChatChoice {
                        message: Some(ChatMessage {
                            role: "assistant".into(),
                            content: Some(t.into()),
                        }),
                        finish_reason: Some("stop".into()),
                    }],
                }),
                Reply::Empty => Ok(ChatResponse::default()),
                Reply::Fail => Err(GenerationError::Api("connection reset".into())),
            }
        }
    }

    fn ev(i: usize) -> Evidence {
        Evidence {
            title: format!("Story {i}"),
            url: format!("https://news.example.com/{i}"),
            snippet: format!("Snippet for story {i}."),
            source_name: "Example".into(),
            published_at: None,
        }
    }

    #[tokio::test]
    async fn test_empty_evidence_skips_api() {
        let generator = SummaryGenerator::new(FakeApi::new(Reply::Text("x")), "gpt-4o");
        let result = generator.generate("Sports", "summarize sports", &[]).await;
        assert_eq!(result, Err(GenerationError::NoEvidence));
        assert!(generator.api.requests.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_unusable_evidence_skips_api() {
        let mut a = ev(1);
        a.snippet = "  ".into();
        let mut b = ev(2);
        b.url = String::new();

        let generator = SummaryGenerator::new(FakeApi::new(Reply::Text("x")), "gpt-4o");
        let result = generator.generate("Sports", "summarize", &[a, b]).await;
        assert_eq!(result, Err(GenerationError::UnusableEvidence));
        assert!(generator.api.requests.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_successful_generation() {
        let generator = SummaryGenerator::new(
            FakeApi::new(Reply::Text("\n### Headline\nSomething happened [1].\n")),
            "gpt-4o-mini",
        );
        let text = generator
            .generate("World News", "summarize global events", &[ev(1), ev(2)])
            .await
            .unwrap();
        assert_eq!(text, "### Headline\nSomething happened [1].");

        let requests = generator.api.requests.borrow();
        assert_eq!(requests.len(), 1);
        let req = &requests[0];
        assert_eq!(req.model, "gpt-4o-mini");
        assert_eq!(req.temperature, TEMPERATURE);
        assert_eq!(req.max_tokens, MAX_OUTPUT_TOKENS);
        let user = req.messages[1].content.as_deref().unwrap();
        assert!(user.contains("summarize global events"));
        assert!(user.contains("[1] Title: Story 1"));
        assert!(user.contains("[2] Title: Story 2"));
        assert!(user.contains("Sources"));
    }

    #[tokio::test]
    async fn test_api_failure_is_error_tagged() {
        let generator = SummaryGenerator::new(FakeApi::new(Reply::Fail), "gpt-4o");
        let err = generator.generate("Tech", "summarize", &[ev(1)]).await.unwrap_err();
        assert!(err.to_string().starts_with("Error:"));
        assert!(matches!(err, GenerationError::Api(_)));
    }

    #[tokio::test]
    async fn test_empty_response_is_distinct() {
        let generator = SummaryGenerator::new(FakeApi::new(Reply::Empty), "gpt-4o");
        let err = generator.generate("Tech", "summarize", &[ev(1)]).await.unwrap_err();
        assert_eq!(err, GenerationError::EmptyResponse);
    }

    #[tokio::test]
    async fn test_unusable_items_are_not_numbered() {
        let mut bad = ev(1);
        bad.snippet = String::new();
        let generator = SummaryGenerator::new(FakeApi::new(Reply::Text("ok")), "gpt-4o");
        generator.generate("Tech", "summarize", &[bad, ev(2)]).await.unwrap();

        let requests = generator.api.requests.borrow();
        let user = requests[0].messages[1].content.as_deref().unwrap();
        assert!(user.contains("[1] Title: Story 2"));
        assert!(!user.contains("Story 1"));
    }

    #[test]
    fn test_context_block_truncates_snippets() {
        let mut item = ev(1);
        item.snippet = "x".repeat(SNIPPET_MAX_CHARS + 50);
        let block = context_block(&[&item]);
        let expected = format!("Snippet: {}...", "x".repeat(SNIPPET_MAX_CHARS));
        assert!(block.contains(&expected));
        assert!(block.contains("URL: https://news.example.com/1"));
        assert!(block.contains("Source: Example"));
    }

    #[test]
    fn test_request_is_deterministic() {
        let generator = SummaryGenerator::new(FakeApi::new(Reply::Empty), "gpt-4o");
        let (a, b) = (ev(1), ev(2));
        let first = generator.build_request("World News", "summarize", &[&a, &b]);
        let second = generator.build_request("World News", "summarize", &[&a, &b]);
        assert_eq!(first, second);
    }
}
