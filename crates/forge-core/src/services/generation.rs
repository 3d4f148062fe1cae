//! Generation workflow - validate, pre-check credits, generate, bill, persist.

use std::sync::Arc;

use crate::domain::{Account, Generated, GenerationRequest, Post, word_count};
use crate::error::GenerationError;
use crate::ports::{CompletionRequest, GatewayError, GenerationStore, SamplingParams, TextGenerator};

use super::ledger::{self, CreditPolicy};

/// Longest derived title, in characters, before truncation kicks in.
const MAX_TITLE_CHARS: usize = 100;
const ELLIPSIS: &str = "...";
const UNTITLED: &str = "Untitled";

/// Everything a successful generation produces.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub post: Post,
    pub credits_remaining: i64,
    /// Usage report exactly as returned by the generator.
    pub usage: serde_json::Value,
    pub cost: i64,
}

/// Orchestrates one generation request end to end.
///
/// The workflow is a single sequential chain: no step runs concurrently and
/// nothing is retried. A failure before the final commit leaves no trace.
pub struct GenerationService {
    generator: Arc<dyn TextGenerator>,
    store: Arc<dyn GenerationStore>,
    policy: CreditPolicy,
    sampling: SamplingParams,
}

impl GenerationService {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        store: Arc<dyn GenerationStore>,
        policy: CreditPolicy,
    ) -> Self {
        Self {
            generator,
            store,
            policy,
            sampling: SamplingParams::default(),
        }
    }

    pub fn policy(&self) -> &CreditPolicy {
        &self.policy
    }

    /// Generate content for `account` and persist it as a new post.
    #[tracing::instrument(
        skip_all,
        fields(account_id = %account.id, category = %request.category, model = %request.model)
    )]
    pub async fn generate(
        &self,
        account: &Account,
        request: GenerationRequest,
    ) -> Result<GenerationOutcome, GenerationError> {
        if request.prompt.trim().is_empty() {
            return Err(GenerationError::Validation("Prompt is required".to_string()));
        }

        let preflight_cost = self.policy.preflight_cost();
        if !ledger::sufficient_funds(account.credits, preflight_cost) {
            tracing::info!(
                credits = account.credits,
                required = preflight_cost,
                "Rejecting generation: not enough credits"
            );
            return Err(GenerationError::InsufficientCredits {
                required: preflight_cost,
                available: account.credits,
            });
        }

        tracing::debug!("Calling text generator");
        let completion = self
            .generator
            .complete(CompletionRequest {
                model: request.model.clone(),
                instructions: request.category.instruction().to_string(),
                input: request.prompt.clone(),
                sampling: self.sampling,
            })
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "Text generator call failed"))?;

        let body = completion.text.trim();
        if body.is_empty() {
            return Err(GatewayError::MalformedResponse("No content generated".to_string()).into());
        }

        let words = word_count(body);
        if words < self.policy.min_generated_words {
            tracing::warn!(words, "Generated content below minimum length");
            return Err(GenerationError::ContentTooShort {
                words,
                minimum: self.policy.min_generated_words,
            });
        }

        let cost = self.policy.cost_for(words);
        let title = derive_title(request.title.as_deref(), body);
        let tokens_used = completion.total_tokens().unwrap_or(0);

        let post = Post::generated(
            account.id,
            title,
            body.to_string(),
            request.category,
            Generated {
                prompt: request.prompt,
                model: request.model,
                tokens_used,
            },
        );

        let committed = self
            .store
            .commit_generation(post, cost)
            .await
            .map_err(|e| {
                tracing::error!(
                    account_id = %account.id,
                    cost,
                    words,
                    error = %e,
                    "Generated content could not be persisted; balance left unchanged"
                );
                GenerationError::Persistence(e)
            })?;

        tracing::info!(
            post_id = %committed.post.id,
            words,
            cost,
            credits_remaining = committed.credits_remaining,
            "Generation completed"
        );

        Ok(GenerationOutcome {
            post: committed.post,
            credits_remaining: committed.credits_remaining,
            usage: completion.usage,
            cost,
        })
    }
}

/// Pick the post title.
///
/// A non-empty caller title wins verbatim, whitespace included. Otherwise the first line of `body`
/// is used with leading `#` heading markers removed, cut to 97 characters plus
/// an ellipsis when longer than 100 characters.
pub fn derive_title(requested: Option<&str>, body: &str) -> String {
    if let Some(title) = requested.filter(|t| !t.is_empty()) {
        return title.to_string();
    }

    let first_line = body.lines().next().unwrap_or_default();
    // Every leading '#' goes, so "### Notes" titles as "Notes" rather than "## Notes".
    let heading = first_line.trim_start_matches('#').trim();

    if heading.is_empty() {
        return UNTITLED.to_string();
    }

    if heading.chars().count() > MAX_TITLE_CHARS {
        let keep = MAX_TITLE_CHARS - ELLIPSIS.len();
        let mut truncated: String = heading.chars().take(keep).collect();
        truncated.push_str(ELLIPSIS);
        truncated
    } else {
        heading.to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::domain::Category;
    use crate::error::RepoError;
    use crate::ports::{CommittedGeneration, Completion};

    /// Generator returning a fixed result and recording every request.
    struct ScriptedGenerator {
        result: Result<Completion, GatewayError>,
        calls: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedGenerator {
        fn replying(text: String) -> Self {
            Self {
                result: Ok(Completion {
                    text,
                    usage: serde_json::json!({ "total_tokens": 321 }),
                }),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing(err: GatewayError) -> Self {
            Self {
                result: Err(err),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn complete(&self, request: CompletionRequest) -> Result<Completion, GatewayError> {
            self.calls.lock().unwrap().push(request);
            self.result.clone()
        }
    }

    /// Store tracking one balance and the posts committed against it.
    struct LedgerStore {
        balance: Mutex<i64>,
        posts: Mutex<Vec<Post>>,
        fail: bool,
    }

    impl LedgerStore {
        fn with_balance(balance: i64) -> Self {
            Self {
                balance: Mutex::new(balance),
                posts: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn balance(&self) -> i64 {
            *self.balance.lock().unwrap()
        }

        fn post_count(&self) -> usize {
            self.posts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl GenerationStore for LedgerStore {
        async fn commit_generation(
            &self,
            post: Post,
            cost: i64,
        ) -> Result<CommittedGeneration, RepoError> {
            if self.fail {
                return Err(RepoError::Connection("store offline".to_string()));
            }
            let mut balance = self.balance.lock().unwrap();
            *balance = ledger::apply_deduction(*balance, cost);
            self.posts.lock().unwrap().push(post.clone());
            Ok(CommittedGeneration {
                post,
                credits_remaining: *balance,
            })
        }
    }

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    fn account_with(credits: i64) -> Account {
        let mut account = Account::new(None, "writer@example.com", "hash".to_string(), 0);
        account.credits = credits;
        account
    }

    fn service(
        generator: &Arc<ScriptedGenerator>,
        store: &Arc<LedgerStore>,
    ) -> GenerationService {
        GenerationService::new(generator.clone(), store.clone(), CreditPolicy::default())
    }

    #[tokio::test]
    async fn test_generation_bills_actual_words() {
        let generator = Arc::new(ScriptedGenerator::replying(words(250)));
        let store = Arc::new(LedgerStore::with_balance(10));
        let account = account_with(10);

        let outcome = service(&generator, &store)
            .generate(&account, GenerationRequest::new("Write about Rust"))
            .await
            .unwrap();

        assert_eq!(outcome.cost, 3);
        assert_eq!(outcome.credits_remaining, 7);
        assert_eq!(outcome.post.word_count, 250);
        assert_eq!(outcome.post.tokens_used, Some(321));
        assert_eq!(outcome.post.prompt.as_deref(), Some("Write about Rust"));
        assert_eq!(outcome.post.user_id, account.id);
        assert_eq!(outcome.usage["total_tokens"], 321);
        assert_eq!(store.balance(), 7);
        assert_eq!(store.post_count(), 1);
    }

    #[tokio::test]
    async fn test_blank_prompt_is_rejected_before_any_call() {
        let generator = Arc::new(ScriptedGenerator::replying(words(50)));
        let store = Arc::new(LedgerStore::with_balance(10));

        let result = service(&generator, &store)
            .generate(&account_with(10), GenerationRequest::new("   \n"))
            .await;

        assert!(matches!(result, Err(GenerationError::Validation(_))));
        assert_eq!(generator.call_count(), 0);
        assert_eq!(store.post_count(), 0);
    }

    #[tokio::test]
    async fn test_insufficient_credits_skip_the_generator() {
        let generator = Arc::new(ScriptedGenerator::replying(words(50)));
        let store = Arc::new(LedgerStore::with_balance(1));

        let result = service(&generator, &store)
            .generate(&account_with(1), GenerationRequest::new("Write"))
            .await;

        assert!(matches!(
            result,
            Err(GenerationError::InsufficientCredits {
                required: 2,
                available: 1
            })
        ));
        assert_eq!(generator.call_count(), 0);
        assert_eq!(store.balance(), 1);
    }

    #[tokio::test]
    async fn test_short_content_is_not_billed() {
        let generator = Arc::new(ScriptedGenerator::replying(words(9)));
        let store = Arc::new(LedgerStore::with_balance(10));

        let result = service(&generator, &store)
            .generate(&account_with(10), GenerationRequest::new("Write"))
            .await;

        assert!(matches!(
            result,
            Err(GenerationError::ContentTooShort {
                words: 9,
                minimum: 10
            })
        ));
        assert_eq!(store.balance(), 10);
        assert_eq!(store.post_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_output_is_a_gateway_error() {
        let generator = Arc::new(ScriptedGenerator::replying("  \n ".to_string()));
        let store = Arc::new(LedgerStore::with_balance(10));

        let result = service(&generator, &store)
            .generate(&account_with(10), GenerationRequest::new("Write"))
            .await;

        assert!(matches!(
            result,
            Err(GenerationError::Gateway(GatewayError::MalformedResponse(_)))
        ));
        assert_eq!(store.post_count(), 0);
    }

    #[tokio::test]
    async fn test_gateway_failure_propagates_without_mutation() {
        let generator = Arc::new(ScriptedGenerator::failing(GatewayError::RateLimited {
            retry_after_secs: Some(5),
            message: "slow down".to_string(),
        }));
        let store = Arc::new(LedgerStore::with_balance(10));

        let result = service(&generator, &store)
            .generate(&account_with(10), GenerationRequest::new("Write"))
            .await;

        assert!(matches!(
            result,
            Err(GenerationError::Gateway(GatewayError::RateLimited { .. }))
        ));
        assert_eq!(generator.call_count(), 1);
        assert_eq!(store.balance(), 10);
    }

    #[tokio::test]
    async fn test_store_failure_surfaces_as_persistence_error() {
        let generator = Arc::new(ScriptedGenerator::replying(words(120)));
        let store = Arc::new(LedgerStore {
            fail: true,
            ..LedgerStore::with_balance(10)
        });

        let result = service(&generator, &store)
            .generate(&account_with(10), GenerationRequest::new("Write"))
            .await;

        assert!(matches!(result, Err(GenerationError::Persistence(_))));
    }

    #[tokio::test]
    async fn test_cost_above_balance_floors_at_zero() {
        let generator = Arc::new(ScriptedGenerator::replying(words(450)));
        let store = Arc::new(LedgerStore::with_balance(3));

        let outcome = service(&generator, &store)
            .generate(&account_with(3), GenerationRequest::new("Write"))
            .await
            .unwrap();

        assert_eq!(outcome.cost, 5);
        assert_eq!(outcome.credits_remaining, 0);
    }

    #[tokio::test]
    async fn test_request_carries_profile_model_and_sampling() {
        let generator = Arc::new(ScriptedGenerator::replying(words(20)));
        let store = Arc::new(LedgerStore::with_balance(10));
        let request = GenerationRequest::new("Launch copy")
            .with_category(Category::from_tag("xyz"))
            .with_model("llama-3.1-8b-instant");

        let outcome = service(&generator, &store)
            .generate(&account_with(10), request)
            .await
            .unwrap();

        let calls = generator.calls.lock().unwrap();
        assert_eq!(calls[0].instructions, Category::General.instruction());
        assert_eq!(calls[0].model, "llama-3.1-8b-instant");
        assert_eq!(calls[0].input, "Launch copy");
        assert_eq!(calls[0].sampling, SamplingParams::default());
        assert_eq!(outcome.post.category, Category::General);
        assert_eq!(outcome.post.model_used.as_deref(), Some("llama-3.1-8b-instant"));
    }

    #[tokio::test]
    async fn test_missing_usage_defaults_tokens_to_zero() {
        let generator = Arc::new(ScriptedGenerator {
            result: Ok(Completion {
                text: words(15),
                usage: serde_json::Value::Null,
            }),
            calls: Mutex::new(Vec::new()),
        });
        let store = Arc::new(LedgerStore::with_balance(10));

        let outcome = service(&generator, &store)
            .generate(&account_with(10), GenerationRequest::new("Write"))
            .await
            .unwrap();

        assert_eq!(outcome.post.tokens_used, Some(0));
    }

    #[test]
    fn test_caller_title_is_kept_verbatim() {
        assert_eq!(
            derive_title(Some("  My Title "), "# Heading\nbody"),
            "  My Title "
        );
    }

    #[test]
    fn test_whitespace_caller_title_is_kept_verbatim() {
        assert_eq!(derive_title(Some("   "), "# Heading\nbody"), "   ");
    }

    #[test]
    fn test_title_from_first_line_strips_heading_marker() {
        assert_eq!(derive_title(None, "# Heading\nbody text"), "Heading");
        assert_eq!(derive_title(Some(""), "## Sub heading\nbody"), "Sub heading");
        assert_eq!(derive_title(None, "Plain first line\nmore"), "Plain first line");
        assert_eq!(derive_title(None, "### Notes\nmore"), "Notes");
    }

    #[test]
    fn test_long_title_is_truncated_with_ellipsis() {
        let line = "x".repeat(150);
        let title = derive_title(None, &line);

        assert_eq!(title.chars().count(), 100);
        assert!(title.ends_with("..."));
        assert_eq!(&title[..97], &line[..97]);
    }

    #[test]
    fn test_title_of_exactly_limit_is_untouched() {
        let line = "y".repeat(100);
        assert_eq!(derive_title(None, &line), line);
    }

    #[test]
    fn test_empty_heading_becomes_untitled() {
        assert_eq!(derive_title(None, "#\nbody"), "Untitled");
    }
}
