//! Corpus question answering
//!
//! Reads every stored document, joins the texts with newlines, embeds
//! them with the question in a fixed prompt, and asks the configured
//! language model. The joined corpus is capped; when it exceeds the cap
//! the oldest text is kept and the rest is cut off.

use crate::config::QueryConfig;
use crate::db::Repository;
use crate::errors::{AppError, Result};
use crate::llm::{complete_timed, LanguageModel};
use std::sync::Arc;
use tracing::{info, warn};

/// Build the prompt sent upstream
pub fn build_prompt(corpus: &str, query: &str) -> String {
    format!(
        "The following is extracted text from a PDF:\n{}\n\nAnswer the following query: {}",
        corpus, query
    )
}

/// Prompt size in characters, as logged and recorded in metrics
pub fn prompt_chars(prompt: &str) -> usize {
    prompt.chars().count()
}

/// Joined corpus text, and whether the cap cut it short
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Corpus {
    pub text: String,
    pub truncated: bool,
}

/// Join document texts with `\n`, keeping at most `limit` characters
pub fn join_corpus<'a, I>(texts: I, limit: Option<usize>) -> Corpus
where
    I: IntoIterator<Item = &'a str>,
{
    let mut text = texts.into_iter().collect::<Vec<_>>().join("\n");

    let cut = limit.and_then(|limit| text.char_indices().nth(limit).map(|(idx, _)| idx));
    match cut {
        Some(idx) => {
            text.truncate(idx);
            Corpus { text, truncated: true }
        }
        None => Corpus { text, truncated: false },
    }
}

/// Answers questions against the whole stored corpus
pub struct QueryService {
    repo: Repository,
    model: Arc<dyn LanguageModel>,
    max_tokens: u32,
    corpus_limit: Option<usize>,
}

impl QueryService {
    pub fn new(
        repo: Repository,
        model: Arc<dyn LanguageModel>,
        max_tokens: u32,
        config: &QueryConfig,
    ) -> Self {
        Self {
            repo,
            model,
            max_tokens,
            corpus_limit: config.corpus_limit(),
        }
    }

    /// Answer `query` from every stored document
    pub async fn answer(&self, query: &str) -> Result<String> {
        if query.is_empty() {
            return Err(AppError::validation("No query provided"));
        }

        let documents = self.repo.all_documents().await?;
        if documents.is_empty() {
            return Err(AppError::NoDocuments);
        }

        let corpus = join_corpus(documents.iter().map(|d| d.text.as_str()), self.corpus_limit);
        if corpus.truncated {
            warn!(
                documents = documents.len(),
                limit = self.corpus_limit,
                "Corpus exceeds prompt cap, truncating"
            );
        }

        let prompt = build_prompt(&corpus.text, query);
        let chars = prompt_chars(&prompt);
        crate::metrics::record_query(chars);

        info!(
            documents = documents.len(),
            prompt_chars = chars,
            model = self.model.model_name(),
            "Sending query to LLM"
        );

        let reply = complete_timed(self.model.as_ref(), &prompt, self.max_tokens).await?;
        Ok(reply.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::llm::MockLanguageModel;

    async fn service_with(
        texts: &[&str],
        model: Arc<MockLanguageModel>,
        config: &QueryConfig,
    ) -> (QueryService, Repository) {
        let repo = Repository::connect(&DatabaseConfig::in_memory()).await.unwrap();
        for text in texts {
            repo.insert_document(text.to_string()).await.unwrap();
        }
        let service = QueryService::new(repo.clone(), model, 1000, config);
        (service, repo)
    }

    #[test]
    fn test_prompt_template() {
        assert_eq!(
            build_prompt("A\nB", "Q"),
            "The following is extracted text from a PDF:\nA\nB\n\nAnswer the following query: Q"
        );
    }

    #[test]
    fn test_prompt_size_counts_characters() {
        let prompt = build_prompt("Café über", "Q");
        assert!(prompt.len() > prompt_chars(&prompt));
        assert_eq!(
            prompt_chars(&prompt),
            build_prompt("Cafe uber", "Q").len()
        );
    }

    #[test]
    fn test_join_without_limit() {
        let corpus = join_corpus(["A", "B", "C"], None);
        assert_eq!(corpus.text, "A\nB\nC");
        assert!(!corpus.truncated);
    }

    #[test]
    fn test_join_keeps_oldest_text_within_limit() {
        let corpus = join_corpus(["hello", "world"], Some(7));
        assert_eq!(corpus.text, "hello\nw");
        assert!(corpus.truncated);

        let exact = join_corpus(["hello"], Some(5));
        assert_eq!(exact.text, "hello");
        assert!(!exact.truncated);
    }

    #[test]
    fn test_join_cuts_on_char_boundary() {
        let corpus = join_corpus(["héllo"], Some(2));
        assert_eq!(corpus.text, "hé");
    }

    #[tokio::test]
    async fn test_prompt_contains_corpus_then_query() {
        let model = Arc::new(MockLanguageModel::replying("  answer \n"));
        let (service, _repo) =
            service_with(&["A", "B"], model.clone(), &QueryConfig::default()).await;

        let reply = service.answer("Q").await.unwrap();
        assert_eq!(reply, "answer");

        let prompts = model.prompts();
        assert_eq!(prompts.len(), 1);
        let (prompt, max_tokens) = &prompts[0];
        assert_eq!(*max_tokens, 1000);

        let corpus_at = prompt.find("A\nB").unwrap();
        let query_at = prompt.rfind('Q').unwrap();
        assert!(corpus_at < query_at);
    }

    #[tokio::test]
    async fn test_empty_store_is_not_found() {
        let model = Arc::new(MockLanguageModel::replying("unused"));
        let (service, _repo) = service_with(&[], model.clone(), &QueryConfig::default()).await;

        let err = service.answer("anything").await.unwrap_err();
        assert!(matches!(err, AppError::NoDocuments));
        assert!(model.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_empty_query_is_rejected() {
        let model = Arc::new(MockLanguageModel::replying("unused"));
        let (service, _repo) = service_with(&["A"], model, &QueryConfig::default()).await;

        let err = service.answer("").await.unwrap_err();
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn test_provider_failure_leaves_store_untouched() {
        let model = Arc::new(MockLanguageModel::failing("quota exceeded"));
        let (service, repo) = service_with(&["A", "B"], model, &QueryConfig::default()).await;

        let err = service.answer("Q").await.unwrap_err();
        assert!(err.is_server_error());
        assert!(err.to_string().contains("quota exceeded"));

        let texts: Vec<String> = repo
            .all_documents()
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.text)
            .collect();
        assert_eq!(texts, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_corpus_cap_applies_to_prompt() {
        let model = Arc::new(MockLanguageModel::replying("ok"));
        let config = QueryConfig { max_corpus_chars: 3 };
        let (service, _repo) = service_with(&["AAAA", "BBBB"], model.clone(), &config).await;

        service.answer("Q").await.unwrap();

        let (prompt, _) = &model.prompts()[0];
        assert!(prompt.contains("PDF:\nAAA\n\nAnswer"));
        assert!(!prompt.contains("BBBB"));
    }
}
