//! Retrieval of the fragments most similar to the standalone question.

use crate::embeddings::EmbeddingProvider;
use crate::types::{DocumentFragment, ScoredFragment};
use crate::vector_index::VectorIndex;
use docchat_core::config::DEFAULT_TOP_K;
use docchat_core::AppResult;
use std::sync::Arc;

/// Embeds a question and looks up its nearest fragments.
pub struct Retriever {
    embeddings: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    top_k: usize,
}

impl Retriever {
    pub fn new(embeddings: Arc<dyn EmbeddingProvider>, index: Arc<dyn VectorIndex>) -> Self {
        Self {
            embeddings,
            index,
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Number of fragments returned per question (at least 1).
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Up to `top_k` fragments with scores, best first.
    ///
    /// The sort is stable so fragments with equal scores keep the order the
    /// index returned them in.
    pub async fn retrieve_scored(&self, standalone: &str) -> AppResult<Vec<ScoredFragment>> {
        let vector = self.embeddings.embed(standalone).await?;

        let mut results = self.index.query(&vector, self.top_k).await?;
        results.sort_by(ScoredFragment::best_first);
        results.truncate(self.top_k);

        if let (Some(first), Some(last)) = (results.first(), results.last()) {
            tracing::info!(
                "Retrieved {} fragments from {} (top score: {:.3}, lowest: {:.3})",
                results.len(),
                self.index.backend_name(),
                first.score,
                last.score
            );
        } else {
            tracing::info!("Retrieved no fragments from {}", self.index.backend_name());
        }

        Ok(results)
    }

    /// Up to `top_k` fragments, best first.
    pub async fn retrieve(&self, standalone: &str) -> AppResult<Vec<DocumentFragment>> {
        Ok(self
            .retrieve_scored(standalone)
            .await?
            .into_iter()
            .map(|scored| scored.fragment)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::support::{RecordingEmbeddings, StaticIndex};
    use docchat_core::AppError;

    fn scored(text: &str, score: f32) -> ScoredFragment {
        ScoredFragment::new(DocumentFragment::new(text), score)
    }

    #[tokio::test]
    async fn test_results_sorted_and_truncated() {
        let index = StaticIndex::new(vec![
            scored("c", 0.2),
            scored("a", 0.9),
            scored("e", 0.1),
            scored("b", 0.5),
            scored("d", 0.3),
            scored("f", 0.05),
        ]);
        let retriever = Retriever::new(RecordingEmbeddings::new(), index.clone());

        let results = retriever.retrieve_scored("refunds").await.unwrap();

        let texts: Vec<&str> = results.iter().map(|r| r.fragment.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b", "d", "c"]);
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(index.requested_k(), vec![4]);
    }

    #[tokio::test]
    async fn test_ties_keep_index_order() {
        let index = StaticIndex::new(vec![
            scored("first", 0.5),
            scored("second", 0.5),
            scored("third", 0.7),
        ]);
        let retriever = Retriever::new(RecordingEmbeddings::new(), index);

        let fragments = retriever.retrieve("q").await.unwrap();
        let texts: Vec<&str> = fragments.iter().map(|f| f.text.as_str()).collect();
        assert_eq!(texts, vec!["third", "first", "second"]);
    }

    #[tokio::test]
    async fn test_nan_scores_rank_last() {
        let index = StaticIndex::new(vec![
            scored("broken", f32::NAN),
            scored("low", 0.1),
            scored("also broken", -f32::NAN),
            scored("high", 0.8),
        ]);
        let retriever = Retriever::new(RecordingEmbeddings::new(), index);

        let fragments = retriever.retrieve("q").await.unwrap();
        let texts: Vec<&str> = fragments.iter().map(|f| f.text.as_str()).collect();
        assert_eq!(texts, vec!["high", "low", "broken", "also broken"]);
    }

    #[tokio::test]
    async fn test_embeds_the_standalone_question() {
        let embeddings = RecordingEmbeddings::new();
        let retriever = Retriever::new(embeddings.clone(), StaticIndex::new(vec![]));

        let fragments = retriever.retrieve("What is the refund policy?").await.unwrap();

        assert!(fragments.is_empty());
        assert_eq!(embeddings.texts(), vec!["What is the refund policy?".to_string()]);
    }

    #[tokio::test]
    async fn test_custom_top_k() {
        let index = StaticIndex::new((0..10).map(|i| scored("x", i as f32)).collect());
        let retriever = Retriever::new(RecordingEmbeddings::new(), index).with_top_k(2);

        assert_eq!(retriever.retrieve("q").await.unwrap().len(), 2);
        assert_eq!(retriever.top_k(), 2);
    }

    #[tokio::test]
    async fn test_embedding_failure_propagates() {
        let retriever = Retriever::new(
            RecordingEmbeddings::failing("service down"),
            StaticIndex::new(vec![scored("a", 1.0)]),
        );

        let err = retriever.retrieve("q").await.unwrap_err();
        assert!(matches!(err, AppError::Embedding(_)));
    }

    #[tokio::test]
    async fn test_index_failure_propagates() {
        let retriever = Retriever::new(RecordingEmbeddings::new(), StaticIndex::failing("timeout"));

        let err = retriever.retrieve("q").await.unwrap_err();
        assert!(matches!(err, AppError::Index(_)));
    }
}
