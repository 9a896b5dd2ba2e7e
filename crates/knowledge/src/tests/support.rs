//! Recording stand-ins for the three external services.

use crate::embeddings::EmbeddingProvider;
use crate::types::ScoredFragment;
use crate::vector_index::VectorIndex;
use docchat_core::{AppError, AppResult};
use docchat_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Completion client that replays scripted outcomes and records requests.
///
/// Once the script runs down to one entry that entry repeats forever.
pub struct RecordingLlm {
    script: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl RecordingLlm {
    pub fn scripted(script: Vec<Result<&str, &str>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(
                script
                    .into_iter()
                    .map(|r| r.map(str::to_string).map_err(str::to_string))
                    .collect(),
            ),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn replying(replies: &[&str]) -> Arc<Self> {
        Self::scripted(replies.iter().map(|r| Ok(*r)).collect())
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Self::scripted(vec![Err(message)])
    }

    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LlmClient for RecordingLlm {
    fn provider_name(&self) -> &str {
        "recording"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.requests.lock().unwrap().push(request.clone());

        let outcome = {
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                script.pop_front().unwrap()
            } else {
                script.front().cloned().unwrap()
            }
        };

        outcome
            .map(|content| LlmResponse {
                content,
                model: request.model.clone(),
                usage: LlmUsage::default(),
            })
            .map_err(AppError::Llm)
    }
}

/// Embedding provider that records every text and returns a fixed vector.
#[derive(Debug)]
pub struct RecordingEmbeddings {
    failure: Option<String>,
    texts: Mutex<Vec<String>>,
}

impl RecordingEmbeddings {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            failure: None,
            texts: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            failure: Some(message.to_string()),
            texts: Mutex::new(Vec::new()),
        })
    }

    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for RecordingEmbeddings {
    fn provider_name(&self) -> &str {
        "recording"
    }

    fn model_name(&self) -> &str {
        "fixed"
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        self.texts.lock().unwrap().extend(texts.iter().cloned());

        match self.failure {
            Some(ref message) => Err(AppError::Embedding(message.clone())),
            None => Ok(texts.iter().map(|_| vec![1.0, 0.0, 0.0]).collect()),
        }
    }
}

/// Index that hands back the same rows for every query, ignoring `top_k`.
pub struct StaticIndex {
    results: Vec<ScoredFragment>,
    failure: Option<String>,
    requested_k: Mutex<Vec<usize>>,
}

impl StaticIndex {
    pub fn new(results: Vec<ScoredFragment>) -> Arc<Self> {
        Arc::new(Self {
            results,
            failure: None,
            requested_k: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            results: Vec::new(),
            failure: Some(message.to_string()),
            requested_k: Mutex::new(Vec::new()),
        })
    }

    /// The `top_k` of every query so far.
    pub fn requested_k(&self) -> Vec<usize> {
        self.requested_k.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl VectorIndex for StaticIndex {
    fn backend_name(&self) -> &str {
        "static"
    }

    async fn query(&self, _vector: &[f32], top_k: usize) -> AppResult<Vec<ScoredFragment>> {
        self.requested_k.lock().unwrap().push(top_k);

        match self.failure {
            Some(ref message) => Err(AppError::Index(message.clone())),
            None => Ok(self.results.clone()),
        }
    }
}
