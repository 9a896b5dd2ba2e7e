//! Cross-module tests for the question answering pipeline.

pub(crate) mod support;
