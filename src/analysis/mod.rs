//! Essay analysis.
//!
//! The review service only sees the [`Analyzer`] trait; the bundled
//! [`MockAnalyzer`] is a deterministic rule-based engine standing in for a
//! real model call.

mod mock;

pub use mock::MockAnalyzer;
pub(crate) use mock::utf16_len;

use async_trait::async_trait;
use thiserror::Error;

use crate::db::models::{Correction, ReviewScores};

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Analyzer unavailable: {0}")]
    Unavailable(String),
}

/// Scores and span-anchored corrections produced for one essay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    pub scores: ReviewScores,
    pub corrections: Vec<Correction>,
}

#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, title: &str, content: &str) -> Result<AnalysisResult, AnalysisError>;
}
