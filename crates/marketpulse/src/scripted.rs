use std::{collections::VecDeque, sync::Arc, time::Duration};

use async_trait::async_trait;
use marketpulse_core::{
    AnalysisItem, AnalysisSummary, ItemSource, MarketPulseError, Summarizer,
};
use tokio::sync::Mutex;

/// Test/demo source serving queued item batches in order.
#[derive(Clone)]
pub struct ScriptedSource {
    batches: Arc<Mutex<VecDeque<Result<Vec<AnalysisItem>, MarketPulseError>>>>,
    calls: Arc<Mutex<usize>>,
    delay: Option<Duration>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self {
            batches: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(0)),
            delay: None,
        }
    }

    pub fn push_items(&self, items: Vec<AnalysisItem>) -> &Self {
        self.batches
            .try_lock()
            .expect("not concurrent during setup")
            .push_back(Ok(items));
        self
    }

    pub fn push_error(&self, error: MarketPulseError) -> &Self {
        self.batches
            .try_lock()
            .expect("not concurrent during setup")
            .push_back(Err(error));
        self
    }

    /// Sleep this long inside each `search` call, to widen race windows in
    /// single-flight tests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub async fn call_count(&self) -> usize {
        *self.calls.lock().await
    }
}

impl Default for ScriptedSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ItemSource for ScriptedSource {
    async fn search(&self, _query: &str) -> Result<Vec<AnalysisItem>, MarketPulseError> {
        *self.calls.lock().await += 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let mut batches = self.batches.lock().await;
        batches.pop_front().unwrap_or_else(|| {
            Err(MarketPulseError::Upstream {
                status: 0,
                message: "ScriptedSource exhausted".to_string(),
            })
        })
    }
}

/// Test/demo summarizer serving queued summaries in order.
#[derive(Clone)]
pub struct ScriptedSummarizer {
    summaries: Arc<Mutex<VecDeque<Result<AnalysisSummary, MarketPulseError>>>>,
    calls: Arc<Mutex<usize>>,
}

impl ScriptedSummarizer {
    pub fn new() -> Self {
        Self {
            summaries: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn push_summary(&self, summary: AnalysisSummary) -> &Self {
        self.summaries
            .try_lock()
            .expect("not concurrent during setup")
            .push_back(Ok(summary));
        self
    }

    pub fn push_error(&self, error: MarketPulseError) -> &Self {
        self.summaries
            .try_lock()
            .expect("not concurrent during setup")
            .push_back(Err(error));
        self
    }

    pub async fn call_count(&self) -> usize {
        *self.calls.lock().await
    }
}

impl Default for ScriptedSummarizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Summarizer for ScriptedSummarizer {
    async fn summarize(
        &self,
        _query: &str,
        _items: &[AnalysisItem],
    ) -> Result<AnalysisSummary, MarketPulseError> {
        *self.calls.lock().await += 1;
        let mut summaries = self.summaries.lock().await;
        summaries.pop_front().unwrap_or_else(|| {
            Err(MarketPulseError::Upstream {
                status: 0,
                message: "ScriptedSummarizer exhausted".to_string(),
            })
        })
    }
}
