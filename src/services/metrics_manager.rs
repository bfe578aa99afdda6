use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::advisor::TurnOutcome;

#[derive(Debug, Default, Clone, Serialize)]
pub struct MetricsData {
    pub turn_outcomes: HashMap<TurnOutcome, u64>,
    pub citation_links: u64,
    pub mortgage_terms: HashMap<u32, u64>,
}

#[derive(Debug, Clone)]
pub struct MetricsManager {
    inner: Arc<RwLock<MetricsData>>,
}

impl Default for MetricsManager {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsManager {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MetricsData::default())),
        }
    }

    pub async fn record_turn(&self, outcome: TurnOutcome, links: usize) {
        let mut data = self.inner.write().await;
        *data.turn_outcomes.entry(outcome).or_insert(0) += 1;
        data.citation_links += links as u64;
    }

    pub async fn record_mortgage(&self, term_years: u32) {
        let mut data = self.inner.write().await;
        *data.mortgage_terms.entry(term_years).or_insert(0) += 1;
    }

    pub async fn get_metrics(&self) -> MetricsData {
        self.inner.read().await.clone()
    }
}
