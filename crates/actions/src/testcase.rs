//! Saved test cases from the action test console.
//!
//! When an operator tests an action and asks to keep the case, the run's
//! inputs and outcome are recorded through a sink so they can be replayed
//! later.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// One recorded action test run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub action_id: String,
    pub inputs: BTreeMap<String, Value>,
    /// Successful outcome, when the run succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    /// Error text, when it failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl TestCase {
    pub fn passed(action_id: impl Into<String>, inputs: BTreeMap<String, Value>, output: Value) -> Self {
        Self {
            action_id: action_id.into(),
            inputs,
            output: Some(output),
            error: None,
            recorded_at: Utc::now(),
        }
    }

    pub fn failed(
        action_id: impl Into<String>,
        inputs: BTreeMap<String, Value>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            action_id: action_id.into(),
            inputs,
            output: None,
            error: Some(error.into()),
            recorded_at: Utc::now(),
        }
    }
}

/// Destination for saved test cases.
#[async_trait]
pub trait TestCaseSink: Send + Sync {
    async fn record(&self, case: TestCase);

    async fn cases_for(&self, action_id: &str) -> Vec<TestCase>;
}

/// In-memory sink.
#[derive(Default, Clone)]
pub struct InMemoryTestCaseSink {
    cases: Arc<RwLock<Vec<TestCase>>>,
}

impl InMemoryTestCaseSink {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TestCaseSink for InMemoryTestCaseSink {
    async fn record(&self, case: TestCase) {
        self.cases.write().await.push(case);
    }

    async fn cases_for(&self, action_id: &str) -> Vec<TestCase> {
        self.cases
            .read()
            .await
            .iter()
            .filter(|c| c.action_id == action_id)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn records_and_filters_by_action() {
        let sink = InMemoryTestCaseSink::new();
        let inputs = BTreeMap::from([("userId".to_string(), json!("7"))]);
        sink.record(TestCase::passed("a-1", inputs.clone(), json!({"status": 200})))
            .await;
        sink.record(TestCase::failed("a-2", inputs, "boom")).await;

        let for_a1 = sink.cases_for("a-1").await;
        assert_eq!(for_a1.len(), 1);
        assert!(for_a1[0].output.is_some());
        assert!(sink.cases_for("a-2").await[0].error.is_some());
        assert!(sink.cases_for("a-3").await.is_empty());
    }
}
