//! The chat turn state machine.
//!
//! One call to [`ChatOrchestrator::run_turn`] consumes the latest user
//! message and produces exactly one assistant message. In between, the
//! model may request tool calls; each batch executes concurrently, every
//! failure is reported back to the model as an errored tool result, and the
//! number of tool-execution rounds is hard-bounded. `POST_CALL` actions run
//! exactly once per turn even if the model never asks for them.

use crate::context::{context_block, ContextRetriever};
use agentforge_actions::ActionInvoker;
use agentforge_core::action::{Action, ExecutionMode, Integration};
use agentforge_core::agent::Agent;
use agentforge_core::error::ChatError;
use agentforge_core::message::{ChatMessage, Role, ToolCallRecord, ToolResultRecord, Transcript};
use agentforge_core::provider::{CompletionProvider, CompletionRequest, ToolDefinition};
use futures::future::join_all;
use serde_json::json;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Runs chat turns for agents.
pub struct ChatOrchestrator {
    invoker: Arc<ActionInvoker>,
    retriever: Option<Arc<dyn ContextRetriever>>,
    max_tool_rounds: u32,
    max_tool_result_chars: usize,
    temperature: f32,
}

impl ChatOrchestrator {
    pub fn new(
        invoker: Arc<ActionInvoker>,
        max_tool_rounds: u32,
        max_tool_result_chars: usize,
        temperature: f32,
    ) -> Self {
        Self {
            invoker,
            retriever: None,
            max_tool_rounds,
            max_tool_result_chars,
            temperature,
        }
    }

    /// Attach a knowledge-context retriever.
    pub fn with_retriever(mut self, retriever: Arc<dyn ContextRetriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    /// Run one turn. `catalog` holds the agent's attached actions with their
    /// integrations; `api_key` is the agent's decrypted provider key, reused
    /// for `{{API_KEY}}` auth placeholders. The returned assistant message
    /// carries every tool call and result from the turn.
    pub async fn run_turn(
        &self,
        agent: &Agent,
        catalog: &[(Action, Integration)],
        provider: Arc<dyn CompletionProvider>,
        api_key: Option<&str>,
        transcript: &Transcript,
    ) -> Result<ChatMessage, ChatError> {
        let system = self.build_system_prompt(agent, transcript).await;

        let mut messages = Vec::with_capacity(transcript.len() + 1);
        messages.push(ChatMessage::system(system));
        messages.extend(
            transcript
                .messages
                .iter()
                .filter(|m| m.role != Role::System)
                .cloned(),
        );

        let tools: Vec<ToolDefinition> =
            catalog.iter().map(|(a, _)| a.to_tool_definition()).collect();

        let mut all_calls: Vec<ToolCallRecord> = Vec::new();
        let mut all_results: Vec<ToolResultRecord> = Vec::new();
        let mut executed_post_call: HashSet<String> = HashSet::new();
        let mut rounds_used = 0u32;

        let content = loop {
            let request = CompletionRequest {
                model: agent.llm_model.clone(),
                messages: messages.clone(),
                tools: tools.clone(),
                temperature: self.temperature,
                max_tokens: None,
            };
            let response = provider.complete(request).await?;
            let assistant = response.message;

            if assistant.tool_calls.is_empty() {
                break assistant.content;
            }
            if rounds_used >= self.max_tool_rounds {
                warn!(agent_id = %agent.id, rounds = rounds_used, "Tool loop bound exceeded");
                return Err(ChatError::ToolLoopExceeded {
                    rounds: self.max_tool_rounds,
                });
            }
            rounds_used += 1;
            debug!(round = rounds_used, calls = assistant.tool_calls.len(), "Executing tool round");

            let calls = assistant.tool_calls.clone();
            messages.push(assistant);

            for call in &calls {
                if let Some((action, _)) = find_action(catalog, &call.tool) {
                    if action.execution_mode == ExecutionMode::PostCall {
                        executed_post_call.insert(action.id.clone());
                    }
                }
            }

            let results = join_all(
                calls
                    .iter()
                    .map(|call| self.execute_call(call, catalog, api_key)),
            )
            .await;

            for (call, result) in calls.into_iter().zip(results) {
                let mut tool_turn = ChatMessage::tool_result(
                    result.call_id.clone(),
                    self.truncate(&result_content(&result)),
                );
                tool_turn.tool_results.push(result.clone());
                messages.push(tool_turn);

                all_calls.push(call);
                all_results.push(result);
            }
        };

        // POST_CALL sweep: anything the model did not already trigger runs
        // now, with empty bindings. Results land on the final message only.
        for (action, integration) in catalog {
            if action.execution_mode != ExecutionMode::PostCall
                || executed_post_call.contains(&action.id)
            {
                continue;
            }
            let call = ToolCallRecord {
                id: format!("post_{}", action.id),
                tool: action.name.clone(),
                inputs: json!({}),
            };
            let result = match self
                .invoker
                .invoke(action, integration, &BTreeMap::new(), api_key)
                .await
            {
                Ok(outcome) => ToolResultRecord::ok(&call.id, &action.name, outcome.into_value()),
                Err(e) => ToolResultRecord::err(&call.id, &action.name, e.to_string()),
            };
            all_calls.push(call);
            all_results.push(result);
        }

        info!(agent_id = %agent.id, rounds = rounds_used, tool_calls = all_calls.len(), "Turn complete");

        let mut message = ChatMessage::assistant(content);
        message.tool_calls = all_calls;
        message.tool_results = all_results;
        Ok(message)
    }

    async fn build_system_prompt(&self, agent: &Agent, transcript: &Transcript) -> String {
        let mut system = agent.system_prompt.clone();
        let Some(retriever) = &self.retriever else {
            return system;
        };
        let Some(query) = transcript.last_user_content() else {
            return system;
        };
        match retriever.retrieve(&agent.id, query).await {
            Ok(chunks) => {
                if let Some(block) = context_block(&chunks) {
                    if !system.is_empty() {
                        system.push_str("\n\n");
                    }
                    system.push_str(&block);
                }
            }
            // Retrieval problems never block the turn.
            Err(e) => warn!(agent_id = %agent.id, error = %e, "Knowledge retrieval failed"),
        }
        system
    }

    async fn execute_call(
        &self,
        call: &ToolCallRecord,
        catalog: &[(Action, Integration)],
        api_key: Option<&str>,
    ) -> ToolResultRecord {
        let Some((action, integration)) = find_action(catalog, &call.tool) else {
            return ToolResultRecord::err(
                &call.id,
                &call.tool,
                format!("unknown action '{}'", call.tool),
            );
        };

        let Some(object) = call.inputs.as_object() else {
            return ToolResultRecord::err(&call.id, &call.tool, "tool inputs must be a JSON object");
        };
        let inputs: BTreeMap<String, serde_json::Value> =
            object.iter().map(|(k, v)| (k.clone(), v.clone())).collect();

        match self.invoker.invoke(action, integration, &inputs, api_key).await {
            Ok(outcome) => ToolResultRecord::ok(&call.id, &call.tool, outcome.into_value()),
            Err(e) => ToolResultRecord::err(&call.id, &call.tool, e.to_string()),
        }
    }

    /// Bound the copy of a tool result that the model sees; the transcript
    /// record keeps the full payload.
    fn truncate(&self, text: &str) -> String {
        if text.chars().count() <= self.max_tool_result_chars {
            return text.to_string();
        }
        let cut: String = text.chars().take(self.max_tool_result_chars).collect();
        format!("{cut}… [truncated]")
    }
}

fn find_action<'a>(
    catalog: &'a [(Action, Integration)],
    name: &str,
) -> Option<&'a (Action, Integration)> {
    catalog.iter().find(|(a, _)| a.name == name)
}

fn result_content(result: &ToolResultRecord) -> String {
    match (&result.output, &result.error) {
        (Some(output), _) => output.to_string(),
        (None, Some(error)) => json!({ "error": error }).to_string(),
        (None, None) => "null".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentforge_core::action::{HttpMethod, VarType, Variable};
    use agentforge_core::agent::LlmProvider;
    use agentforge_core::error::{ProviderError, TransportError};
    use agentforge_core::provider::CompletionResponse;
    use agentforge_core::transport::{HttpRequestSpec, HttpResponse, HttpTransport};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use tokio::sync::Mutex;

    /// Plays back scripted responses and records every request it saw.
    struct ScriptedProvider {
        responses: Mutex<VecDeque<CompletionResponse>>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedProvider {
        fn new(script: Vec<ChatMessage>) -> Self {
            let responses = script
                .into_iter()
                .map(|message| CompletionResponse {
                    message,
                    model: "test-model".into(),
                    usage: None,
                })
                .collect();
            Self {
                responses: Mutex::new(responses),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> Result<CompletionResponse, ProviderError> {
            self.requests.lock().await.push(request);
            self.responses
                .lock()
                .await
                .pop_front()
                .ok_or_else(|| ProviderError::Network("script exhausted".into()))
        }
    }

    struct MockTransport {
        response: Result<HttpResponse, TransportError>,
        seen: Mutex<Vec<HttpRequestSpec>>,
    }

    impl MockTransport {
        fn ok(status: u16, body: serde_json::Value) -> Self {
            Self {
                response: Ok(HttpResponse { status, body }),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                response: Err(TransportError::Network("connection refused".into())),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl HttpTransport for MockTransport {
        async fn dispatch(
            &self,
            request: HttpRequestSpec,
        ) -> Result<HttpResponse, TransportError> {
            self.seen.lock().await.push(request);
            self.response.clone()
        }
    }

    fn test_agent() -> Agent {
        Agent {
            id: "agent-1".into(),
            name: "Support".into(),
            system_prompt: "You are a support agent.".into(),
            llm_provider: LlmProvider::OpenAi,
            llm_model: "gpt-4o".into(),
            api_key_enc: String::new(),
            action_ids: Vec::new(),
        }
    }

    fn check_balance_catalog() -> Vec<(Action, Integration)> {
        let integration =
            Integration::new("balance-api", HttpMethod::Get, "https://api.x/bal/{userId}");
        let mut action = Action::new(
            "checkBalance",
            "Check a user's balance",
            &integration.id,
            ExecutionMode::OnCall,
        );
        action.variables = vec![Variable::new("userId", VarType::String, "The user ID")];
        vec![(action, integration)]
    }

    fn tool_call_message(tool: &str, inputs: serde_json::Value) -> ChatMessage {
        let mut msg = ChatMessage::assistant("");
        msg.tool_calls.push(ToolCallRecord {
            id: "call_1".into(),
            tool: tool.into(),
            inputs,
        });
        msg
    }

    fn orchestrator(transport: Arc<dyn HttpTransport>) -> ChatOrchestrator {
        ChatOrchestrator::new(Arc::new(ActionInvoker::new(transport)), 5, 8000, 0.7)
    }

    fn user_turn(text: &str) -> Transcript {
        Transcript::from_messages(vec![ChatMessage::user(text)])
    }

    #[tokio::test]
    async fn plain_answer_passes_through() {
        let provider = Arc::new(ScriptedProvider::new(vec![ChatMessage::assistant("Hi there!")]));
        let orch = orchestrator(Arc::new(MockTransport::ok(200, serde_json::Value::Null)));

        let reply = orch
            .run_turn(&test_agent(), &[], provider, None, &user_turn("hello"))
            .await
            .unwrap();
        assert_eq!(reply.content, "Hi there!");
        assert!(reply.tool_calls.is_empty());
    }

    #[tokio::test]
    async fn tool_round_trip_incorporates_result() {
        let transport = Arc::new(MockTransport::ok(200, json!({"balance": 120})));
        let provider = Arc::new(ScriptedProvider::new(vec![
            tool_call_message("checkBalance", json!({"userId": "7"})),
            ChatMessage::assistant("Your balance is 120."),
        ]));
        let orch = orchestrator(transport.clone());

        let reply = orch
            .run_turn(
                &test_agent(),
                &check_balance_catalog(),
                provider.clone(),
                None,
                &user_turn("what's my balance? I'm user 7"),
            )
            .await
            .unwrap();

        assert_eq!(reply.content, "Your balance is 120.");
        assert_eq!(reply.tool_calls.len(), 1);
        assert_eq!(reply.tool_results.len(), 1);
        assert_eq!(
            reply.tool_results[0].output,
            Some(json!({"status": 200, "data": {"balance": 120}}))
        );
        assert_eq!(transport.seen.lock().await[0].url, "https://api.x/bal/7");

        // Second model call saw the tool turn.
        let requests = provider.requests.lock().await;
        let last = requests.last().unwrap();
        assert!(last.messages.iter().any(|m| m.role == Role::Tool));
    }

    #[tokio::test]
    async fn tool_failure_is_reported_back_not_fatal() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            tool_call_message("checkBalance", json!({"userId": "7"})),
            ChatMessage::assistant("I could not reach the balance service."),
        ]));
        let orch = orchestrator(Arc::new(MockTransport::failing()));

        let reply = orch
            .run_turn(
                &test_agent(),
                &check_balance_catalog(),
                provider,
                None,
                &user_turn("balance?"),
            )
            .await
            .unwrap();

        assert!(reply.tool_results[0].is_err());
        assert_eq!(reply.content, "I could not reach the balance service.");
    }

    #[tokio::test]
    async fn unknown_tool_becomes_errored_result() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            tool_call_message("doesNotExist", json!({})),
            ChatMessage::assistant("Sorry, I cannot do that."),
        ]));
        let orch = orchestrator(Arc::new(MockTransport::ok(200, serde_json::Value::Null)));

        let reply = orch
            .run_turn(&test_agent(), &check_balance_catalog(), provider, None, &user_turn("hi"))
            .await
            .unwrap();

        assert!(reply.tool_results[0].is_err());
        assert!(reply.tool_results[0].error.as_ref().unwrap().contains("doesNotExist"));
    }

    #[tokio::test]
    async fn loop_bound_trips_after_max_rounds() {
        // The model requests a tool on every round, forever.
        let script: Vec<ChatMessage> = (0..6)
            .map(|_| tool_call_message("checkBalance", json!({"userId": "7"})))
            .collect();
        let provider = Arc::new(ScriptedProvider::new(script));
        let orch = orchestrator(Arc::new(MockTransport::ok(200, json!({"balance": 1}))));

        let err = orch
            .run_turn(
                &test_agent(),
                &check_balance_catalog(),
                provider,
                None,
                &user_turn("loop"),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ChatError::ToolLoopExceeded { rounds: 5 }));
    }

    #[tokio::test]
    async fn post_call_action_runs_once_without_model_request() {
        let transport = Arc::new(MockTransport::ok(200, json!({"logged": true})));
        let integration = Integration::new("audit", HttpMethod::Post, "https://api.x/audit");
        let action = Action::new(
            "auditLog",
            "Log the turn",
            &integration.id,
            ExecutionMode::PostCall,
        );
        let catalog = vec![(action, integration)];

        let provider = Arc::new(ScriptedProvider::new(vec![ChatMessage::assistant("Done.")]));
        let orch = orchestrator(transport.clone());

        let reply = orch
            .run_turn(&test_agent(), &catalog, provider, None, &user_turn("hi"))
            .await
            .unwrap();

        assert_eq!(reply.content, "Done.");
        assert_eq!(reply.tool_calls.len(), 1);
        assert_eq!(reply.tool_calls[0].tool, "auditLog");
        assert!(!reply.tool_results[0].is_err());
        assert_eq!(transport.seen.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn post_call_with_required_variables_records_validation_error() {
        let integration = Integration::new("audit", HttpMethod::Post, "https://api.x/audit");
        let mut action = Action::new(
            "auditLog",
            "Log the turn",
            &integration.id,
            ExecutionMode::PostCall,
        );
        action.variables = vec![Variable::new("note", VarType::String, "")];
        let catalog = vec![(action, integration)];

        let provider = Arc::new(ScriptedProvider::new(vec![ChatMessage::assistant("Done.")]));
        let orch = orchestrator(Arc::new(MockTransport::ok(200, serde_json::Value::Null)));

        let reply = orch
            .run_turn(&test_agent(), &catalog, provider, None, &user_turn("hi"))
            .await
            .unwrap();

        // The turn still completes; the sweep recorded the failure.
        assert_eq!(reply.content, "Done.");
        assert!(reply.tool_results[0].is_err());
        assert!(reply.tool_results[0].error.as_ref().unwrap().contains("note"));
    }

    #[tokio::test]
    async fn post_call_triggered_by_model_does_not_run_twice() {
        let transport = Arc::new(MockTransport::ok(200, json!({"logged": true})));
        let integration = Integration::new("audit", HttpMethod::Post, "https://api.x/audit");
        let action = Action::new(
            "auditLog",
            "Log the turn",
            &integration.id,
            ExecutionMode::PostCall,
        );
        let catalog = vec![(action, integration)];

        let provider = Arc::new(ScriptedProvider::new(vec![
            tool_call_message("auditLog", json!({})),
            ChatMessage::assistant("Logged."),
        ]));
        let orch = orchestrator(transport.clone());

        let reply = orch
            .run_turn(&test_agent(), &catalog, provider, None, &user_turn("hi"))
            .await
            .unwrap();

        assert_eq!(reply.tool_calls.len(), 1);
        assert_eq!(transport.seen.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn oversized_tool_result_truncated_for_model_only() {
        let big = "x".repeat(500);
        let transport = Arc::new(MockTransport::ok(200, json!({ "blob": big })));
        let provider = Arc::new(ScriptedProvider::new(vec![
            tool_call_message("checkBalance", json!({"userId": "7"})),
            ChatMessage::assistant("ok"),
        ]));
        let invoker = Arc::new(ActionInvoker::new(transport));
        let orch = ChatOrchestrator::new(invoker, 5, 100, 0.7);

        let reply = orch
            .run_turn(
                &test_agent(),
                &check_balance_catalog(),
                provider.clone(),
                None,
                &user_turn("balance"),
            )
            .await
            .unwrap();

        // Full payload in the record.
        let full = reply.tool_results[0].output.as_ref().unwrap().to_string();
        assert!(full.len() > 400);

        // Bounded copy in the tool turn the model saw.
        let requests = provider.requests.lock().await;
        let tool_turn = requests
            .last()
            .unwrap()
            .messages
            .iter()
            .find(|m| m.role == Role::Tool)
            .unwrap();
        assert!(tool_turn.content.chars().count() < 130);
        assert!(tool_turn.content.contains("[truncated]"));
    }

    #[tokio::test]
    async fn knowledge_context_lands_in_system_prompt() {
        struct FixedRetriever;

        #[async_trait]
        impl ContextRetriever for FixedRetriever {
            async fn retrieve(
                &self,
                _agent_id: &str,
                _query: &str,
            ) -> Result<Vec<agentforge_core::knowledge::ScoredChunk>, agentforge_core::error::IngestionError>
            {
                Ok(vec![agentforge_core::knowledge::ScoredChunk {
                    knowledge_base_id: "kb-1".into(),
                    ordinal: 0,
                    chunk_text: "Refunds within 30 days.".into(),
                    score: 0.95,
                }])
            }
        }

        let provider = Arc::new(ScriptedProvider::new(vec![ChatMessage::assistant("30 days.")]));
        let orch = orchestrator(Arc::new(MockTransport::ok(200, serde_json::Value::Null)))
            .with_retriever(Arc::new(FixedRetriever));

        orch.run_turn(&test_agent(), &[], provider.clone(), None, &user_turn("refund policy?"))
            .await
            .unwrap();

        let requests = provider.requests.lock().await;
        let system = &requests[0].messages[0];
        assert_eq!(system.role, Role::System);
        assert!(system.content.contains("You are a support agent."));
        assert!(system.content.contains("## Knowledge Context"));
        assert!(system.content.contains("Refunds within 30 days."));
    }

    #[tokio::test]
    async fn llm_transport_failure_is_fatal() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let orch = orchestrator(Arc::new(MockTransport::ok(200, serde_json::Value::Null)));

        let err = orch
            .run_turn(&test_agent(), &[], provider, None, &user_turn("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Transport(_)));
    }
}
