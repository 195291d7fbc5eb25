//! The operations facade.
//!
//! Everything the builder console does goes through [`AgentForge`]: agent,
//! integration and action management, the action test console, knowledge
//! ingestion and search, and chat. API keys are encrypted on the way in and
//! only ever decrypted at the moment a provider or auth header needs them.

use crate::extractor::PlainTextExtractor;
use crate::providers::ProviderFactory;
use crate::repo::Repository;
use crate::retriever::KnowledgeContextRetriever;
use agentforge_actions::{ActionInvoker, InMemoryTestCaseSink, ReqwestTransport, TestCase, TestCaseSink};
use agentforge_agent::ChatOrchestrator;
use agentforge_config::AppConfig;
use agentforge_core::action::{
    Action, AuthConfig, ExecutionMode, HttpMethod, Integration, VarType, Variable,
};
use agentforge_core::agent::{Agent, LlmProvider};
use agentforge_core::error::{ChatError, Error, Result, ValidationError};
use agentforge_core::knowledge::{EmbeddingSpec, KnowledgeBase, ScoredChunk};
use agentforge_core::message::{ChatMessage, Transcript};
use agentforge_core::transport::{HttpRequestSpec, HttpTransport};
use agentforge_knowledge::{IngestionPipeline, InMemoryKnowledgeStore, KnowledgeStore, SearchIndex};
use agentforge_providers::ProviderRouter;
use agentforge_security::KeyVault;
use agentforge_template::{path_tokens, render_url, validate_action_templates};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const LOOP_LIMIT_REPLY: &str =
    "I wasn't able to finish this request because the tool-call limit was reached. \
     Please try rephrasing or narrowing the request.";

/// Fields for creating an agent. The API key is accepted here and stored
/// encrypted; it never comes back out.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDraft {
    pub name: String,
    #[serde(default)]
    pub system_prompt: String,
    pub llm_provider: LlmProvider,
    pub llm_model: String,
    #[serde(default)]
    pub api_key: String,
}

/// Fields for updating an agent. A missing or blank `apiKey` keeps the
/// stored key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentUpdate {
    pub name: String,
    #[serde(default)]
    pub system_prompt: String,
    pub llm_provider: LlmProvider,
    pub llm_model: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub method: HttpMethod,
    pub url: String,
    #[serde(default)]
    pub default_headers: BTreeMap<String, String>,
    #[serde(default)]
    pub default_params: BTreeMap<String, String>,
    #[serde(default)]
    pub auth_enabled: bool,
    #[serde(default)]
    pub auth_config: Vec<AuthConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDraft {
    pub name: String,
    pub description_for_llm: String,
    pub integration_id: String,
    pub execution_mode: ExecutionMode,
    #[serde(default)]
    pub variables: Vec<Variable>,
    #[serde(default)]
    pub body_template: Option<String>,
    #[serde(default)]
    pub url_template: Option<String>,
    #[serde(default)]
    pub query_template: Option<String>,
}

/// Outcome of a console test run (action or integration).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRunReport {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The assembled AgentForge engine.
pub struct AgentForge {
    vault: Arc<KeyVault>,
    agents: Repository<Agent>,
    integrations: Repository<Integration>,
    actions: Repository<Action>,
    kb_store: Arc<dyn KnowledgeStore>,
    pipeline: IngestionPipeline,
    index: SearchIndex,
    invoker: Arc<ActionInvoker>,
    orchestrator: ChatOrchestrator,
    providers: Arc<dyn ProviderFactory>,
    transport: Arc<dyn HttpTransport>,
    test_cases: Arc<dyn TestCaseSink>,
}

impl AgentForge {
    /// Production wiring: reqwest transport and the real provider router.
    pub fn new(config: AppConfig) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(Duration::from_secs(
            config.http.action_timeout_secs,
        )));
        let providers = Arc::new(ProviderRouter::new(
            Duration::from_secs(config.http.llm_timeout_secs),
            Duration::from_secs(config.http.embedding_timeout_secs),
        ));
        Self::with_components(config, transport, providers)
    }

    /// Assemble with injected transport and provider factory.
    pub fn with_components(
        config: AppConfig,
        transport: Arc<dyn HttpTransport>,
        providers: Arc<dyn ProviderFactory>,
    ) -> Result<Self> {
        let passphrase = config.secrets_passphrase.as_deref().ok_or(Error::Config {
            message: "secrets passphrase is not configured".into(),
        })?;
        let vault = Arc::new(KeyVault::new(passphrase));

        let agents: Repository<Agent> = Repository::new();
        let kb_store: Arc<dyn KnowledgeStore> = Arc::new(InMemoryKnowledgeStore::new());
        let pipeline = IngestionPipeline::new(
            kb_store.clone(),
            Arc::new(PlainTextExtractor::new()),
            config.knowledge.chunk_size,
            config.knowledge.chunk_overlap,
        );
        let index = SearchIndex::new(kb_store.clone());

        let invoker = Arc::new(ActionInvoker::new(transport.clone()));
        let retriever = Arc::new(KnowledgeContextRetriever::new(
            kb_store.clone(),
            agents.clone(),
            vault.clone(),
            providers.clone(),
            config.knowledge.context_top_k,
        ));
        let orchestrator = ChatOrchestrator::new(
            invoker.clone(),
            config.chat.max_tool_rounds,
            config.chat.max_tool_result_chars,
            config.chat.temperature,
        )
        .with_retriever(retriever);

        Ok(Self {
            vault,
            agents,
            integrations: Repository::new(),
            actions: Repository::new(),
            kb_store,
            pipeline,
            index,
            invoker,
            orchestrator,
            providers,
            transport,
            test_cases: Arc::new(InMemoryTestCaseSink::new()),
        })
    }

    // --- Agents ---

    pub async fn create_agent(&self, draft: AgentDraft) -> Result<Agent> {
        let mut violations = Vec::new();
        if draft.name.trim().is_empty() {
            violations.push("agent name must not be empty".to_string());
        }
        if draft.llm_model.trim().is_empty() {
            violations.push("llm model must not be empty".to_string());
        }
        if !violations.is_empty() {
            return Err(ValidationError::new(violations).into());
        }

        let mut agent = Agent::new(
            draft.name.trim(),
            draft.system_prompt,
            draft.llm_provider,
            draft.llm_model.trim(),
        );
        let key = draft.api_key.trim();
        if !key.is_empty() {
            agent.api_key_enc = self.vault.encrypt(key);
        }
        self.agents.insert(agent.id.clone(), agent.clone()).await;
        info!(agent_id = %agent.id, name = %agent.name, "Agent created");
        Ok(agent)
    }

    pub async fn get_agent(&self, agent_id: &str) -> Result<Agent> {
        self.agents
            .get(agent_id)
            .await
            .ok_or_else(|| Error::NotFound(format!("agent {agent_id}")))
    }

    pub async fn list_agents(&self) -> Vec<Agent> {
        self.agents.list().await
    }

    pub async fn update_agent(&self, agent_id: &str, update: AgentUpdate) -> Result<Agent> {
        let existing = self.get_agent(agent_id).await?;
        if update.name.trim().is_empty() {
            return Err(ValidationError::single("agent name must not be empty").into());
        }

        let api_key_enc = match update.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => self.vault.encrypt(key),
            // Blank or absent keeps the stored key.
            _ => existing.api_key_enc.clone(),
        };

        let updated = self
            .agents
            .modify(agent_id, |agent| {
                agent.name = update.name.trim().to_string();
                agent.system_prompt = update.system_prompt.clone();
                agent.llm_provider = update.llm_provider;
                agent.llm_model = update.llm_model.trim().to_string();
                agent.api_key_enc = api_key_enc.clone();
            })
            .await
            .ok_or_else(|| Error::NotFound(format!("agent {agent_id}")))?;
        Ok(updated)
    }

    /// Delete an agent and everything that only exists for it: its knowledge
    /// bases (with chunks and sources). Actions are shared and stay.
    pub async fn delete_agent(&self, agent_id: &str) -> Result<()> {
        self.agents
            .remove(agent_id)
            .await
            .ok_or_else(|| Error::NotFound(format!("agent {agent_id}")))?;

        for kb in self.kb_store.list_for_agent(agent_id).await? {
            self.kb_store.delete(&kb.id).await?;
        }
        info!(agent_id, "Agent deleted");
        Ok(())
    }

    pub async fn attach_action(&self, agent_id: &str, action_id: &str) -> Result<Agent> {
        if !self.actions.contains(action_id).await {
            return Err(Error::NotFound(format!("action {action_id}")));
        }
        self.agents
            .modify(agent_id, |agent| {
                if !agent.action_ids.iter().any(|id| id == action_id) {
                    agent.action_ids.push(action_id.to_string());
                }
            })
            .await
            .ok_or_else(|| Error::NotFound(format!("agent {agent_id}")))
    }

    pub async fn detach_action(&self, agent_id: &str, action_id: &str) -> Result<Agent> {
        self.agents
            .modify(agent_id, |agent| {
                agent.action_ids.retain(|id| id != action_id);
            })
            .await
            .ok_or_else(|| Error::NotFound(format!("agent {agent_id}")))
    }

    // --- Integrations ---

    pub async fn create_integration(&self, draft: IntegrationDraft) -> Result<Integration> {
        validate_integration_draft(&draft)?;
        let mut integration = Integration::new(draft.name.trim(), draft.method, draft.url.trim());
        integration.description = draft.description;
        integration.default_headers = draft.default_headers;
        integration.default_params = draft.default_params;
        integration.auth_enabled = draft.auth_enabled;
        integration.auth_config = normalize_auth(draft.auth_config);
        self.integrations
            .insert(integration.id.clone(), integration.clone())
            .await;
        Ok(integration)
    }

    pub async fn get_integration(&self, integration_id: &str) -> Result<Integration> {
        self.integrations
            .get(integration_id)
            .await
            .ok_or_else(|| Error::NotFound(format!("integration {integration_id}")))
    }

    pub async fn list_integrations(&self) -> Vec<Integration> {
        self.integrations.list().await
    }

    pub async fn update_integration(
        &self,
        integration_id: &str,
        draft: IntegrationDraft,
    ) -> Result<Integration> {
        validate_integration_draft(&draft)?;
        let auth_config = normalize_auth(draft.auth_config);
        self.integrations
            .modify(integration_id, |integration| {
                integration.name = draft.name.trim().to_string();
                integration.description = draft.description.clone();
                integration.method = draft.method;
                integration.url = draft.url.trim().to_string();
                integration.default_headers = draft.default_headers.clone();
                integration.default_params = draft.default_params.clone();
                integration.auth_enabled = draft.auth_enabled;
                integration.auth_config = auth_config.clone();
            })
            .await
            .ok_or_else(|| Error::NotFound(format!("integration {integration_id}")))
    }

    pub async fn delete_integration(&self, integration_id: &str) -> Result<()> {
        let in_use = self
            .actions
            .list()
            .await
            .iter()
            .any(|a| a.integration_id == integration_id);
        if in_use {
            return Err(
                ValidationError::single("integration is referenced by existing actions").into(),
            );
        }
        self.integrations
            .remove(integration_id)
            .await
            .ok_or_else(|| Error::NotFound(format!("integration {integration_id}")))?;
        Ok(())
    }

    /// Fire one request at the integration endpoint with defaults and auth
    /// applied. `{param}` placeholders in the URL are substituted from
    /// `inputs`; for POST and PUT the inputs not consumed by the URL go out
    /// as the JSON body. Never returns the transport failure as an `Err`;
    /// the report carries it.
    pub async fn test_integration(
        &self,
        integration_id: &str,
        inputs: BTreeMap<String, Value>,
    ) -> Result<TestRunReport> {
        let integration = self.get_integration(integration_id).await?;

        let path_params = path_tokens(&integration.url);
        let declared: Vec<Variable> = inputs
            .iter()
            .map(|(name, value)| Variable::new(name, var_type_of(value), ""))
            .collect();
        let url = render_url(&integration.url, &inputs, &declared)
            .map_err(|e| ValidationError::single(e.to_string()))?;

        let body = match integration.method {
            HttpMethod::Post | HttpMethod::Put => {
                let extra: serde_json::Map<String, Value> = inputs
                    .iter()
                    .filter(|(name, _)| !path_params.iter().any(|p| &p == name))
                    .map(|(name, value)| (name.clone(), value.clone()))
                    .collect();
                (!extra.is_empty()).then_some(Value::Object(extra))
            }
            _ => None,
        };

        let mut headers = integration.default_headers.clone();
        let mut query = integration.default_params.clone();
        let mut secrets = Vec::new();
        if integration.auth_enabled {
            for auth in &integration.auth_config {
                if auth.secret {
                    secrets.push(auth.value.clone());
                }
                match auth.placement {
                    agentforge_core::action::AuthPlacement::Header => {
                        headers.insert(auth.key.clone(), auth.value.clone())
                    }
                    agentforge_core::action::AuthPlacement::Query => {
                        query.insert(auth.key.clone(), auth.value.clone())
                    }
                };
            }
        }

        let request = HttpRequestSpec {
            method: integration.method,
            url,
            headers,
            query,
            body,
        };

        match self.transport.dispatch(request).await {
            Ok(response) => Ok(TestRunReport {
                ok: response.is_success(),
                status: Some(response.status),
                data: Some(response.body),
                error: None,
            }),
            Err(e) => Ok(TestRunReport {
                ok: false,
                status: None,
                data: None,
                error: Some(redact(&e.to_string(), &secrets)),
            }),
        }
    }

    // --- Actions ---

    pub async fn create_action(&self, draft: ActionDraft) -> Result<Action> {
        self.get_integration(&draft.integration_id).await?;
        self.ensure_action_name_free(&draft.name, None).await?;

        let mut action = Action::new(
            draft.name.trim(),
            draft.description_for_llm,
            draft.integration_id,
            draft.execution_mode,
        );
        action.variables = draft.variables;
        action.body_template = draft.body_template;
        action.url_template = draft.url_template;
        action.query_template = draft.query_template;
        validate_action_templates(&action)?;

        self.actions.insert(action.id.clone(), action.clone()).await;
        Ok(action)
    }

    pub async fn get_action(&self, action_id: &str) -> Result<Action> {
        self.actions
            .get(action_id)
            .await
            .ok_or_else(|| Error::NotFound(format!("action {action_id}")))
    }

    pub async fn list_actions(&self) -> Vec<Action> {
        self.actions.list().await
    }

    pub async fn update_action(&self, action_id: &str, draft: ActionDraft) -> Result<Action> {
        self.get_action(action_id).await?;
        self.get_integration(&draft.integration_id).await?;
        self.ensure_action_name_free(&draft.name, Some(action_id)).await?;

        let mut candidate = Action::new(
            draft.name.trim(),
            draft.description_for_llm.clone(),
            draft.integration_id.clone(),
            draft.execution_mode,
        );
        candidate.variables = draft.variables.clone();
        candidate.body_template = draft.body_template.clone();
        candidate.url_template = draft.url_template.clone();
        candidate.query_template = draft.query_template.clone();
        validate_action_templates(&candidate)?;

        self.actions
            .modify(action_id, |action| {
                action.name = candidate.name.clone();
                action.description_for_llm = candidate.description_for_llm.clone();
                action.integration_id = candidate.integration_id.clone();
                action.execution_mode = candidate.execution_mode;
                action.variables = candidate.variables.clone();
                action.body_template = candidate.body_template.clone();
                action.url_template = candidate.url_template.clone();
                action.query_template = candidate.query_template.clone();
            })
            .await
            .ok_or_else(|| Error::NotFound(format!("action {action_id}")))
    }

    pub async fn delete_action(&self, action_id: &str) -> Result<()> {
        self.actions
            .remove(action_id)
            .await
            .ok_or_else(|| Error::NotFound(format!("action {action_id}")))?;

        // Detach everywhere.
        for agent in self.agents.list().await {
            if agent.action_ids.iter().any(|id| id == action_id) {
                self.agents
                    .modify(&agent.id, |a| a.action_ids.retain(|id| id != action_id))
                    .await;
            }
        }
        Ok(())
    }

    /// Run an action directly from the test console. Failures come back in
    /// the report, and the run can be saved as a test case either way.
    pub async fn test_action(
        &self,
        action_id: &str,
        inputs: BTreeMap<String, Value>,
        save_test_case: bool,
    ) -> Result<TestRunReport> {
        let action = self.get_action(action_id).await?;
        let integration = self.get_integration(&action.integration_id).await?;

        let report = match self.invoker.invoke(&action, &integration, &inputs, None).await {
            Ok(outcome) => TestRunReport {
                ok: true,
                status: Some(outcome.status),
                data: Some(outcome.data),
                error: None,
            },
            Err(e) => TestRunReport {
                ok: false,
                status: None,
                data: None,
                error: Some(e.to_string()),
            },
        };

        if save_test_case {
            let case = match (&report.data, &report.error) {
                (Some(data), None) => TestCase::passed(
                    action_id,
                    inputs,
                    serde_json::json!({ "status": report.status, "data": data }),
                ),
                (_, Some(error)) => TestCase::failed(action_id, inputs, error.clone()),
                _ => TestCase::failed(action_id, inputs, "no outcome"),
            };
            self.test_cases.record(case).await;
        }
        Ok(report)
    }

    pub async fn saved_test_cases(&self, action_id: &str) -> Vec<TestCase> {
        self.test_cases.cases_for(action_id).await
    }

    // --- Knowledge ---

    pub async fn upload_knowledge_base(
        &self,
        agent_id: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<KnowledgeBase> {
        self.get_agent(agent_id).await?;
        if file_name.trim().is_empty() {
            return Err(ValidationError::single("file name must not be empty").into());
        }
        Ok(self.pipeline.upload(agent_id, file_name, bytes).await?)
    }

    pub async fn build_embeddings(
        &self,
        kb_id: &str,
        provider: LlmProvider,
        model: &str,
    ) -> Result<KnowledgeBase> {
        let kb = self
            .kb_store
            .get(kb_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("knowledge base {kb_id}")))?;
        let agent = self.get_agent(&kb.agent_id).await?;
        let key = self.decrypt_key(&agent)?.ok_or_else(|| {
            Error::Validation(ValidationError::single("agent has no API key configured"))
        })?;

        let embedder = self.providers.embedder(provider, &key);
        let spec = EmbeddingSpec {
            provider: provider.to_string(),
            model: model.to_string(),
        };
        Ok(self.pipeline.build_embeddings(kb_id, embedder, spec).await?)
    }

    pub async fn list_knowledge_bases(&self, agent_id: &str) -> Result<Vec<KnowledgeBase>> {
        self.get_agent(agent_id).await?;
        Ok(self.kb_store.list_for_agent(agent_id).await?)
    }

    pub async fn get_knowledge_base(&self, kb_id: &str) -> Result<KnowledgeBase> {
        self.kb_store
            .get(kb_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("knowledge base {kb_id}")))
    }

    pub async fn delete_knowledge_base(&self, kb_id: &str) -> Result<()> {
        self.get_knowledge_base(kb_id).await?;
        self.kb_store.delete(kb_id).await?;
        Ok(())
    }

    /// Score chunks from every READY knowledge base the agent owns against
    /// a query. Bases that are not READY are skipped.
    pub async fn search_knowledge_base(
        &self,
        agent_id: &str,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>> {
        let agent = self.get_agent(agent_id).await?;
        let api_key = self.decrypt_key(&agent)?;
        let bases = self.kb_store.list_for_agent(agent_id).await?;

        let providers = self.providers.clone();
        let hits = self
            .index
            .search(&bases, query, top_k, move |spec| {
                let provider = spec.provider.parse().ok()?;
                let key = api_key.as_deref()?;
                Some(providers.embedder(provider, key))
            })
            .await?;
        Ok(hits)
    }

    // --- Chat ---

    /// Run one chat turn for an agent against the supplied transcript. The
    /// returned assistant message carries all tool calls and results from
    /// the turn. Hitting the tool-round bound yields a polite assistant
    /// message rather than an error.
    pub async fn send_chat_message(
        &self,
        agent_id: &str,
        messages: Vec<ChatMessage>,
    ) -> Result<ChatMessage> {
        let agent = self.get_agent(agent_id).await?;
        let key = self.decrypt_key(&agent)?.ok_or_else(|| {
            Error::Validation(ValidationError::single("agent has no API key configured"))
        })?;

        let mut catalog = Vec::with_capacity(agent.action_ids.len());
        for action_id in &agent.action_ids {
            let Some(action) = self.actions.get(action_id).await else {
                warn!(agent_id, action_id, "Attached action no longer exists, skipping");
                continue;
            };
            let Some(integration) = self.integrations.get(&action.integration_id).await else {
                warn!(agent_id, action_id, "Action's integration is gone, skipping");
                continue;
            };
            catalog.push((action, integration));
        }

        let provider = self.providers.completion(agent.llm_provider, &key);
        let transcript = Transcript::from_messages(messages);

        match self
            .orchestrator
            .run_turn(&agent, &catalog, provider, Some(&key), &transcript)
            .await
        {
            Ok(message) => Ok(message),
            Err(ChatError::ToolLoopExceeded { rounds }) => {
                warn!(agent_id, rounds, "Turn ended at tool-round bound");
                Ok(ChatMessage::assistant(LOOP_LIMIT_REPLY))
            }
            Err(e) => Err(e.into()),
        }
    }

    // --- Internals ---

    async fn ensure_action_name_free(&self, name: &str, except: Option<&str>) -> Result<()> {
        if name.trim().is_empty() {
            return Err(ValidationError::single("action name must not be empty").into());
        }
        let clash = self
            .actions
            .list()
            .await
            .iter()
            .any(|a| a.name == name.trim() && Some(a.id.as_str()) != except);
        if clash {
            return Err(ValidationError::single(format!(
                "an action named '{}' already exists",
                name.trim()
            ))
            .into());
        }
        Ok(())
    }

    fn decrypt_key(&self, agent: &Agent) -> Result<Option<String>> {
        if agent.api_key_enc.is_empty() {
            return Ok(None);
        }
        self.vault
            .decrypt(&agent.api_key_enc)
            .map(Some)
            .map_err(|_| Error::Internal("stored API key could not be decrypted".into()))
    }
}

fn validate_integration_draft(draft: &IntegrationDraft) -> Result<()> {
    let mut violations = Vec::new();
    if draft.name.trim().is_empty() {
        violations.push("integration name must not be empty".to_string());
    }
    if draft.url.trim().is_empty() {
        violations.push("integration url must not be empty".to_string());
    }
    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::new(violations).into())
    }
}

/// The declared type that matches a test-console input value.
fn var_type_of(value: &Value) -> VarType {
    match value {
        Value::Number(_) => VarType::Number,
        Value::Bool(_) => VarType::Boolean,
        Value::Object(_) => VarType::Object,
        Value::Array(_) => VarType::Array,
        _ => VarType::String,
    }
}

/// Any auth entry whose key names an authorization header is forced secret.
fn normalize_auth(mut entries: Vec<AuthConfig>) -> Vec<AuthConfig> {
    for entry in &mut entries {
        if entry.key.to_ascii_lowercase().contains("authorization") {
            entry.secret = true;
        }
    }
    entries
}

fn redact(text: &str, secrets: &[String]) -> String {
    let mut out = text.to_string();
    for secret in secrets {
        if !secret.is_empty() {
            out = out.replace(secret, "[REDACTED]");
        }
    }
    out
}
