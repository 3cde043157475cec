//! The agent state document: the one piece of data a phase program reads
//! in and hands back out, unmodified in shape, across the whole workflow.

use serde::{Deserialize, Serialize};

use crate::operation::{OperationRequest, OperationResult};

/// One element of a generator/advisor's output: a candidate continuation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Option {
    pub content: String,
    #[serde(default, skip_serializing_if = "std::option::Option::is_none")]
    pub function_call: std::option::Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "std::option::Option::is_none")]
    pub name: std::option::Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub extra_outputs: serde_json::Map<String, serde_json::Value>,
    /// Opaque, per spec.md §9 Design Notes: the engine never inspects a
    /// thinking block's contents, only (de)serializes it.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub thinking_blocks: Vec<ThinkingBlock>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ThinkingBlock {
    Thinking { thinking: String, signature: String },
    RedactedThinking { data: String },
}

/// One step of the agent's trajectory: whichever phase produced it
/// (`source`) and the options it proposed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub source: String,
    pub options: Vec<Option>,
    #[serde(default, skip_serializing_if = "std::option::Option::is_none")]
    pub token_usage: std::option::Option<i64>,
    #[serde(default, skip_serializing_if = "std::option::Option::is_none")]
    pub actions_usage: std::option::Option<i64>,
    #[serde(default, skip_serializing_if = "std::option::Option::is_none")]
    pub time_usage: std::option::Option<f64>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// A single (request, result) pair, the atomic unit of `previous_results`.
pub type OperationExchange = (OperationRequest, OperationResult);

/// Per-model sampling configuration for a generator/advisor/actor/rater.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiddlemanSettings {
    pub model: String,
    #[serde(default)]
    pub temp: f64,
    #[serde(default = "one_u32")]
    pub n: u32,
    #[serde(default, skip_serializing_if = "std::option::Option::is_none")]
    pub max_tokens: std::option::Option<u32>,
}

fn one_u32() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModularSettings {
    pub generator: MiddlemanSettings,
    #[serde(default = "default_limit_type")]
    pub limit_type: String,
    #[serde(default)]
    pub intermediate_scoring: bool,
    #[serde(default = "default_true")]
    pub enable_tool_use: bool,
    #[serde(default)]
    pub enable_xml: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriframeSettings {
    #[serde(default)]
    pub advisors: Vec<MiddlemanSettings>,
    #[serde(default)]
    pub actors: Vec<MiddlemanSettings>,
    #[serde(default)]
    pub raters: Vec<MiddlemanSettings>,
    #[serde(default = "default_limit_type")]
    pub limit_type: String,
    #[serde(default)]
    pub intermediate_scoring: bool,
    #[serde(default)]
    pub require_function_call: bool,
    #[serde(default = "default_true")]
    pub enable_advising: bool,
    #[serde(default = "default_true")]
    pub enable_tool_use: bool,
    #[serde(default)]
    pub enable_xml: bool,
}

fn default_limit_type() -> String {
    "token".to_string()
}

fn default_true() -> bool {
    true
}

/// Per spec.md §9's "State variants" design note: one tagged sum type
/// instead of two unrelated workflow state structs, so the engine can
/// round-trip a state document without knowing which workflow produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkflowSettings {
    Modular(ModularSettings),
    Triframe(TriframeSettings),
}

/// The full agent state document persisted by the State Store and passed
/// whole to every phase program.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentState {
    pub id: String,
    pub settings: WorkflowSettings,

    #[serde(default)]
    pub previous_results: Vec<Vec<OperationExchange>>,
    #[serde(default)]
    pub task_string: String,
    #[serde(default)]
    pub nodes: Vec<Node>,

    #[serde(default = "default_timeout")]
    pub timeout: i64,
    #[serde(default = "default_token_limit")]
    pub token_limit: i64,
    #[serde(default)]
    pub token_usage: i64,
    #[serde(default = "default_time_limit")]
    pub time_limit: f64,
    #[serde(default)]
    pub time_usage: f64,
    #[serde(default = "default_actions_limit")]
    pub actions_limit: i64,
    #[serde(default)]
    pub actions_usage: i64,

    #[serde(default)]
    pub scoring: serde_json::Map<String, serde_json::Value>,
    #[serde(default = "default_output_limit")]
    pub output_limit: i64,
    #[serde(default = "default_context_trimming_threshold")]
    pub context_trimming_threshold: i64,
    #[serde(default, skip_serializing_if = "std::option::Option::is_none")]
    pub last_rating_options: std::option::Option<Vec<Option>>,
}

fn default_timeout() -> i64 {
    60
}
fn default_token_limit() -> i64 {
    300_000
}
fn default_time_limit() -> f64 {
    604_800.0
}
fn default_actions_limit() -> i64 {
    1000
}
fn default_output_limit() -> i64 {
    10_000
}
fn default_context_trimming_threshold() -> i64 {
    500_000
}

impl AgentState {
    /// Pulls the latest `get_usage` result (if the most recent batch had
    /// one) and updates the three usage counters plus the trailing node's
    /// usage snapshot. If no `get_usage` result is present, the trailing
    /// node is still re-stamped from the state's existing counters so
    /// every node always carries a usage snapshot (per
    /// `original_source/flock/type_defs/states.py::AgentState.update_usage`).
    pub fn update_usage(&mut self) {
        use crate::operation::OperationResult;

        let latest_usage = self.previous_results.last().and_then(|batch| {
            batch.iter().find_map(|(_, result)| match result {
                OperationResult::GetUsage { result, .. } => Some(result.clone()),
                _ => None,
            })
        });

        if let Some(usage) = latest_usage {
            self.token_usage = usage.usage.tokens;
            self.actions_usage = usage.usage.actions;
            self.time_usage = usage.usage.total_seconds as f64;
        }

        if let Some(node) = self.nodes.last_mut() {
            node.token_usage = Some(self.token_usage);
            node.actions_usage = Some(self.actions_usage);
            node.time_usage = Some(self.time_usage);
        }
    }

    /// Appends `node` to the trajectory, stamping it with the state's
    /// current usage counters rather than whatever the caller may have
    /// set on it — the snapshot always reflects `self`, not the node's
    /// origin.
    pub fn append_node(&mut self, mut node: Node) {
        node.token_usage = Some(self.token_usage);
        node.actions_usage = Some(self.actions_usage);
        node.time_usage = Some(self.time_usage);
        self.nodes.push(node);
    }

    /// Initializes `task_string`, `scoring`, and the three usage limits
    /// from a `get_task`/`get_usage` pair, the way a workflow's `init`
    /// phase seeds a freshly created state.
    pub fn set_from_task_and_usage(
        &mut self,
        task: &crate::operation::GetTaskOutput,
        usage: &crate::operation::GetUsageOutput,
    ) {
        self.task_string = task.instructions.clone();
        self.scoring = serde_json::to_value(&task.scoring)
            .ok()
            .and_then(|value| value.as_object().cloned())
            .unwrap_or_default();
        self.token_limit = usage.usage_limits.tokens;
        self.actions_limit = usage.usage_limits.actions;
        self.time_limit = usage.usage_limits.total_seconds as f64;
    }
}
