//! The closed operation taxonomy a phase program can request and the
//! engine can fulfill. Every variant here has a LIVE and a SIMULATED
//! handler registered in `cadence-dispatch`; the engine itself never
//! interprets the contents of `params`/`result` beyond routing on `type`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The discriminant carried on the wire as `"type"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    InitWorkflow,
    Score,
    ScoreLog,
    Bash,
    Python,
    Generate,
    Submit,
    Log,
    LogWithAttributes,
    Action,
    Observation,
    GetUsage,
    GetTask,
    SaveState,
    WriteMessage,
    ReadMessages,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InitWorkflow => "init_workflow",
            Self::Score => "score",
            Self::ScoreLog => "score_log",
            Self::Bash => "bash",
            Self::Python => "python",
            Self::Generate => "generate",
            Self::Submit => "submit",
            Self::Log => "log",
            Self::LogWithAttributes => "log_with_attributes",
            Self::Action => "action",
            Self::Observation => "observation",
            Self::GetUsage => "get_usage",
            Self::GetTask => "get_task",
            Self::SaveState => "save_state",
            Self::WriteMessage => "write_message",
            Self::ReadMessages => "read_messages",
        }
    }
}

/// Free-form context carried alongside a request, echoed back on the
/// matching result. `extra` absorbs fields the engine doesn't know about
/// yet, mirroring the original's `extra="allow"` model config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tournament_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round_number: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_index: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_ids: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

// ---------------------------------------------------------------------
// init_workflow
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitWorkflowParams {
    pub workflow_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitWorkflowOutput {
    pub state_id: String,
    pub settings_path: String,
}

// ---------------------------------------------------------------------
// score / score_log
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreParams {}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreOutput {
    pub message: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreLogParams {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreLogEntry {
    pub elapsed_seconds: f64,
    pub score: Option<f64>,
    pub message: serde_json::Map<String, serde_json::Value>,
}

// ---------------------------------------------------------------------
// bash
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BashParams {
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BashOutput {
    pub stdout: String,
    pub stderr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<i32>,
}

// ---------------------------------------------------------------------
// python
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PythonParams {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PythonOutput {
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ---------------------------------------------------------------------
// generate
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSettings {
    pub model: String,
    #[serde(default)]
    pub temp: f64,
    #[serde(default = "one")]
    pub n: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub stop: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logprobs: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_key: Option<String>,
}

fn one() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationParams {
    pub settings: GenerationSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_values: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub functions: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_parameters: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelOutput {
    pub completion: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logprobs: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_blocking_errors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Vec<ModelOutput>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_completion_tokens_spent: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_prompt_tokens_spent: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

// ---------------------------------------------------------------------
// submit
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionParams {
    pub submission: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionOutput {
    pub status: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submission_id: Option<String>,
}

// ---------------------------------------------------------------------
// log / log_with_attributes
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogParams {
    pub content: serde_json::Value,
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "INFO".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogOutput {
    pub status: String,
    pub message: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogWithAttributesParams {
    pub content: serde_json::Value,
    pub attributes: serde_json::Map<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogWithAttributesOutput {
    pub status: String,
    pub message: String,
    pub timestamp: String,
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

// ---------------------------------------------------------------------
// action / observation
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionParams {
    pub action_type: String,
    pub parameters: serde_json::Map<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionOutput {
    pub status: String,
    pub message: String,
    pub action: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationParams {
    pub observation_type: String,
    pub content: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationOutput {
    pub status: String,
    pub message: String,
    pub observation: serde_json::Map<String, serde_json::Value>,
}

// ---------------------------------------------------------------------
// get_usage
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetUsageParams {}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RunUsage {
    pub tokens: i64,
    pub actions: i64,
    pub total_seconds: i64,
    pub cost: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct UsageCheckpoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_seconds: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetUsageOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint: Option<UsageCheckpoint>,
    pub is_paused: bool,
    pub usage: RunUsage,
    pub usage_limits: RunUsage,
}

// ---------------------------------------------------------------------
// get_task
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetTaskParams {}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ScoringInfo {
    pub intermediate: bool,
    pub visible_to_agent: bool,
    pub score_on_usage_limits: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetTaskOutput {
    pub instructions: String,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub scoring: ScoringInfo,
}

// ---------------------------------------------------------------------
// save_state
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveStateParams {
    pub state_id: String,
    pub state: serde_json::Value,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveStateOutput {
    pub status: String,
    pub message: String,
    pub snapshot_path: String,
}

// ---------------------------------------------------------------------
// write_message / read_messages (subagent mailbox, supplemented from
// original_source — see SPEC_FULL.md §3)
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteMessageParams {
    pub from_agent: String,
    pub to_agent: String,
    pub msg_type: String,
    pub content: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteMessageOutput {
    pub status: String,
    pub message: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadMessagesParams {
    pub agent_id: String,
    #[serde(default = "default_true")]
    pub remove: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadMessagesOutput {
    pub messages: Vec<serde_json::Value>,
}

// ---------------------------------------------------------------------
// Request / result envelopes
// ---------------------------------------------------------------------

macro_rules! operation_envelope {
    ($req:ident, $res:ident { $($variant:ident($params:ty, $output:ty) => $tag:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Serialize, Deserialize)]
        #[serde(tag = "type", rename_all = "snake_case")]
        pub enum $req {
            $(
                #[serde(rename = $tag)]
                $variant {
                    params: $params,
                    #[serde(default, skip_serializing_if = "Option::is_none")]
                    metadata: Option<OperationMetadata>,
                },
            )+
        }

        impl $req {
            pub fn kind(&self) -> OperationKind {
                match self {
                    $(Self::$variant { .. } => OperationKind::$variant,)+
                }
            }

            pub fn metadata(&self) -> Option<&OperationMetadata> {
                match self {
                    $(Self::$variant { metadata, .. } => metadata.as_ref(),)+
                }
            }

            pub fn metadata_mut(&mut self) -> &mut Option<OperationMetadata> {
                match self {
                    $(Self::$variant { metadata, .. } => metadata,)+
                }
            }
        }

        #[derive(Debug, Clone, Serialize, Deserialize)]
        #[serde(tag = "type", rename_all = "snake_case")]
        pub enum $res {
            $(
                #[serde(rename = $tag)]
                $variant {
                    result: $output,
                    #[serde(default, skip_serializing_if = "Option::is_none")]
                    error: Option<String>,
                    #[serde(default, skip_serializing_if = "Option::is_none")]
                    metadata: Option<OperationMetadata>,
                },
            )+
        }

        impl $res {
            pub fn kind(&self) -> OperationKind {
                match self {
                    $(Self::$variant { .. } => OperationKind::$variant,)+
                }
            }
        }
    };
}

operation_envelope!(OperationRequest, OperationResult {
    InitWorkflow(InitWorkflowParams, InitWorkflowOutput) => "init_workflow",
    Score(ScoreParams, ScoreOutput) => "score",
    ScoreLog(ScoreLogParams, Vec<ScoreLogEntry>) => "score_log",
    Bash(BashParams, BashOutput) => "bash",
    Python(PythonParams, PythonOutput) => "python",
    Generate(GenerationParams, GenerationOutput) => "generate",
    Submit(SubmissionParams, SubmissionOutput) => "submit",
    Log(LogParams, LogOutput) => "log",
    LogWithAttributes(LogWithAttributesParams, LogWithAttributesOutput) => "log_with_attributes",
    Action(ActionParams, ActionOutput) => "action",
    Observation(ObservationParams, ObservationOutput) => "observation",
    GetUsage(GetUsageParams, GetUsageOutput) => "get_usage",
    GetTask(GetTaskParams, GetTaskOutput) => "get_task",
    SaveState(SaveStateParams, SaveStateOutput) => "save_state",
    WriteMessage(WriteMessageParams, WriteMessageOutput) => "write_message",
    ReadMessages(ReadMessagesParams, ReadMessagesOutput) => "read_messages",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bash_request_round_trips_through_json() {
        let req = OperationRequest::Bash {
            params: BashParams {
                command: "echo hi".to_string(),
                timeout: Some(30),
                agent_id: None,
                extra: HashMap::new(),
            },
            metadata: Some(OperationMetadata {
                phase: Some("modular/phases/actor.py".to_string()),
                ..Default::default()
            }),
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains(r#""type":"bash""#));
        let back: OperationRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back.kind(), OperationKind::Bash);
    }

    #[test]
    fn unknown_fields_in_bash_params_are_preserved() {
        let json = r#"{"type":"bash","params":{"command":"ls","custom_field":42}}"#;
        let req: OperationRequest = serde_json::from_str(json).unwrap();
        match req {
            OperationRequest::Bash { params, .. } => {
                assert_eq!(
                    params.extra.get("custom_field"),
                    Some(&serde_json::json!(42))
                );
            }
            _ => panic!("expected bash request"),
        }
    }

    #[test]
    fn get_usage_result_round_trips() {
        let res = OperationResult::GetUsage {
            result: GetUsageOutput {
                checkpoint: None,
                is_paused: false,
                usage: RunUsage {
                    tokens: 10,
                    actions: 1,
                    total_seconds: 5,
                    cost: 0.01,
                },
                usage_limits: RunUsage {
                    tokens: 300_000,
                    actions: 1000,
                    total_seconds: 604_800,
                    cost: 100.0,
                },
            },
            error: None,
            metadata: None,
        };
        let json = serde_json::to_value(&res).unwrap();
        assert_eq!(json["type"], "get_usage");
        assert_eq!(json["result"]["usage"]["tokens"], 10);
    }

    #[test]
    fn operation_kind_as_str_matches_serde_tag() {
        for kind in [
            OperationKind::InitWorkflow,
            OperationKind::Bash,
            OperationKind::SaveState,
            OperationKind::ReadMessages,
        ] {
            let s = serde_json::to_value(kind).unwrap();
            assert_eq!(s.as_str().unwrap(), kind.as_str());
        }
    }
}
