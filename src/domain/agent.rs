use super::*;

use crate::helper;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const AGENT_ENDPOINT: &str = "/agent/chat";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct TraceStep {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, alias = "toolName", alias = "name")]
    pub tool: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AgentResponse {
    #[serde(alias = "response", alias = "message")]
    reply: String,
    #[serde(default)]
    history: Option<Vec<ChatTurn>>,
    #[serde(default)]
    trace: Vec<TraceStep>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AgentRequest<'a> {
    session_id: &'a str,
    message: &'a str,
    history: &'a [ChatTurn],
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgentReply {
    pub text: String,
    pub transfer_executed: bool,
}

/// A conversation with the remote agent. Every call carries the full
/// history; the history only grows when the agent answered.
pub struct AgentSession {
    endpoint: String,
    session_id: String,
    history: Vec<ChatTurn>,
    client: Client,
}

impl AgentSession {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        Ok(Self {
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), AGENT_ENDPOINT),
            session_id: Uuid::new_v4().to_string(),
            history: Vec::new(),
            client: helper::build_http_client(timeout)?,
        })
    }

    /// Resumes an earlier conversation.
    pub fn with_history(mut self, session_id: &str, history: Vec<ChatTurn>) -> Self {
        self.session_id = session_id.to_string();
        self.history = history;
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    pub fn send(&mut self, message: &str) -> Result<AgentReply, AppError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&AgentRequest {
                session_id: &self.session_id,
                message,
                history: &self.history,
            })
            .send()?;

        let body: AgentResponse = helper::read_json_response(response)?;
        let transfer_executed = trace_has_transfer(&body.trace);
        debug!(steps = body.trace.len(), transfer_executed, "agent replied");

        match body.history {
            Some(history) => self.history = history,
            None => {
                self.history.push(ChatTurn {
                    role: ChatRole::User,
                    content: message.to_string(),
                });
                self.history.push(ChatTurn {
                    role: ChatRole::Assistant,
                    content: body.reply.clone(),
                });
            }
        }

        Ok(AgentReply {
            text: body.reply,
            transfer_executed,
        })
    }
}

pub fn trace_has_transfer(trace: &[TraceStep]) -> bool {
    trace.iter().any(|step| {
        step.kind.to_ascii_lowercase().contains("tool")
            && step
                .tool
                .as_ref()
                .is_some_and(|t| t.to_ascii_lowercase().contains("transfer"))
    })
}
