//! Dialogue model seam.
//!
//! The engine never talks to a language model. The driver asks a
//! [`DialogueModel`] for the assistant's reply and hands that reply to the
//! response processor.

use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use arena_engine::ClusterId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in the session history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
    /// Cluster the message belonged to
    pub cluster: ClusterId,
    pub at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn user(content: impl Into<String>, cluster: ClusterId) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            cluster,
            at: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>, cluster: ClusterId) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            cluster,
            at: Utc::now(),
        }
    }
}

/// Everything a dialogue model needs to produce the next reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueRequest {
    pub session_id: String,
    /// Cluster the reply should steer towards
    pub target_cluster: ClusterId,
    /// Suggested follow-up from the analyzer, if any point is still missing
    pub follow_up: Option<String>,
    pub overall_confidence: u8,
    pub history: Vec<HistoryEntry>,
    pub message: String,
}

/// Produces the assistant's free-text reply. May include the completion
/// marker when the model believes the interview is done.
#[async_trait]
pub trait DialogueModel: Send + Sync {
    async fn reply(&self, request: &DialogueRequest) -> Result<String>;
}

/// Replays canned replies in order. Errors once they run out.
pub struct ScriptedDialogue {
    replies: Mutex<VecDeque<String>>,
}

impl ScriptedDialogue {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
        }
    }

    pub fn remaining(&self) -> usize {
        self.replies.lock().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait]
impl DialogueModel for ScriptedDialogue {
    async fn reply(&self, request: &DialogueRequest) -> Result<String> {
        let mut replies = self
            .replies
            .lock()
            .map_err(|e| anyhow!("ScriptedDialogue mutex poisoned: {e}"))?;
        replies
            .pop_front()
            .ok_or_else(|| anyhow!("no scripted reply left for session {}", request.session_id))
    }
}

/// Replies with the analyzer's follow-up question, or the target cluster's
/// opening question. Never claims completion.
pub struct FollowUpDialogue;

#[async_trait]
impl DialogueModel for FollowUpDialogue {
    async fn reply(&self, request: &DialogueRequest) -> Result<String> {
        Ok(request
            .follow_up
            .clone()
            .unwrap_or_else(|| request.target_cluster.opening_question().to_string()))
    }
}
