// src/services/session_manager.rs
use std::{
    collections::HashMap,
    fmt::Debug,
    sync::Arc,
    time::{Duration, Instant},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::advisor::{CitationLink, GeoCoordinate};
use super::mortgage::{MortgageCalculator, MortgageInputs, MortgageResult, MortgageUpdate};

pub const GREETING: &str = "Hello! I'm your AI Real Estate Advisor. Ask me anything about property values, neighborhood insights, or investment analysis.";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session {0} not found")]
    NotFound(String),
    #[error("a reply is still being generated for this session")]
    Busy,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grounding_links: Option<Vec<CitationLink>>,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            grounding_links: None,
        }
    }

    pub fn with_links(mut self, links: Vec<CitationLink>) -> Self {
        self.grounding_links = Some(links);
        self
    }
}

/// Geolocation is asked for once; whatever comes back first sticks.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum LocationState {
    #[default]
    Pending,
    Resolved(Option<GeoCoordinate>),
}

impl LocationState {
    pub fn coordinate(&self) -> Option<GeoCoordinate> {
        match self {
            LocationState::Resolved(coord) => *coord,
            LocationState::Pending => None,
        }
    }
}

#[derive(Debug)]
pub struct Session {
    pub id: String,
    pub messages: Vec<ChatMessage>,
    pub location: LocationState,
    pub calculator: MortgageCalculator,
    pub busy: bool,
    pub last_active: Instant,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let mut calculator = MortgageCalculator::new(MortgageInputs::default());
        let session_id = id.clone();
        calculator.subscribe(move |inputs, result| {
            tracing::debug!(
                session_id = %session_id,
                term_years = inputs.term_years,
                monthly_payment = result.monthly_payment,
                "mortgage recomputed"
            );
        });
        Self {
            id,
            messages: Vec::new(),
            location: LocationState::Pending,
            calculator,
            busy: false,
            last_active: Instant::now(),
        }
    }
}

/// Snapshot handed out when a turn starts.
#[derive(Clone, Debug)]
pub struct TurnContext {
    pub history: Vec<ChatMessage>,
    pub location: Option<GeoCoordinate>,
}

#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<RwLock<HashMap<String, Session>>>,
    ttl: Duration,
}

impl Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl SessionManager {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    // Create a fresh session and return its id.
    pub async fn create_session(&self) -> String {
        let id = Uuid::new_v4().to_string();
        let session = Session::new(id.clone());

        let mut guard = self.inner.write().await;
        guard.insert(id.clone(), session);
        tracing::info!(session_id = %id, "session created");
        id
    }

    // Ensure there's a session with this id.
    pub async fn ensure_session(&self, id: &str) -> String {
        {
            let guard = self.inner.read().await;
            if guard.contains_key(id) {
                return id.to_string();
            }
        }
        let mut guard = self.inner.write().await;
        guard
            .entry(id.to_string())
            .or_insert_with(|| Session::new(id.to_string()));
        id.to_string()
    }

    /// Mark the session busy, record the user's message and snapshot what came before it.
    pub async fn begin_turn(
        &self,
        session_id: &str,
        user: ChatMessage,
    ) -> Result<TurnContext, SessionError> {
        let mut guard = self.inner.write().await;
        let session = guard
            .get_mut(session_id)
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;
        if session.busy {
            return Err(SessionError::Busy);
        }
        let history = session.messages.clone();
        session.messages.push(user);
        session.busy = true;
        session.last_active = Instant::now();
        Ok(TurnContext {
            history,
            location: session.location.coordinate(),
        })
    }

    /// Append the assistant's reply and release the busy flag. Returns the transcript length.
    pub async fn complete_turn(
        &self,
        session_id: &str,
        assistant: ChatMessage,
    ) -> Result<usize, SessionError> {
        let mut guard = self.inner.write().await;
        let session = guard
            .get_mut(session_id)
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;
        session.messages.push(assistant);
        session.busy = false;
        session.last_active = Instant::now();
        Ok(session.messages.len())
    }

    pub async fn is_busy(&self, session_id: &str) -> bool {
        let guard = self.inner.read().await;
        guard.get(session_id).is_some_and(|s| s.busy)
    }

    /// Record the geolocation outcome. Only the first report is kept.
    pub async fn resolve_location(
        &self,
        session_id: &str,
        location: Option<GeoCoordinate>,
    ) -> Result<Option<GeoCoordinate>, SessionError> {
        let mut guard = self.inner.write().await;
        let session = guard
            .get_mut(session_id)
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;
        match session.location {
            LocationState::Pending => {
                if location.is_none() {
                    tracing::debug!(session_id, "geolocation unavailable, continuing without it");
                }
                session.location = LocationState::Resolved(location);
            }
            LocationState::Resolved(_) => {
                tracing::debug!(session_id, "location already resolved, ignoring report");
            }
        }
        Ok(session.location.coordinate())
    }

    pub async fn location(&self, session_id: &str) -> Option<LocationState> {
        let guard = self.inner.read().await;
        guard.get(session_id).map(|s| s.location)
    }

    pub async fn mortgage_inputs(&self, session_id: &str) -> Option<MortgageInputs> {
        let guard = self.inner.read().await;
        guard.get(session_id).map(|s| s.calculator.inputs())
    }

    pub async fn update_mortgage(
        &self,
        session_id: &str,
        change: MortgageUpdate,
    ) -> Result<(MortgageInputs, MortgageResult), SessionError> {
        let mut guard = self.inner.write().await;
        let session = guard
            .get_mut(session_id)
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;
        let result = session.calculator.update(change);
        session.last_active = Instant::now();
        Ok((session.calculator.inputs(), result))
    }

    /// Get a copy of the session history
    pub async fn get_history(&self, session_id: &str) -> Option<Vec<ChatMessage>> {
        let guard = self.inner.read().await;
        guard.get(session_id).map(|s| s.messages.clone())
    }

    /// Remove a session by id
    pub async fn remove_session(&self, session_id: &str) -> bool {
        let mut guard = self.inner.write().await;
        guard.remove(session_id).is_some()
    }

    /// Remove sessions idle longer than ttl. Sessions with a turn in flight are kept.
    pub async fn purge_expired(&self) -> usize {
        let mut guard = self.inner.write().await;
        let now = Instant::now();
        let before = guard.len();
        guard.retain(|_, s| s.busy || now.duration_since(s.last_active) < self.ttl);
        before - guard.len()
    }
}
