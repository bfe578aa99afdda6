// src/message.rs
use serde::{Deserialize, Serialize};

use crate::services::advisor::{CitationLink, GeoCoordinate};

#[derive(Deserialize)]
pub struct ChatRequest {
    pub session_id: Option<String>,
    pub message: String,
}

#[derive(Serialize, Deserialize)]
pub struct ChatResponse {
    pub session_id: String,
    pub reply: String,
    pub links: Vec<CitationLink>,
}

#[derive(Serialize, Deserialize)]
pub struct SessionCreated {
    pub session_id: String,
    pub greeting: String,
}

/// What the browser's geolocation prompt came back with.
#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum LocationReport {
    Granted { latitude: f64, longitude: f64 },
    Denied {
        #[serde(default)]
        reason: Option<String>,
    },
}

impl LocationReport {
    pub fn coordinate(&self) -> Option<GeoCoordinate> {
        match *self {
            LocationReport::Granted { latitude, longitude } => {
                Some(GeoCoordinate { latitude, longitude })
            }
            LocationReport::Denied { .. } => None,
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct LocationResponse {
    pub session_id: String,
    pub location: Option<GeoCoordinate>,
}
