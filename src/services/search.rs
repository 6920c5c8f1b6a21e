use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::language::CapturedName;

/// Longest name part the appointment backend accepts.
pub const MAX_NAME_LEN: usize = 80;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub start_utc: DateTime<Utc>,
    pub staff: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub service_name: Option<String>,
}

/// The appointment backend. Called once per confirmed name.
#[async_trait]
pub trait AppointmentSearch: Send + Sync {
    async fn search(&self, name: &CapturedName) -> Result<Vec<Appointment>>;
}

/// Trims both parts and checks them against the backend's limits.
pub fn validate_name(name: &CapturedName) -> Result<CapturedName> {
    let first_name = name.first_name.trim();
    let last_name = name.last_name.trim();
    for (field, value) in [("first name", first_name), ("last name", last_name)] {
        if value.is_empty() {
            return Err(Error::Search(format!("{field} is required")));
        }
        if value.chars().count() > MAX_NAME_LEN {
            return Err(Error::Search(format!(
                "{field} exceeds {MAX_NAME_LEN} characters"
            )));
        }
    }
    Ok(CapturedName {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
    })
}

#[derive(Clone)]
pub struct HttpAppointmentSearch {
    client: Client,
    endpoint: String,
}

impl HttpAppointmentSearch {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AppointmentSearch for HttpAppointmentSearch {
    async fn search(&self, name: &CapturedName) -> Result<Vec<Appointment>> {
        let body = validate_name(name)?;
        debug!(endpoint = %self.endpoint, "Searching appointments");

        let response = self.client.post(&self.endpoint).json(&body).send().await?;

        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => Err(Error::RateLimited),
            status if !status.is_success() => {
                warn!(%status, "Appointment search rejected");
                Err(Error::Search(format!("backend returned {status}")))
            }
            _ => Ok(response.json::<Vec<Appointment>>().await?),
        }
    }
}
