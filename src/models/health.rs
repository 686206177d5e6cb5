use serde::Serialize;
use chrono::{DateTime, Utc};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub time: DateTime<Utc>,
}
