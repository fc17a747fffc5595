use serde::Serialize;
use std::collections::BTreeMap;

/// `GET /health` response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Current UTC time.
    pub time: String,
    /// Omitted by the stateless service.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_dir: Option<String>,
    /// Number of recorded documents; omitted by the stateless service.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_files: Option<usize>,
    pub soffice_cmd: String,
    pub max_file_size: usize,
    pub conversion_timeout_secs: u64,
}

/// `GET /` response: what this service is and what it serves.
#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub service: &'static str,
    pub version: &'static str,
    pub endpoints: BTreeMap<&'static str, &'static str>,
    pub supported_formats: [&'static str; 5],
}
