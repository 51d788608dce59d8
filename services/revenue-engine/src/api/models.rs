use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct TransferRequest {
    pub amount: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub platforms: usize,
    pub healthy_platforms: usize,
}
