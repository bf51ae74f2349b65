use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct AskRequest {
    pub query: Option<String>,
}

#[derive(Deserialize, Serialize)]
pub struct AskResponse {
    pub answer: String,
}

#[derive(Deserialize, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub files: Vec<String>,
}

#[derive(Deserialize, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub documents_indexed: usize,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
