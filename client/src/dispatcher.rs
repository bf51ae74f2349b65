//! The ask action: validate the submission, show the selected files, send
//! the question and render whatever comes back.

use crate::error::DispatchError;
use crate::page::Page;
use crate::selection::FileSelection;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3000";
pub const REQUIRED_FILE_COUNT: usize = 3;
pub const ASK_PATH: &str = "/ask";
pub const UPLOAD_PATH: &str = "/";
pub const UPLOAD_FIELD: &str = "pdf_files";

pub const INVALID_SUBMISSION_ALERT: &str =
    "Please upload exactly 3 PDF files and type your question.";
pub const REQUEST_FAILURE_ALERT: &str = "There was an error processing the request.";

#[derive(Debug, Serialize)]
pub struct AskRequest<'a> {
    pub query: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct AnswerResponse {
    pub answer: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Idle,
    Validating,
    Rejected,
    Sending,
    AwaitingResponse,
    Rendered,
    Errored,
}

#[derive(Debug)]
pub enum DispatchOutcome {
    /// Validation failed; nothing was sent.
    Rejected(DispatchError),
    Rendered(String),
    Errored(DispatchError),
}

impl DispatchOutcome {
    pub fn state(&self) -> DispatchState {
        match self {
            Self::Rejected(_) => DispatchState::Rejected,
            Self::Rendered(_) => DispatchState::Rendered,
            Self::Errored(_) => DispatchState::Errored,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Rendered(_))
    }
}

#[derive(Debug, Clone)]
pub struct DispatchConfig {
    pub base_url: String,
    /// Send the selected files as a multipart upload before asking.
    pub upload_files: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SERVER_URL.to_string(),
            upload_files: true,
        }
    }
}

/// Tracks the dispatch state machine and logs every transition.
struct Transitions(DispatchState);

impl Transitions {
    fn advance(&mut self, next: DispatchState) {
        log::debug!("dispatch: {:?} -> {:?}", self.0, next);
        self.0 = next;
    }
}

pub struct Dispatcher {
    client: Client,
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(config: DispatchConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: DispatchConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn set_upload_files(&mut self, upload_files: bool) {
        self.config.upload_files = upload_files;
    }

    pub fn validate(query: &str, files: &FileSelection) -> Result<(), DispatchError> {
        if files.len() != REQUIRED_FILE_COUNT || query.is_empty() {
            return Err(DispatchError::InvalidSubmission {
                expected: REQUIRED_FILE_COUNT,
                files: files.len(),
                empty_query: query.is_empty(),
            });
        }
        Ok(())
    }

    /// Runs one ask action against `page`. Every failure is reported to the
    /// page; the returned outcome is for callers that need the final state.
    pub async fn dispatch(
        &self,
        query: &str,
        files: &FileSelection,
        page: &mut dyn Page,
    ) -> DispatchOutcome {
        let mut state = Transitions(DispatchState::Idle);
        state.advance(DispatchState::Validating);

        if let Err(e) = Self::validate(query, files) {
            log::warn!("Rejected submission: {}", e);
            page.alert(INVALID_SUBMISSION_ALERT);
            state.advance(DispatchState::Rejected);
            state.advance(DispatchState::Idle);
            return DispatchOutcome::Rejected(e);
        }

        page.show_file_names(&files.listing());
        state.advance(DispatchState::Sending);

        let outcome = match self.send(query, files, &mut state).await {
            Ok(answer) => {
                page.show_answer(&answer);
                state.advance(DispatchState::Rendered);
                DispatchOutcome::Rendered(answer)
            }
            Err(e) => {
                log::error!("Error: {}", e);
                page.alert(REQUEST_FAILURE_ALERT);
                state.advance(DispatchState::Errored);
                DispatchOutcome::Errored(e)
            }
        };

        state.advance(DispatchState::Idle);
        outcome
    }

    async fn send(
        &self,
        query: &str,
        files: &FileSelection,
        state: &mut Transitions,
    ) -> Result<String, DispatchError> {
        if self.config.upload_files {
            self.upload(files).await?;
        } else {
            log::debug!("File upload disabled; only the query is sent");
        }

        let response = self
            .client
            .post(self.url(ASK_PATH))
            .json(&AskRequest { query })
            .send()
            .await
            .map_err(DispatchError::Network)?;
        state.advance(DispatchState::AwaitingResponse);

        parse_answer(response).await
    }

    /// Sends the selection as a multipart form, one `pdf_files` part per
    /// file in selection order.
    pub async fn upload(&self, files: &FileSelection) -> Result<(), DispatchError> {
        let form = build_upload_form(files).await?;

        let response = self
            .client
            .post(self.url(UPLOAD_PATH))
            .multipart(form)
            .send()
            .await
            .map_err(DispatchError::Network)?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    log::debug!("Failed to read upload error body: {}", e);
                    String::new()
                }
            };
            return Err(DispatchError::Status { status, body });
        }

        log::info!("Uploaded {} files", files.len());
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }
}

async fn build_upload_form(files: &FileSelection) -> Result<Form, DispatchError> {
    let mut form = Form::new();
    for file in files.files() {
        let bytes = tokio::fs::read(&file.path)
            .await
            .map_err(|source| DispatchError::FileRead {
                path: file.path.clone(),
                source,
            })?;
        let part = Part::bytes(bytes)
            .file_name(file.name.clone())
            .mime_str("application/pdf")
            .map_err(DispatchError::Network)?;
        form = form.part(UPLOAD_FIELD, part);
    }
    Ok(form)
}

async fn parse_answer(response: reqwest::Response) -> Result<String, DispatchError> {
    let status = response.status();
    let body = response.text().await.map_err(DispatchError::Network)?;

    if !status.is_success() {
        return Err(DispatchError::Status { status, body });
    }

    let parsed: AnswerResponse =
        serde_json::from_str(&body).map_err(DispatchError::MalformedResponse)?;
    Ok(parsed.answer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_requires_three_files_and_a_query() {
        let three = FileSelection::from_paths(["a.pdf", "b.pdf", "c.pdf"]);
        let two = FileSelection::from_paths(["a.pdf", "b.pdf"]);
        let four = FileSelection::from_paths(["a.pdf", "b.pdf", "c.pdf", "d.pdf"]);

        assert!(Dispatcher::validate("What is the total?", &three).is_ok());
        assert!(Dispatcher::validate("", &three).unwrap_err().is_invalid_submission());
        assert!(Dispatcher::validate("q", &two).is_err());
        assert!(Dispatcher::validate("q", &four).is_err());
        assert!(Dispatcher::validate("q", &FileSelection::default()).is_err());
    }

    #[test]
    fn whitespace_query_counts_as_present() {
        let three = FileSelection::from_paths(["a.pdf", "b.pdf", "c.pdf"]);
        assert!(Dispatcher::validate(" ", &three).is_ok());
    }

    #[test]
    fn url_joins_base_and_path() {
        let dispatcher = Dispatcher::new(DispatchConfig {
            base_url: "http://localhost:3000/".to_string(),
            upload_files: false,
        });
        assert_eq!(dispatcher.url(ASK_PATH), "http://localhost:3000/ask");
    }

    #[test]
    fn ask_body_contains_only_the_query() {
        let body = serde_json::to_string(&AskRequest {
            query: "What is the total?",
        })
        .unwrap();
        assert_eq!(body, r#"{"query":"What is the total?"}"#);
    }
}
