use std::env;
use std::time::Duration;

use async_trait::async_trait;
use quiz_core::model::{Question, QuestionDraft, QuestionId, QuizId, ResultSummary};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::contract::{
    GamificationSink, GamificationUpdate, HintSource, QuizResultMetadata, QuizSource,
    RemoteError, SubmissionPayload, SubmissionReceipt, SubmissionSink,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct RemoteConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl RemoteConfig {
    /// Read `QUIZ_API_URL` and the optional `QUIZ_API_KEY`.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("QUIZ_API_URL").ok()?;
        if base_url.trim().is_empty() {
            return None;
        }
        let api_key = env::var("QUIZ_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
        Some(Self { base_url, api_key })
    }
}

/// JSON-over-HTTP client for the scoring service.
#[derive(Clone)]
pub struct HttpRemote {
    client: Client,
    config: RemoteConfig,
}

impl HttpRemote {
    #[must_use]
    pub fn new(config: RemoteConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url.trim_end_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.timeout(REQUEST_TIMEOUT);
        match &self.config.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RemoteError::NotFound);
        }
        if status == reqwest::StatusCode::UNPROCESSABLE_ENTITY {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Rejected(body));
        }
        if !status.is_success() {
            return Err(RemoteError::HttpStatus(status));
        }
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| RemoteError::Serialization(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct QuestionsResponse {
    questions: Vec<QuestionDraft>,
}

#[derive(Debug, Deserialize)]
struct HintResponse {
    hint: String,
}

#[derive(Debug, Serialize)]
struct QuizResultRequest<'a> {
    summary: &'a ResultSummary,
    metadata: &'a QuizResultMetadata,
}

#[async_trait]
impl QuizSource for HttpRemote {
    async fn fetch_quiz(
        &self,
        quiz_id: QuizId,
        question_count: usize,
    ) -> Result<Vec<Question>, RemoteError> {
        let request = self
            .client
            .get(self.url(&format!("quizzes/{quiz_id}/questions")))
            .query(&[("count", question_count)]);
        let response = self.authorize(request).send().await?;
        let body: QuestionsResponse = Self::read_json(response).await?;

        let mut questions = Vec::with_capacity(body.questions.len());
        for draft in body.questions {
            let id = draft.id;
            match draft.validate() {
                Ok(question) => questions.push(question),
                Err(err) => {
                    tracing::warn!(question_id = %id, error = %err, "skipping malformed question");
                }
            }
        }
        questions.truncate(question_count);
        Ok(questions)
    }
}

#[async_trait]
impl HintSource for HttpRemote {
    async fn fetch_hint(&self, question_id: QuestionId) -> Result<String, RemoteError> {
        let request = self
            .client
            .get(self.url(&format!("questions/{question_id}/hint")));
        let response = self.authorize(request).send().await?;
        let body: HintResponse = Self::read_json(response).await?;
        Ok(body.hint.trim().to_owned())
    }
}

#[async_trait]
impl SubmissionSink for HttpRemote {
    async fn submit_quiz(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<SubmissionReceipt, RemoteError> {
        let request = self
            .client
            .post(self.url(&format!("sessions/{}/submit", payload.session_id)))
            .json(payload);
        let response = self.authorize(request).send().await?;
        Self::read_json(response).await
    }
}

#[async_trait]
impl GamificationSink for HttpRemote {
    async fn record_quiz_result(
        &self,
        summary: &ResultSummary,
        metadata: &QuizResultMetadata,
    ) -> Result<GamificationUpdate, RemoteError> {
        let request = self
            .client
            .post(self.url("gamification/quiz-results"))
            .json(&QuizResultRequest { summary, metadata });
        let response = self.authorize(request).send().await?;
        Self::read_json(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_without_double_slash() {
        let remote = HttpRemote::new(RemoteConfig {
            base_url: "https://quiz.example/api/".into(),
            api_key: None,
        });
        assert_eq!(
            remote.url("quizzes/3/questions"),
            "https://quiz.example/api/quizzes/3/questions"
        );
    }
}
