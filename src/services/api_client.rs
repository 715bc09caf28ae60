//! Backend client - the document chat HTTP API.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::models::{ConversationSeed, Message, User};

/// Successful `POST /login` body.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub user: User,
    /// Some deployments return the conversation list next to the user
    /// instead of inside it.
    #[serde(default)]
    pub chats: Option<Vec<Value>>,
}

impl LoginResponse {
    /// The conversation list embedded in the response, wherever it was put.
    /// `None` when the backend didn't send one at all.
    pub fn into_parts(mut self) -> (User, Option<Vec<Value>>) {
        let embedded = self.user.chats.take();
        (self.user, self.chats.or(embedded))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum VerifyResponse {
    Wrapped { user: User },
    Bare(User),
}

/// Operations the stores need from the backend.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Exchange credentials for an identity.
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError>;

    /// Register an account. Returns the server's acknowledgement text, if any.
    async fn signup(&self, name: &str, email: &str, password: &str)
        -> Result<Option<String>, ApiError>;

    /// Complete email verification.
    async fn verify(&self, token: &str) -> Result<User, ApiError>;

    /// Upload a document, creating a conversation for it.
    async fn create_chat(&self, file: &Path, user_id: &str) -> Result<ConversationSeed, ApiError>;

    /// Ask a question in a conversation. The reply holds the full exchange.
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<Message, ApiError>;

    /// Delete a conversation on the server.
    async fn delete_chat(&self, chat_id: &str, user_id: &str) -> Result<(), ApiError>;
}

/// `Backend` over HTTP.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client from configuration.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `/verify/{token}` with the token as one escaped path segment.
    fn verify_url(&self, token: &str) -> Result<Url, ApiError> {
        let mut url =
            Url::parse(&self.url("/verify")).map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.clone()))?
            .push(token);
        Ok(url)
    }
}

/// Turn a non-success response into `ApiError::Status`.
async fn check(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(status, &body);
    warn!("Backend returned {}: {}", status, message);
    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}

/// Read and decode a JSON body.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| {
        debug!("Undecodable body: {}", body);
        ApiError::Decode(e.to_string())
    })
}

/// Pull a readable message out of an error body.
///
/// Looks at `message`, `detail` and `error`. FastAPI validation errors put a
/// list under `detail`; the first entry's `msg` is used then.
pub fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        for key in ["message", "detail", "error"] {
            match value.get(key) {
                Some(Value::String(s)) if !s.trim().is_empty() => return s.trim().to_string(),
                Some(Value::Array(items)) => {
                    if let Some(msg) = items
                        .first()
                        .and_then(|item| item.get("msg"))
                        .and_then(|m| m.as_str())
                    {
                        return msg.to_string();
                    }
                }
                _ => {}
            }
        }
        if let Value::String(s) = &value {
            if !s.trim().is_empty() {
                return s.trim().to_string();
            }
        }
    } else if !body.trim().is_empty() && !body.trim_start().starts_with('<') {
        return body.trim().to_string();
    }

    status
        .canonical_reason()
        .map(|r| r.to_string())
        .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()))
}

/// Acknowledgement text from a signup body, if it carries one.
fn acknowledgement(body: &str) -> Option<String> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => map
            .get("message")
            .and_then(|m| m.as_str())
            .map(|m| m.to_string()),
        _ => None,
    }
}

#[async_trait]
impl Backend for ApiClient {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        debug!("POST /login for {}", email);
        let response = self
            .client
            .post(self.url("/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        decode(check(response).await?).await
    }

    async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Option<String>, ApiError> {
        debug!("POST /signup for {}", email);
        let response = self
            .client
            .post(self.url("/signup"))
            .json(&json!({ "name": name, "email": email, "password": password }))
            .send()
            .await?;

        let body = check(response).await?.text().await?;
        Ok(acknowledgement(&body))
    }

    async fn verify(&self, token: &str) -> Result<User, ApiError> {
        debug!("GET /verify/<token>");
        let response = self
            .client
            .get(self.verify_url(token)?)
            .send()
            .await?;

        match decode(check(response).await?).await? {
            VerifyResponse::Wrapped { user } | VerifyResponse::Bare(user) => Ok(user),
        }
    }

    async fn create_chat(&self, file: &Path, user_id: &str) -> Result<ConversationSeed, ApiError> {
        let bytes = tokio::fs::read(file).await?;
        let file_name = file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document")
            .to_string();
        debug!("POST /chat/create {} ({} bytes)", file_name, bytes.len());

        let form = Form::new()
            .part("file", Part::bytes(bytes).file_name(file_name))
            .text("user_id", user_id.to_string());

        let response = self
            .client
            .post(self.url("/chat/create"))
            .multipart(form)
            .send()
            .await?;

        decode(check(response).await?).await
    }

    async fn send_message(&self, chat_id: &str, text: &str) -> Result<Message, ApiError> {
        debug!("POST /chat/message chat={}", chat_id);
        let response = self
            .client
            .post(self.url("/chat/message"))
            .json(&json!({ "chat_id": chat_id, "text": text }))
            .send()
            .await?;

        decode(check(response).await?).await
    }

    async fn delete_chat(&self, chat_id: &str, user_id: &str) -> Result<(), ApiError> {
        debug!("DELETE /chat/delete chat={}", chat_id);
        let response = self
            .client
            .delete(self.url("/chat/delete"))
            .query(&[("chat_id", chat_id), ("user_id", user_id)])
            .send()
            .await?;

        check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client_for(server: &mockito::ServerGuard) -> ApiClient {
        ApiClient::new(&ApiConfig {
            base_url: format!("{}/", server.url()),
            timeout_secs: Some(5),
        })
        .unwrap()
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ApiClient::new(&ApiConfig {
            base_url: "http://localhost:8000/".to_string(),
            timeout_secs: None,
        })
        .unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.url("/login"), "http://localhost:8000/login");
    }

    #[test]
    fn test_verify_token_is_one_path_segment() {
        let client = ApiClient::new(&ApiConfig {
            base_url: "http://localhost:8000/api/".to_string(),
            timeout_secs: None,
        })
        .unwrap();
        assert_eq!(
            client.verify_url("a/b?c#d").unwrap().as_str(),
            "http://localhost:8000/api/verify/a%2Fb%3Fc%23d"
        );
        assert_eq!(
            client.verify_url("tok1").unwrap().as_str(),
            "http://localhost:8000/api/verify/tok1"
        );
    }

    #[test]
    fn test_error_message_fields() {
        let s = StatusCode::UNAUTHORIZED;
        assert_eq!(error_message(s, r#"{"detail":"Incorrect credentials"}"#), "Incorrect credentials");
        assert_eq!(error_message(s, r#"{"message":"Email not verified"}"#), "Email not verified");
        assert_eq!(error_message(s, r#"{"error":"nope"}"#), "nope");
        assert_eq!(
            error_message(
                StatusCode::UNPROCESSABLE_ENTITY,
                r#"{"detail":[{"loc":["body","email"],"msg":"field required"}]}"#
            ),
            "field required"
        );
        assert_eq!(error_message(s, "plain text failure"), "plain text failure");
        assert_eq!(error_message(s, ""), "Unauthorized");
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, "<html>bad</html>"), "Bad Gateway");
        assert_eq!(error_message(s, r#"{"other":1}"#), "Unauthorized");
    }

    #[test]
    fn test_login_response_chats_location() {
        let inside: LoginResponse = serde_json::from_str(
            r#"{"user":{"_id":"u1","email":"a@b.com","chats":[{"_id":"c1"}]}}"#,
        )
        .unwrap();
        let (user, chats) = inside.into_parts();
        assert!(user.chats.is_none());
        assert_eq!(chats.unwrap().len(), 1);

        let beside: LoginResponse = serde_json::from_str(
            r#"{"user":{"_id":"u1","email":"a@b.com"},"chats":[{"_id":"c1"},{"_id":"c2"}]}"#,
        )
        .unwrap();
        let (_, chats) = beside.into_parts();
        assert_eq!(chats.unwrap().len(), 2);

        let absent: LoginResponse =
            serde_json::from_str(r#"{"user":{"_id":"u1","email":"a@b.com"}}"#).unwrap();
        assert!(absent.into_parts().1.is_none());
    }

    #[tokio::test]
    async fn test_login_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/login")
            .match_body(Matcher::Json(json!({"email": "a@b.com", "password": "secret1"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"user":{"_id":"u1","name":"Ann","email":"a@b.com","chats":[]}}"#)
            .create_async()
            .await;

        let response = client_for(&server).login("a@b.com", "secret1").await.unwrap();
        assert_eq!(response.user.id, "u1");
        assert_eq!(response.user.name, "Ann");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_login_failure_carries_server_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/login")
            .with_status(401)
            .with_body(r#"{"detail":"Incorrect credentials"}"#)
            .create_async()
            .await;

        let err = client_for(&server).login("a@b.com", "wrong").await.unwrap_err();
        match err {
            ApiError::Status { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Incorrect credentials");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/message")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let err = client_for(&server).send_message("c1", "hi").await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn test_signup_acknowledgement() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/signup")
            .match_body(Matcher::PartialJson(json!({"name": "Ann", "email": "a@b.com"})))
            .with_status(200)
            .with_body(r#"{"message":"Check your inbox"}"#)
            .create_async()
            .await;
        let ack = client_for(&server).signup("Ann", "a@b.com", "secret1").await.unwrap();
        assert_eq!(ack.as_deref(), Some("Check your inbox"));
    }

    #[tokio::test]
    async fn test_signup_plain_id_body_has_no_acknowledgement() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/signup")
            .with_status(200)
            .with_body(r#""6630f0c2a1""#)
            .create_async()
            .await;
        let ack = client_for(&server).signup("Ann", "a@b.com", "secret1").await.unwrap();
        assert!(ack.is_none());
    }

    #[tokio::test]
    async fn test_verify_accepts_wrapped_and_bare_user() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/verify/tok1")
            .with_status(200)
            .with_body(r#"{"user":{"_id":"u1","email":"a@b.com"}}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/verify/tok2")
            .with_status(200)
            .with_body(r#"{"_id":"u2","email":"c@d.com"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        assert_eq!(client.verify("tok1").await.unwrap().id, "u1");
        assert_eq!(client.verify("tok2").await.unwrap().id, "u2");
    }

    #[tokio::test]
    async fn test_send_message_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/message")
            .match_body(Matcher::Json(json!({"chat_id": "c1", "text": "hi"})))
            .with_status(200)
            .with_body(r#"{"id":"m1","text":"hi","answer":"hello"}"#)
            .create_async()
            .await;

        let msg = client_for(&server).send_message("c1", "hi").await.unwrap();
        assert_eq!(msg.answer.as_deref(), Some("hello"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_uses_query_parameters() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/chat/delete")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("chat_id".into(), "c1".into()),
                Matcher::UrlEncoded("user_id".into(), "u1".into()),
            ]))
            .with_status(204)
            .create_async()
            .await;

        client_for(&server).delete_chat("c1", "u1").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_chat_uploads_multipart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello document").unwrap();

        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/create")
            .match_header("content-type", Matcher::Regex("multipart/form-data".into()))
            .match_body(Matcher::Regex("hello document".into()))
            .with_status(200)
            .with_body(r#"{"id":"c9","document_path":"public/u1_x.txt","doc_summary":"greeting"}"#)
            .create_async()
            .await;

        let seed = client_for(&server).create_chat(&path, "u1").await.unwrap();
        assert_eq!(seed.id, "c9");
        assert_eq!(seed.doc_summary, "greeting");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_chat_missing_file() {
        let server = mockito::Server::new_async().await;
        let err = client_for(&server)
            .create_chat(Path::new("/definitely/not/here.pdf"), "u1")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Io(_)));
    }
}
