//! REST client for a hosted Supabase project.
//!
//! Authentication goes through the `/auth/v1` endpoints; table access goes
//! through `/rest/v1` with the user's access token so row-level security
//! applies.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use url::Url;

use wozify_core::{Email, NewStore, Profile, Store, UserId};

use super::{Backend, BackendError, SignUpOutcome};
use crate::config::SupabaseConfig;
use crate::models::{AuthSession, SessionUser};

/// Supabase backend client.
#[derive(Clone)]
pub struct SupabaseBackend {
    client: reqwest::Client,
    base_url: Url,
}

impl SupabaseBackend {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::InvalidConfig` if the API key is not a valid
    /// header value, or `BackendError::Http` if the client fails to build.
    pub fn new(config: &SupabaseConfig) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();

        let mut api_key = HeaderValue::from_str(config.anon_key())
            .map_err(|e| BackendError::InvalidConfig(format!("Invalid API key format: {e}")))?;
        api_key.set_sensitive(true);
        headers.insert("apikey", api_key);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.base_url
            .join(path)
            .map_err(|e| BackendError::InvalidConfig(format!("Invalid endpoint {path}: {e}")))
    }

    /// Password or refresh-token grant against `/auth/v1/token`.
    async fn token_grant(
        &self,
        grant_type: &str,
        body: serde_json::Value,
        fallback_email: Option<&Email>,
    ) -> Result<AuthSession, BackendError> {
        let url = self.endpoint("auth/v1/token")?;

        let response = self
            .client
            .post(url)
            .query(&[("grant_type", grant_type)])
            .json(&body)
            .send()
            .await?;

        let token: TokenResponse = parse_json(check_status(response).await?).await?;
        token.into_session(fallback_email, Utc::now())
    }
}

#[async_trait]
impl Backend for SupabaseBackend {
    async fn sign_up(
        &self,
        email: &Email,
        password: &SecretString,
        full_name: &str,
    ) -> Result<SignUpOutcome, BackendError> {
        let url = self.endpoint("auth/v1/signup")?;

        let body = serde_json::json!({
            "email": email.as_str(),
            "password": password.expose_secret(),
            "data": { "full_name": full_name },
        });

        let response = self.client.post(url).json(&body).send().await?;

        match parse_json(check_status(response).await?).await? {
            SignUpResponse::Session(token) => {
                Ok(SignUpOutcome::SignedIn(token.into_session(Some(email), Utc::now())?))
            }
            SignUpResponse::User(_) => Ok(SignUpOutcome::ConfirmationRequired {
                email: email.clone(),
            }),
        }
    }

    async fn sign_in(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, BackendError> {
        let body = serde_json::json!({
            "email": email.as_str(),
            "password": password.expose_secret(),
        });
        self.token_grant("password", body, Some(email)).await
    }

    async fn refresh(&self, refresh_token: &SecretString) -> Result<AuthSession, BackendError> {
        let body = serde_json::json!({ "refresh_token": refresh_token.expose_secret() });
        self.token_grant("refresh_token", body, None).await
    }

    async fn sign_out(&self, access_token: &SecretString) -> Result<(), BackendError> {
        let url = self.endpoint("auth/v1/logout")?;

        let response = self
            .client
            .post(url)
            .bearer_auth(access_token.expose_secret())
            .send()
            .await?;

        check_status(response).await?;
        Ok(())
    }

    async fn profile(&self, session: &AuthSession) -> Result<Option<Profile>, BackendError> {
        let url = self.endpoint("rest/v1/profiles")?;

        let response = self
            .client
            .get(url)
            .bearer_auth(session.access_token().expose_secret())
            .query(&[
                ("select", "*".to_string()),
                ("id", format!("eq.{}", session.user.id)),
                ("limit", "1".to_string()),
            ])
            .send()
            .await?;

        let rows: Vec<Profile> = parse_json(check_status(response).await?).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_store(
        &self,
        session: &AuthSession,
        store: &NewStore,
    ) -> Result<(), BackendError> {
        let url = self.endpoint("rest/v1/stores")?;

        let response = self
            .client
            .post(url)
            .bearer_auth(session.access_token().expose_secret())
            .header("Prefer", "return=minimal")
            .json(store)
            .send()
            .await?;

        check_status(response).await?;
        Ok(())
    }

    async fn list_stores(&self, session: &AuthSession) -> Result<Vec<Store>, BackendError> {
        let url = self.endpoint("rest/v1/stores")?;

        let response = self
            .client
            .get(url)
            .bearer_auth(session.access_token().expose_secret())
            .query(&[
                ("select", "*".to_string()),
                ("user_id", format!("eq.{}", session.user.id)),
                ("order", "created_at.desc".to_string()),
            ])
            .send()
            .await?;

        parse_json(check_status(response).await?).await
    }

    async fn ping(&self) -> Result<(), BackendError> {
        let url = self.endpoint("auth/v1/health")?;
        let response = self.client.get(url).send().await?;
        check_status(response).await?;
        Ok(())
    }
}

// =============================================================================
// Response handling
// =============================================================================

/// Turn non-2xx responses into `BackendError::Api`.
async fn check_status(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(status, &body);
    tracing::debug!(status = status.as_u16(), %message, "Backend request rejected");

    Err(BackendError::Api {
        status: status.as_u16(),
        message,
    })
}

async fn parse_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    response
        .json()
        .await
        .map_err(|e| BackendError::Parse(e.to_string()))
}

/// Extract the human-readable message from an error body.
///
/// The auth endpoints use `msg` or `error_description`; the REST endpoints
/// use `message`.
fn error_message(status: StatusCode, body: &str) -> String {
    let from_json = serde_json::from_str::<ErrorBody>(body).ok().and_then(|e| {
        [e.msg, e.error_description, e.message, e.error]
            .into_iter()
            .flatten()
            .find(|m| !m.trim().is_empty())
    });

    from_json
        .or_else(|| Some(body.trim().to_string()).filter(|b| !b.is_empty()))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        })
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    msg: Option<String>,
    error_description: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(TokenResponse),
    User(UserResponse),
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: Option<i64>,
    expires_at: Option<i64>,
    user: UserResponse,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: UserId,
    email: Option<String>,
    #[serde(default)]
    user_metadata: UserMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct UserMetadata {
    full_name: Option<String>,
}

/// Access tokens default to one hour when the backend omits expiry.
const DEFAULT_TOKEN_LIFETIME_SECONDS: i64 = 3600;

impl TokenResponse {
    fn into_session(
        self,
        fallback_email: Option<&Email>,
        now: DateTime<Utc>,
    ) -> Result<AuthSession, BackendError> {
        let email = match (self.user.email.as_deref(), fallback_email) {
            (Some(raw), _) if !raw.is_empty() => {
                Email::parse(raw).map_err(|e| BackendError::Parse(format!("user email: {e}")))?
            }
            (_, Some(email)) => email.clone(),
            _ => return Err(BackendError::Parse("user has no email".to_string())),
        };

        let expires_at = self
            .expires_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or_else(|| {
                now + Duration::seconds(self.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECONDS))
            });

        Ok(AuthSession::new(
            SessionUser {
                id: self.user.id,
                email,
                full_name: self.user.user_metadata.full_name,
            },
            SecretString::from(self.access_token),
            SecretString::from(self.refresh_token),
            expires_at,
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::{Request, State};
    use axum::http::header::CONTENT_TYPE;
    use axum::response::IntoResponse;

    use super::*;

    #[test]
    fn test_error_message_auth_shape() {
        let body = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, body),
            "Invalid login credentials"
        );
    }

    #[test]
    fn test_error_message_msg_shape() {
        let body = r#"{"code":422,"msg":"User already registered"}"#;
        assert_eq!(
            error_message(StatusCode::UNPROCESSABLE_ENTITY, body),
            "User already registered"
        );
    }

    #[test]
    fn test_error_message_rest_shape() {
        let body = r#"{"code":"42501","details":null,"hint":null,"message":"new row violates row-level security policy for table \"stores\""}"#;
        assert_eq!(
            error_message(StatusCode::FORBIDDEN, body),
            "new row violates row-level security policy for table \"stores\""
        );
    }

    #[test]
    fn test_error_message_plain_text_and_empty() {
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, "upstream down\n"),
            "upstream down"
        );
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, ""), "Bad Gateway");
    }

    #[test]
    fn test_sign_up_response_with_session() {
        let body = serde_json::json!({
            "access_token": "at",
            "token_type": "bearer",
            "expires_in": 3600,
            "expires_at": 1_900_000_000,
            "refresh_token": "rt",
            "user": {
                "id": "7d3c9c1e-2a44-4c9f-b1a3-0f4b8e0e5d22",
                "email": "jane@example.com",
                "user_metadata": { "full_name": "Jane Doe" }
            }
        });

        let parsed: SignUpResponse = serde_json::from_value(body).unwrap();
        let SignUpResponse::Session(token) = parsed else {
            panic!("expected a session response");
        };
        let session = token.into_session(None, Utc::now()).unwrap();
        assert_eq!(session.user.email.as_str(), "jane@example.com");
        assert_eq!(session.user.full_name.as_deref(), Some("Jane Doe"));
        assert_eq!(session.expires_at.timestamp(), 1_900_000_000);
        assert_eq!(session.access_token().expose_secret(), "at");
    }

    #[test]
    fn test_sign_up_response_requiring_confirmation() {
        let body = serde_json::json!({
            "id": "7d3c9c1e-2a44-4c9f-b1a3-0f4b8e0e5d22",
            "email": "jane@example.com",
            "confirmation_sent_at": "2024-05-01T12:00:00Z",
            "user_metadata": { "full_name": "Jane Doe" }
        });

        let parsed: SignUpResponse = serde_json::from_value(body).unwrap();
        assert!(matches!(parsed, SignUpResponse::User(_)));
    }

    #[test]
    fn test_token_expiry_falls_back_to_expires_in() {
        let token: TokenResponse = serde_json::from_value(serde_json::json!({
            "access_token": "at",
            "refresh_token": "rt",
            "expires_in": 120,
            "user": { "id": "7d3c9c1e-2a44-4c9f-b1a3-0f4b8e0e5d22" }
        }))
        .unwrap();

        let now = Utc::now();
        let fallback = Email::parse("jane@example.com").unwrap();
        let session = token.into_session(Some(&fallback), now).unwrap();
        assert_eq!(session.expires_at, now + Duration::seconds(120));
        assert_eq!(session.user.email, fallback);
        assert!(session.user.full_name.is_none());
    }

    #[test]
    fn test_token_without_any_email_is_rejected() {
        let token: TokenResponse = serde_json::from_value(serde_json::json!({
            "access_token": "at",
            "refresh_token": "rt",
            "user": { "id": "7d3c9c1e-2a44-4c9f-b1a3-0f4b8e0e5d22" }
        }))
        .unwrap();

        assert!(matches!(
            token.into_session(None, Utc::now()),
            Err(BackendError::Parse(_))
        ));
    }

    #[test]
    fn test_endpoint_join() {
        let config = SupabaseConfig::new(Url::parse("https://abc.supabase.co/").unwrap(), "anon");
        let backend = SupabaseBackend::new(&config).unwrap();
        assert_eq!(
            backend.endpoint("rest/v1/stores").unwrap().as_str(),
            "https://abc.supabase.co/rest/v1/stores"
        );
    }

    // -------------------------------------------------------------------------
    // Wire format, checked against a local stand-in for the hosted project
    // -------------------------------------------------------------------------

    const USER_ID: &str = "7d3c9c1e-2a44-4c9f-b1a3-0f4b8e0e5d22";

    #[derive(Debug)]
    struct Recorded {
        method: String,
        path: String,
        query: Vec<(String, String)>,
        headers: HeaderMap,
        body: String,
    }

    impl Recorded {
        fn header(&self, name: &str) -> Option<&str> {
            self.headers.get(name).and_then(|v| v.to_str().ok())
        }

        fn query_value(&self, key: &str) -> Option<&str> {
            self.query
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        }

        fn json(&self) -> serde_json::Value {
            serde_json::from_str(&self.body).unwrap()
        }
    }

    #[derive(Clone)]
    struct Reply {
        status: StatusCode,
        body: String,
        requests: Arc<Mutex<Vec<Recorded>>>,
    }

    async fn record(State(reply): State<Reply>, request: Request) -> axum::response::Response {
        let (parts, body) = request.into_parts();
        let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();

        reply.requests.lock().unwrap().push(Recorded {
            method: parts.method.to_string(),
            path: parts.uri.path().to_string(),
            query: url::form_urlencoded::parse(parts.uri.query().unwrap_or_default().as_bytes())
                .into_owned()
                .collect(),
            headers: parts.headers,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        });

        (
            reply.status,
            [(CONTENT_TYPE, "application/json")],
            reply.body.clone(),
        )
            .into_response()
    }

    /// Serve `body` with `status` for every request and keep what was sent.
    async fn serve(
        status: StatusCode,
        body: serde_json::Value,
    ) -> (SupabaseBackend, Arc<Mutex<Vec<Recorded>>>) {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let body = if status == StatusCode::NO_CONTENT {
            String::new()
        } else {
            body.to_string()
        };
        let app = axum::Router::new().fallback(record).with_state(Reply {
            status,
            body,
            requests: requests.clone(),
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let config = SupabaseConfig::new(
            Url::parse(&format!("http://{addr}/")).unwrap(),
            "anon-key",
        );
        (SupabaseBackend::new(&config).unwrap(), requests)
    }

    fn only_request(requests: &Arc<Mutex<Vec<Recorded>>>) -> Recorded {
        let mut requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        requests.pop().unwrap()
    }

    fn session() -> AuthSession {
        AuthSession::new(
            SessionUser {
                id: USER_ID.parse().unwrap(),
                email: Email::parse("jane@example.com").unwrap(),
                full_name: Some("Jane Doe".to_string()),
            },
            SecretString::from("user-access-token"),
            SecretString::from("user-refresh-token"),
            Utc::now() + Duration::hours(1),
        )
    }

    #[tokio::test]
    async fn test_list_stores_filters_by_owner_newest_first() {
        let (backend, requests) = serve(
            StatusCode::OK,
            serde_json::json!([{
                "id": "0b8f5a52-6f0e-4f6c-8a57-3df0b1f0a6c1",
                "user_id": USER_ID,
                "name": "Acme",
                "slug": "acme",
                "description": null,
                "status": "active",
                "domain": null,
                "created_at": "2024-05-01T12:30:00.123456+00:00"
            }]),
        )
        .await;

        let stores = backend.list_stores(&session()).await.unwrap();
        assert_eq!(stores.len(), 1);
        assert_eq!(stores[0].name, "Acme");

        let request = only_request(&requests);
        assert_eq!(request.method, "GET");
        assert_eq!(request.path, "/rest/v1/stores");
        assert_eq!(request.query_value("select"), Some("*"));
        assert_eq!(
            request.query_value("user_id"),
            Some(format!("eq.{USER_ID}").as_str())
        );
        assert_eq!(request.query_value("order"), Some("created_at.desc"));
        assert_eq!(request.header("apikey"), Some("anon-key"));
        assert_eq!(
            request.header("authorization"),
            Some("Bearer user-access-token")
        );
    }

    #[tokio::test]
    async fn test_insert_store_sends_row_without_representation() {
        let (backend, requests) = serve(StatusCode::CREATED, serde_json::Value::Null).await;
        let auth = session();
        let store = NewStore::new(auth.user.id, "My Store!", Some(""));

        backend.insert_store(&auth, &store).await.unwrap();

        let request = only_request(&requests);
        assert_eq!(request.method, "POST");
        assert_eq!(request.path, "/rest/v1/stores");
        assert_eq!(request.header("prefer"), Some("return=minimal"));
        assert_eq!(
            request.header("authorization"),
            Some("Bearer user-access-token")
        );
        assert_eq!(
            request.json(),
            serde_json::json!({
                "user_id": USER_ID,
                "name": "My Store!",
                "slug": "my-store",
                "description": null,
                "status": "active"
            })
        );
    }

    #[tokio::test]
    async fn test_sign_up_sends_full_name_as_metadata() {
        let (backend, requests) = serve(
            StatusCode::OK,
            serde_json::json!({
                "id": USER_ID,
                "email": "jane@example.com",
                "confirmation_sent_at": "2024-05-01T12:00:00Z"
            }),
        )
        .await;
        let email = Email::parse("jane@example.com").unwrap();

        let outcome = backend
            .sign_up(&email, &SecretString::from("hunter22"), "Jane Doe")
            .await
            .unwrap();
        assert!(matches!(outcome, SignUpOutcome::ConfirmationRequired { .. }));

        let request = only_request(&requests);
        assert_eq!(request.method, "POST");
        assert_eq!(request.path, "/auth/v1/signup");
        assert_eq!(request.header("apikey"), Some("anon-key"));
        assert!(request.header("authorization").is_none());
        assert_eq!(
            request.json(),
            serde_json::json!({
                "email": "jane@example.com",
                "password": "hunter22",
                "data": { "full_name": "Jane Doe" }
            })
        );
    }

    #[tokio::test]
    async fn test_sign_in_uses_password_grant() {
        let (backend, requests) = serve(
            StatusCode::OK,
            serde_json::json!({
                "access_token": "at",
                "refresh_token": "rt",
                "expires_in": 3600,
                "user": { "id": USER_ID, "email": "jane@example.com" }
            }),
        )
        .await;
        let email = Email::parse("jane@example.com").unwrap();

        let session = backend
            .sign_in(&email, &SecretString::from("hunter22"))
            .await
            .unwrap();
        assert_eq!(session.access_token().expose_secret(), "at");

        let request = only_request(&requests);
        assert_eq!(request.path, "/auth/v1/token");
        assert_eq!(request.query_value("grant_type"), Some("password"));
        assert_eq!(request.json()["email"], "jane@example.com");
    }

    #[tokio::test]
    async fn test_sign_out_revokes_with_bearer_token() {
        let (backend, requests) = serve(StatusCode::NO_CONTENT, serde_json::Value::Null).await;

        backend
            .sign_out(&SecretString::from("user-access-token"))
            .await
            .unwrap();

        let request = only_request(&requests);
        assert_eq!(request.method, "POST");
        assert_eq!(request.path, "/auth/v1/logout");
        assert_eq!(request.header("apikey"), Some("anon-key"));
        assert_eq!(
            request.header("authorization"),
            Some("Bearer user-access-token")
        );
    }

    #[tokio::test]
    async fn test_rejection_surfaces_backend_message() {
        let (backend, _requests) = serve(
            StatusCode::UNAUTHORIZED,
            serde_json::json!({ "code": "PGRST301", "message": "JWT expired" }),
        )
        .await;

        let err = backend.list_stores(&session()).await.unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(err.user_message(), "JWT expired");
    }
}
