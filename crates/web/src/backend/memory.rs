//! In-process backend with the same observable behavior as the hosted one.
//!
//! Used for local development (`WOZIFY_BACKEND=memory`) and tests. Data lives
//! only as long as the process.

use std::collections::HashMap;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::RwLock;
use uuid::Uuid;

use wozify_core::{Email, NewStore, Profile, Store, StoreId, UserId};

use super::{Backend, BackendError, SignUpOutcome};
use crate::models::{AuthSession, SessionUser};

/// Minimum password length enforced at sign-up.
const MIN_PASSWORD_LENGTH: usize = 6;

/// Default access token lifetime.
const DEFAULT_TOKEN_LIFETIME_SECONDS: i64 = 3600;

/// In-memory backend.
pub struct MemoryBackend {
    state: RwLock<MemoryState>,
    token_lifetime: Duration,
    require_confirmation: bool,
}

#[derive(Default)]
struct MemoryState {
    /// Users keyed by lowercased email.
    users: HashMap<String, UserRecord>,
    access_tokens: HashMap<String, AccessToken>,
    refresh_tokens: HashMap<String, RefreshGrant>,
    profiles: HashMap<UserId, Profile>,
    stores: Vec<StoredRow>,
    next_sequence: u64,
}

struct UserRecord {
    id: UserId,
    email: Email,
    full_name: Option<String>,
    password_hash: String,
}

struct AccessToken {
    user_id: UserId,
    expires_at: DateTime<Utc>,
}

/// A refresh token and the access token issued alongside it.
struct RefreshGrant {
    user_id: UserId,
    access_token: String,
}

/// A store plus its insertion order, used to break timestamp ties.
struct StoredRow {
    sequence: u64,
    store: Store,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MemoryState::default()),
            token_lifetime: Duration::seconds(DEFAULT_TOKEN_LIFETIME_SECONDS),
            require_confirmation: false,
        }
    }

    /// Override the access token lifetime.
    #[must_use]
    pub fn with_token_lifetime(mut self, lifetime: Duration) -> Self {
        self.token_lifetime = lifetime;
        self
    }

    /// Make sign-up return `ConfirmationRequired` instead of a session.
    #[must_use]
    pub fn with_email_confirmation(mut self) -> Self {
        self.require_confirmation = true;
        self
    }

    fn issue_session(&self, state: &mut MemoryState, user: &SessionUser) -> AuthSession {
        let now = Utc::now();
        let access_token = Uuid::new_v4().simple().to_string();
        let refresh_token = Uuid::new_v4().simple().to_string();
        let expires_at = now + self.token_lifetime;

        state.access_tokens.retain(|_, token| token.expires_at > now);
        state.access_tokens.insert(
            access_token.clone(),
            AccessToken {
                user_id: user.id,
                expires_at,
            },
        );
        state.refresh_tokens.insert(
            refresh_token.clone(),
            RefreshGrant {
                user_id: user.id,
                access_token: access_token.clone(),
            },
        );

        AuthSession::new(
            user.clone(),
            SecretString::from(access_token),
            SecretString::from(refresh_token),
            expires_at,
        )
    }
}

impl MemoryState {
    /// Resolve an access token to its user, mirroring JWT validation.
    fn authorize(&self, session: &AuthSession) -> Result<UserId, BackendError> {
        let token = self
            .access_tokens
            .get(session.access_token().expose_secret())
            .ok_or_else(|| api_error(401, "invalid JWT"))?;

        if token.expires_at <= Utc::now() {
            return Err(api_error(401, "JWT expired"));
        }

        Ok(token.user_id)
    }

    fn user_by_id(&self, id: UserId) -> Option<&UserRecord> {
        self.users.values().find(|u| u.id == id)
    }
}

impl UserRecord {
    fn session_user(&self) -> SessionUser {
        SessionUser {
            id: self.id,
            email: self.email.clone(),
            full_name: self.full_name.clone(),
        }
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn sign_up(
        &self,
        email: &Email,
        password: &SecretString,
        full_name: &str,
    ) -> Result<SignUpOutcome, BackendError> {
        let password = password.expose_secret();
        if password.len() < MIN_PASSWORD_LENGTH {
            return Err(api_error(
                422,
                &format!("Password should be at least {MIN_PASSWORD_LENGTH} characters."),
            ));
        }

        let password_hash = hash_password(password)?;
        let full_name = Some(full_name.trim().to_string()).filter(|n| !n.is_empty());

        let mut state = self.state.write().await;
        let key = email.normalized();
        if state.users.contains_key(&key) {
            return Err(api_error(422, "User already registered"));
        }

        let record = UserRecord {
            id: UserId::random(),
            email: email.clone(),
            full_name: full_name.clone(),
            password_hash,
        };
        let user = record.session_user();

        state.profiles.insert(
            record.id,
            Profile {
                id: record.id,
                email: email.clone(),
                full_name,
            },
        );
        state.users.insert(key, record);

        if self.require_confirmation {
            return Ok(SignUpOutcome::ConfirmationRequired {
                email: email.clone(),
            });
        }

        Ok(SignUpOutcome::SignedIn(self.issue_session(&mut state, &user)))
    }

    async fn sign_in(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, BackendError> {
        let invalid = || api_error(400, "Invalid login credentials");

        // Argon2 is slow; verify without holding the lock.
        let (user, password_hash) = {
            let state = self.state.read().await;
            let record = state.users.get(&email.normalized()).ok_or_else(invalid)?;
            (record.session_user(), record.password_hash.clone())
        };

        if !verify_password(password.expose_secret(), &password_hash) {
            return Err(invalid());
        }

        let mut state = self.state.write().await;
        Ok(self.issue_session(&mut state, &user))
    }

    async fn refresh(&self, refresh_token: &SecretString) -> Result<AuthSession, BackendError> {
        let mut state = self.state.write().await;

        // Refresh tokens are single use and retire their access token.
        let grant = state
            .refresh_tokens
            .remove(refresh_token.expose_secret())
            .ok_or_else(|| api_error(400, "Invalid Refresh Token: Refresh Token Not Found"))?;
        state.access_tokens.remove(&grant.access_token);

        let user = state
            .user_by_id(grant.user_id)
            .map(UserRecord::session_user)
            .ok_or_else(|| api_error(404, "User not found"))?;

        Ok(self.issue_session(&mut state, &user))
    }

    async fn sign_out(&self, access_token: &SecretString) -> Result<(), BackendError> {
        let mut state = self.state.write().await;

        let token = state
            .access_tokens
            .remove(access_token.expose_secret())
            .ok_or_else(|| api_error(401, "invalid JWT"))?;

        // Global sign-out: revoke every token the user holds.
        state.access_tokens.retain(|_, t| t.user_id != token.user_id);
        state
            .refresh_tokens
            .retain(|_, grant| grant.user_id != token.user_id);
        Ok(())
    }

    async fn profile(&self, session: &AuthSession) -> Result<Option<Profile>, BackendError> {
        let state = self.state.read().await;
        let user_id = state.authorize(session)?;
        Ok(state.profiles.get(&user_id).cloned())
    }

    async fn insert_store(
        &self,
        session: &AuthSession,
        store: &NewStore,
    ) -> Result<(), BackendError> {
        let mut state = self.state.write().await;
        let user_id = state.authorize(session)?;

        if store.user_id != user_id {
            return Err(api_error(
                403,
                "new row violates row-level security policy for table \"stores\"",
            ));
        }

        let sequence = state.next_sequence;
        state.next_sequence += 1;
        state.stores.push(StoredRow {
            sequence,
            store: Store {
                id: StoreId::random(),
                user_id: store.user_id,
                name: store.name.clone(),
                slug: store.slug.clone(),
                description: store.description.clone(),
                status: store.status.clone(),
                domain: None,
                created_at: Utc::now(),
            },
        });

        Ok(())
    }

    async fn list_stores(&self, session: &AuthSession) -> Result<Vec<Store>, BackendError> {
        let state = self.state.read().await;
        let user_id = state.authorize(session)?;

        let mut rows: Vec<&StoredRow> = state
            .stores
            .iter()
            .filter(|row| row.store.user_id == user_id)
            .collect();
        rows.sort_by(|a, b| {
            b.store
                .created_at
                .cmp(&a.store.created_at)
                .then(b.sequence.cmp(&a.sequence))
        });

        Ok(rows.into_iter().map(|row| row.store.clone()).collect())
    }

    async fn ping(&self) -> Result<(), BackendError> {
        Ok(())
    }
}

fn api_error(status: u16, message: &str) -> BackendError {
    BackendError::Api {
        status,
        message: message.to_string(),
    }
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, BackendError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| BackendError::Parse(format!("password hashing failed: {e}")))
}

/// Verify a password against a stored hash.
fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}
