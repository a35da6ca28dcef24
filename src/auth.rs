//! Authentication and session context
//!
//! Email/password sign-in with Argon2id hashing and JWT cookie sessions.
//!
//! # Design
//!
//! - **Password hashing**: Argon2id
//! - **Access tokens**: HS256 JWT in an httpOnly cookie, 15-minute expiry
//! - **Refresh tokens**: 7-day expiry, single-use, SHA-256 hashed at rest
//! - **Rate limiting**: 5 sign-in attempts per minute per IP
//! - **Roles**: `admin` unlocks the add/delete-user affordances; resolved
//!   once at sign-in into a [`SessionContext`] that is the single source
//!   of truth for the session's role, invalidated at sign-out
//!
//! Failures map onto a small fixed set of human-readable messages with a
//! generic fallback, so the sign-in dialog can show them verbatim.
//!
//! # Endpoints
//!
//! - `POST /api/auth/login` — authenticate with email/password
//! - `POST /api/auth/register` — create an account
//! - `POST /api/auth/logout` — revoke the session
//! - `GET /api/auth/me` — current session context

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::sanitize::sanitize;

/// Access token expiry.
const ACCESS_TOKEN_EXPIRY_MINUTES: i64 = 15;

/// Refresh token expiry.
const REFRESH_TOKEN_EXPIRY_DAYS: i64 = 7;

/// Sign-in rate limit window.
const RATE_LIMIT_WINDOW_SECS: i64 = 60;

/// Max sign-in attempts per window.
const MAX_SIGNIN_ATTEMPTS: u32 = 5;

/// Cookie carrying the access token. The route guard checks for its
/// presence on protected pages.
pub const AUTH_COOKIE: &str = "trustlock_token";

/// Cookie carrying the refresh token.
const REFRESH_COOKIE: &str = "trustlock_refresh";

/// Authentication failures, each carrying its display message.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Incorrect password. Please try again.")]
    WrongPassword,

    #[error("No user found with this email.")]
    UserNotFound,

    #[error("Password must contain at least 8 characters, a number, and a special character.")]
    WeakPassword,

    #[error("An account with this email already exists.")]
    EmailTaken,

    #[error("Too many sign-in attempts. Please wait a minute.")]
    RateLimited,

    #[error("Your session has expired. Please sign in again.")]
    SessionExpired,

    #[error("You are not signed in.")]
    NotSignedIn,

    #[error("This action requires an administrator account.")]
    AdminRequired,

    /// Generic fallback for unrecognized failures.
    #[error("Error signing in")]
    Internal(String),
}

impl AuthError {
    fn status(&self) -> StatusCode {
        match self {
            AuthError::WrongPassword | AuthError::UserNotFound => StatusCode::UNAUTHORIZED,
            AuthError::WeakPassword | AuthError::EmailTaken => StatusCode::BAD_REQUEST,
            AuthError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AuthError::SessionExpired | AuthError::NotSignedIn => StatusCode::UNAUTHORIZED,
            AuthError::AdminRequired => StatusCode::FORBIDDEN,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        if matches!(self, AuthError::Internal(ref detail) if !detail.is_empty()) {
            tracing::error!(error = %self, "auth internal error");
        }
        let body = Json(serde_json::json!({
            "error": status.canonical_reason().unwrap_or("Error"),
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}

/// User role. Only `admin` sees the add/delete-user affordances; server
/// handlers enforce it as well rather than trusting the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// Registered account.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: String,
    pub email: String,
    pub name: String,
    password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// JWT claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Account id
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
    /// Token id, for revocation
    pub jti: String,
}

/// The authoritative session identity, resolved once from a validated
/// token and handed to every handler through request extensions. Pages
/// read the role from here instead of keeping their own copy.
#[derive(Debug, Clone, Serialize)]
pub struct SessionContext {
    pub account_id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    #[serde(skip)]
    pub token_id: String,
}

#[derive(Debug, Clone)]
struct RefreshRecord {
    account_id: String,
    expires_at: DateTime<Utc>,
    used: bool,
}

#[derive(Debug, Clone)]
struct AttemptWindow {
    attempts: u32,
    window_start: DateTime<Utc>,
}

/// Authentication state shared across handlers.
pub struct AuthState {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    accounts: RwLock<HashMap<String, Account>>,
    refresh_tokens: RwLock<HashMap<String, RefreshRecord>>,
    attempts: RwLock<HashMap<String, AttemptWindow>>,
    revoked: RwLock<HashSet<String>>,
    secure_cookies: bool,
}

impl AuthState {
    pub fn new(jwt_secret: &str, secure_cookies: bool) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            accounts: RwLock::new(HashMap::new()),
            refresh_tokens: RwLock::new(HashMap::new()),
            attempts: RwLock::new(HashMap::new()),
            revoked: RwLock::new(HashSet::new()),
            secure_cookies,
        }
    }

    fn hash_password(password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Internal(format!("password hashing failed: {e}")))
    }

    fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| AuthError::Internal(format!("invalid stored hash: {e}")))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    /// Password policy: at least 8 characters, a digit, and a character
    /// that is neither a letter nor a digit.
    fn check_password_policy(password: &str) -> Result<(), AuthError> {
        let long_enough = password.chars().count() >= 8;
        let has_digit = password.chars().any(|c| c.is_ascii_digit());
        let has_special = password.chars().any(|c| !c.is_alphanumeric());
        if long_enough && has_digit && has_special {
            Ok(())
        } else {
            Err(AuthError::WeakPassword)
        }
    }

    /// Create an account. Inputs are sanitized the same way the sign-in
    /// dialog sanitizes them.
    pub fn register(
        &self,
        email: &str,
        name: &str,
        password: &str,
        role: Role,
    ) -> Result<Account, AuthError> {
        let email = sanitize(email).clean.to_lowercase();
        let name = sanitize(name).clean;
        if email.is_empty() {
            return Err(AuthError::Internal("email must not be empty".to_string()));
        }
        Self::check_password_policy(password)?;

        let mut accounts = self.accounts.write();
        if accounts.values().any(|a| a.email == email) {
            return Err(AuthError::EmailTaken);
        }

        let account = Account {
            id: Uuid::new_v4().to_string(),
            email,
            name,
            password_hash: Self::hash_password(password)?,
            role,
            created_at: Utc::now(),
            last_login: None,
        };
        accounts.insert(account.id.clone(), account.clone());
        Ok(account)
    }

    fn check_rate_limit(&self, ip: &str) -> Result<(), AuthError> {
        let mut attempts = self.attempts.write();
        let now = Utc::now();

        match attempts.get_mut(ip) {
            Some(entry) => {
                if (now - entry.window_start).num_seconds() > RATE_LIMIT_WINDOW_SECS {
                    entry.attempts = 1;
                    entry.window_start = now;
                } else if entry.attempts >= MAX_SIGNIN_ATTEMPTS {
                    return Err(AuthError::RateLimited);
                } else {
                    entry.attempts += 1;
                }
            }
            None => {
                attempts.insert(
                    ip.to_string(),
                    AttemptWindow {
                        attempts: 1,
                        window_start: now,
                    },
                );
            }
        }
        Ok(())
    }

    fn issue_tokens(&self, account: &Account) -> Result<(String, String), AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: account.id.clone(),
            role: account.role,
            iat: now.timestamp(),
            exp: (now + Duration::minutes(ACCESS_TOKEN_EXPIRY_MINUTES)).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let access = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("token encoding failed: {e}")))?;

        let refresh = Uuid::new_v4().to_string();
        self.refresh_tokens.write().insert(
            Self::hash_token(&refresh),
            RefreshRecord {
                account_id: account.id.clone(),
                expires_at: now + Duration::days(REFRESH_TOKEN_EXPIRY_DAYS),
                used: false,
            },
        );

        Ok((access, refresh))
    }

    fn hash_token(token: &str) -> String {
        use sha2::{Digest, Sha256};
        hex::encode(Sha256::digest(token.as_bytes()))
    }

    /// Sign in with email/password, yielding the account and fresh tokens.
    pub fn sign_in(
        &self,
        email: &str,
        password: &str,
        ip: &str,
    ) -> Result<(Account, String, String), AuthError> {
        self.check_rate_limit(ip)?;

        let email = sanitize(email).clean.to_lowercase();
        let account = {
            let accounts = self.accounts.read();
            accounts
                .values()
                .find(|a| a.email == email)
                .cloned()
                .ok_or(AuthError::UserNotFound)?
        };

        if !Self::verify_password(password, &account.password_hash)? {
            return Err(AuthError::WrongPassword);
        }

        {
            let mut accounts = self.accounts.write();
            if let Some(a) = accounts.get_mut(&account.id) {
                a.last_login = Some(Utc::now());
            }
        }

        let (access, refresh) = self.issue_tokens(&account)?;
        Ok((account, access, refresh))
    }

    /// Exchange a single-use refresh token for fresh tokens.
    pub fn refresh(&self, refresh_token: &str) -> Result<(String, String), AuthError> {
        let hash = Self::hash_token(refresh_token);
        let account_id = {
            let mut tokens = self.refresh_tokens.write();
            let record = tokens.get_mut(&hash).ok_or(AuthError::SessionExpired)?;

            if record.expires_at < Utc::now() {
                tokens.remove(&hash);
                return Err(AuthError::SessionExpired);
            }
            if record.used {
                // Reuse signals token theft: revoke the whole family.
                let account_id = record.account_id.clone();
                tokens.retain(|_, r| r.account_id != account_id);
                return Err(AuthError::SessionExpired);
            }
            record.used = true;
            record.account_id.clone()
        };

        let account = self
            .accounts
            .read()
            .get(&account_id)
            .cloned()
            .ok_or(AuthError::UserNotFound)?;
        self.issue_tokens(&account)
    }

    /// Validate an access token into the session context.
    pub fn session_from_token(&self, token: &str) -> Result<SessionContext, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::SessionExpired,
                _ => AuthError::NotSignedIn,
            })?;

        if self.revoked.read().contains(&data.claims.jti) {
            return Err(AuthError::NotSignedIn);
        }

        let accounts = self.accounts.read();
        let account = accounts
            .get(&data.claims.sub)
            .ok_or(AuthError::UserNotFound)?;

        Ok(SessionContext {
            account_id: account.id.clone(),
            email: account.email.clone(),
            name: account.name.clone(),
            role: account.role,
            token_id: data.claims.jti,
        })
    }

    /// Revoke a token id (sign-out).
    pub fn revoke(&self, jti: &str) {
        self.revoked.write().insert(jti.to_string());
    }

    fn session_cookies(&self, access: &str, refresh: &str) -> (Cookie<'static>, Cookie<'static>) {
        let access_cookie = Cookie::build((AUTH_COOKIE, access.to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(self.secure_cookies)
            .max_age(cookie::time::Duration::minutes(ACCESS_TOKEN_EXPIRY_MINUTES))
            .build();

        let refresh_cookie = Cookie::build((REFRESH_COOKIE, refresh.to_string()))
            .path("/api/auth/refresh")
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(self.secure_cookies)
            .max_age(cookie::time::Duration::days(REFRESH_TOKEN_EXPIRY_DAYS))
            .build();

        (access_cookie, refresh_cookie)
    }

    fn clearing_cookies(&self) -> (Cookie<'static>, Cookie<'static>) {
        let access_cookie = Cookie::build((AUTH_COOKIE, ""))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(self.secure_cookies)
            .max_age(cookie::time::Duration::ZERO)
            .build();

        let refresh_cookie = Cookie::build((REFRESH_COOKIE, ""))
            .path("/api/auth/refresh")
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(self.secure_cookies)
            .max_age(cookie::time::Duration::ZERO)
            .build();

        (access_cookie, refresh_cookie)
    }
}

// ===== API handlers =====

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    #[serde(default)]
    pub name: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionContext>,
}

fn client_ip(headers: &axum::http::HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// `POST /api/auth/login`
pub async fn login_handler(
    State(state): State<Arc<AuthState>>,
    jar: CookieJar,
    headers: axum::http::HeaderMap,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<SessionResponse>), AuthError> {
    let ip = client_ip(&headers);
    let (_, access, refresh) = state.sign_in(&req.email, &req.password, &ip)?;
    let session = state.session_from_token(&access)?;

    tracing::info!(email = %session.email, role = ?session.role, "sign-in succeeded");

    let (access_cookie, refresh_cookie) = state.session_cookies(&access, &refresh);
    let jar = jar.add(access_cookie).add(refresh_cookie);

    Ok((
        jar,
        Json(SessionResponse {
            success: true,
            session: Some(session),
        }),
    ))
}

/// `POST /api/auth/register`
pub async fn register_handler(
    State(state): State<Arc<AuthState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), AuthError> {
    state.register(&req.email, &req.name, &req.password, Role::User)?;
    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            success: true,
            session: None,
        }),
    ))
}

/// `POST /api/auth/logout`
pub async fn logout_handler(
    State(state): State<Arc<AuthState>>,
    jar: CookieJar,
) -> (CookieJar, Json<SessionResponse>) {
    if let Some(cookie) = jar.get(AUTH_COOKIE) {
        if let Ok(session) = state.session_from_token(cookie.value()) {
            state.revoke(&session.token_id);
            tracing::info!(email = %session.email, "signed out");
        }
    }

    let (access_cookie, refresh_cookie) = state.clearing_cookies();
    let jar = jar.add(access_cookie).add(refresh_cookie);
    (
        jar,
        Json(SessionResponse {
            success: true,
            session: None,
        }),
    )
}

/// `POST /api/auth/refresh`
pub async fn refresh_handler(
    State(state): State<Arc<AuthState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<SessionResponse>), AuthError> {
    let token = jar
        .get(REFRESH_COOKIE)
        .ok_or(AuthError::NotSignedIn)?
        .value()
        .to_string();

    let (access, refresh) = state.refresh(&token)?;
    let session = state.session_from_token(&access)?;

    let (access_cookie, refresh_cookie) = state.session_cookies(&access, &refresh);
    let jar = jar.add(access_cookie).add(refresh_cookie);

    Ok((
        jar,
        Json(SessionResponse {
            success: true,
            session: Some(session),
        }),
    ))
}

/// `GET /api/auth/me`
pub async fn me_handler(
    State(state): State<Arc<AuthState>>,
    jar: CookieJar,
) -> Result<Json<SessionContext>, AuthError> {
    let token = jar.get(AUTH_COOKIE).ok_or(AuthError::NotSignedIn)?.value();
    Ok(Json(state.session_from_token(token)?))
}

// ===== Middleware =====

/// Require a valid session on API routes; attaches the [`SessionContext`]
/// to request extensions for downstream handlers.
pub async fn require_session(
    State(state): State<Arc<AuthState>>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = jar.get(AUTH_COOKIE).ok_or(AuthError::NotSignedIn)?.value();
    let session = state.session_from_token(token)?;
    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}

/// Route guard for protected dashboard pages: without an auth cookie the
/// browser is redirected to the root path instead of receiving an error.
pub async fn page_guard(jar: CookieJar, req: Request, next: Next) -> Response {
    if jar.get(AUTH_COOKIE).is_none() {
        return Redirect::temporary("/").into_response();
    }
    next.run(req).await
}

// ===== Router =====

/// The `/api/auth` router.
pub fn auth_router(state: Arc<AuthState>) -> Router {
    Router::new()
        .route("/login", post(login_handler))
        .route("/register", post(register_handler))
        .route("/logout", post(logout_handler))
        .route("/refresh", post(refresh_handler))
        .route("/me", get(me_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AuthState {
        AuthState::new("test-secret-at-least-32-characters-long", false)
    }

    #[test]
    fn test_register_and_sign_in() {
        let auth = state();
        auth.register("ops@trustlock.io", "Ops", "s3cure-pass!", Role::Admin)
            .unwrap();

        let (account, access, refresh) = auth
            .sign_in("ops@trustlock.io", "s3cure-pass!", "127.0.0.1")
            .unwrap();
        assert_eq!(account.role, Role::Admin);
        assert!(!access.is_empty());
        assert!(!refresh.is_empty());
    }

    #[test]
    fn test_email_is_case_insensitive_and_sanitized() {
        let auth = state();
        auth.register("Ops@TrustLock.io", "Ops", "s3cure-pass!", Role::User)
            .unwrap();
        assert!(auth
            .sign_in("<ops@trustlock.io>", "s3cure-pass!", "127.0.0.1")
            .is_ok());
    }

    #[test]
    fn test_wrong_password_message() {
        let auth = state();
        auth.register("a@b.c", "A", "s3cure-pass!", Role::User)
            .unwrap();
        let err = auth.sign_in("a@b.c", "nope-wrong-1!", "127.0.0.1").unwrap_err();
        assert!(matches!(err, AuthError::WrongPassword));
        assert_eq!(err.to_string(), "Incorrect password. Please try again.");
    }

    #[test]
    fn test_unknown_user_message() {
        let auth = state();
        let err = auth.sign_in("ghost@b.c", "whatever1!", "127.0.0.1").unwrap_err();
        assert_eq!(err.to_string(), "No user found with this email.");
    }

    #[test]
    fn test_password_policy() {
        let auth = state();
        for weak in ["short1!", "nodigits!!", "nospecial11", "1!aaaaa"] {
            let err = auth.register("x@y.z", "X", weak, Role::User).unwrap_err();
            assert!(matches!(err, AuthError::WeakPassword), "{weak}");
        }
        assert!(auth.register("x@y.z", "X", "longer-pass-1!", Role::User).is_ok());
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let auth = state();
        auth.register("a@b.c", "A", "s3cure-pass!", Role::User)
            .unwrap();
        let err = auth
            .register("a@b.c", "A2", "s3cure-pass!", Role::User)
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));
    }

    #[test]
    fn test_rate_limit() {
        let auth = state();
        auth.register("a@b.c", "A", "s3cure-pass!", Role::User)
            .unwrap();
        for _ in 0..MAX_SIGNIN_ATTEMPTS {
            let _ = auth.sign_in("a@b.c", "wrong-pass-1!", "10.0.0.9");
        }
        let err = auth.sign_in("a@b.c", "s3cure-pass!", "10.0.0.9").unwrap_err();
        assert!(matches!(err, AuthError::RateLimited));
        // A different IP is unaffected
        assert!(auth.sign_in("a@b.c", "s3cure-pass!", "10.0.0.10").is_ok());
    }

    #[test]
    fn test_session_context_carries_role() {
        let auth = state();
        auth.register("admin@b.c", "Admin", "s3cure-pass!", Role::Admin)
            .unwrap();
        let (_, access, _) = auth
            .sign_in("admin@b.c", "s3cure-pass!", "127.0.0.1")
            .unwrap();

        let session = auth.session_from_token(&access).unwrap();
        assert!(session.role.is_admin());
        assert_eq!(session.email, "admin@b.c");
    }

    #[test]
    fn test_revocation_invalidates_session() {
        let auth = state();
        auth.register("a@b.c", "A", "s3cure-pass!", Role::User)
            .unwrap();
        let (_, access, _) = auth.sign_in("a@b.c", "s3cure-pass!", "127.0.0.1").unwrap();

        let session = auth.session_from_token(&access).unwrap();
        auth.revoke(&session.token_id);
        assert!(auth.session_from_token(&access).is_err());
    }

    #[test]
    fn test_refresh_token_is_single_use() {
        let auth = state();
        auth.register("a@b.c", "A", "s3cure-pass!", Role::User)
            .unwrap();
        let (_, _, refresh) = auth.sign_in("a@b.c", "s3cure-pass!", "127.0.0.1").unwrap();

        let (new_access, _) = auth.refresh(&refresh).unwrap();
        assert!(auth.session_from_token(&new_access).is_ok());
        assert!(matches!(
            auth.refresh(&refresh),
            Err(AuthError::SessionExpired)
        ));
    }
}
