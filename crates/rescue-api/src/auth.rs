//! Password hashing, session tokens, session cookies, and the role-checking
//! [`Auth`] extractor.
//!
//! Access and refresh tokens are HS256 JWTs signed with separate secrets.
//! Each carries the account id and kind, so a token minted for one kind of
//! account never opens a route of another kind.

use std::{marker::PhantomData, time::Duration};

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand_core::OsRng;
use rescue_core::{
  account::{Account, AccountKind},
  media::MediaStore,
  store::RescueStore,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{
  AppState,
  error::{ApiError, store_err},
};

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";

// ─── Configuration ───────────────────────────────────────────────────────────

/// Signing secrets, lifetimes and hashing cost, built once at startup.
#[derive(Clone)]
pub struct AuthConfig {
  pub access_secret:   String,
  pub access_ttl:      Duration,
  pub refresh_secret:  String,
  pub refresh_ttl:     Duration,
  /// Adds `Secure` to session cookies.
  pub secure_cookies:  bool,
  /// Cost parameters for newly hashed passwords. Verification reads the
  /// parameters embedded in the stored hash.
  pub password_params: argon2::Params,
}

// ─── Tokens ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
  Access,
  Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
  pub sub:   Uuid,
  pub kind:  AccountKind,
  pub typ:   TokenKind,
  pub email: String,
  pub name:  String,
  pub iat:   i64,
  pub exp:   i64,
  /// Unique per token, so a rotation within the same second still yields a
  /// different refresh token.
  pub jti:   Uuid,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
  pub access_token:  String,
  pub refresh_token: String,
}

impl AuthConfig {
  fn secret(&self, typ: TokenKind) -> &[u8] {
    match typ {
      TokenKind::Access => self.access_secret.as_bytes(),
      TokenKind::Refresh => self.refresh_secret.as_bytes(),
    }
  }

  fn ttl(&self, typ: TokenKind) -> Duration {
    match typ {
      TokenKind::Access => self.access_ttl,
      TokenKind::Refresh => self.refresh_ttl,
    }
  }

  fn issue_at(&self, typ: TokenKind, account: &Account, now: i64) -> Result<String, ApiError> {
    let ttl = i64::try_from(self.ttl(typ).as_secs()).unwrap_or(i64::MAX);
    let claims = Claims {
      sub: account.account_id,
      kind: account.kind(),
      typ,
      email: account.email.clone(),
      name: account.profile.display_name().to_owned(),
      iat: now,
      exp: now.saturating_add(ttl),
      jti: Uuid::new_v4(),
    };
    jsonwebtoken::encode(
      &Header::new(Algorithm::HS256),
      &claims,
      &EncodingKey::from_secret(self.secret(typ)),
    )
    .map_err(ApiError::internal)
  }

  pub fn issue(&self, typ: TokenKind, account: &Account) -> Result<String, ApiError> {
    self.issue_at(typ, account, Utc::now().timestamp())
  }

  pub fn issue_pair(&self, account: &Account) -> Result<TokenPair, ApiError> {
    Ok(TokenPair {
      access_token:  self.issue(TokenKind::Access, account)?,
      refresh_token: self.issue(TokenKind::Refresh, account)?,
    })
  }

  /// Verify signature, expiry and token type. Any failure is `None`.
  pub fn verify(&self, typ: TokenKind, token: &str) -> Option<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    let data = jsonwebtoken::decode::<Claims>(
      token,
      &DecodingKey::from_secret(self.secret(typ)),
      &validation,
    )
    .ok()?;
    (data.claims.typ == typ).then_some(data.claims)
  }

  // ── Cookies ───────────────────────────────────────────────────────────────

  fn cookie(&self, name: &str, value: &str, max_age: u64) -> String {
    let secure = if self.secure_cookies { "; Secure" } else { "" };
    format!("{name}={value}; Max-Age={max_age}; Path=/; HttpOnly; SameSite=Lax{secure}")
  }

  pub fn session_cookies(&self, pair: &TokenPair) -> [String; 2] {
    [
      self.cookie(ACCESS_COOKIE, &pair.access_token, self.access_ttl.as_secs()),
      self.cookie(REFRESH_COOKIE, &pair.refresh_token, self.refresh_ttl.as_secs()),
    ]
  }

  pub fn cleared_cookies(&self) -> [String; 2] {
    [self.cookie(ACCESS_COOKIE, "", 0), self.cookie(REFRESH_COOKIE, "", 0)]
  }

  // ── Passwords ─────────────────────────────────────────────────────────────

  /// Hash `password` into an argon2id PHC string off the async runtime.
  pub async fn hash_password(&self, password: String) -> Result<String, ApiError> {
    let params = self.password_params.clone();
    tokio::task::spawn_blocking(move || {
      let salt = SaltString::generate(&mut OsRng);
      Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params)
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("argon2 error: {e}").into()))
    })
    .await
    .map_err(ApiError::internal)?
  }

  /// Check `password` against a stored PHC string. A malformed hash never
  /// verifies.
  pub async fn verify_password(&self, password: String, hash: String) -> bool {
    tokio::task::spawn_blocking(move || {
      PasswordHash::new(&hash)
        .map(|parsed| {
          Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
        })
        .unwrap_or(false)
    })
    .await
    .unwrap_or(false)
  }
}

/// The form a refresh token is persisted in.
pub fn token_digest(token: &str) -> String { hex::encode(Sha256::digest(token.as_bytes())) }

// ─── Reading tokens from requests ────────────────────────────────────────────

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
  headers
    .get_all(header::COOKIE)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|v| v.split(';'))
    .filter_map(|pair| pair.trim().split_once('='))
    .find(|(key, _)| *key == name)
    .map(|(_, value)| value.to_owned())
    .filter(|value| !value.is_empty())
}

fn bearer(headers: &HeaderMap) -> Option<String> {
  headers
    .get(header::AUTHORIZATION)?
    .to_str()
    .ok()?
    .strip_prefix("Bearer ")
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .map(str::to_owned)
}

/// A token from the named cookie, falling back to `Authorization: Bearer`.
pub fn request_token(headers: &HeaderMap, cookie: &str) -> Option<String> {
  cookie_value(headers, cookie).or_else(|| bearer(headers))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshBody {
  refresh_token: Option<String>,
}

/// The refresh token presented to a refresh endpoint: the refresh cookie,
/// then a JSON `{refreshToken}` body, then `Authorization: Bearer`.
/// A bearer header may carry the access token, so it is consulted last.
pub fn refresh_token(headers: &HeaderMap, body: &[u8]) -> Option<String> {
  cookie_value(headers, REFRESH_COOKIE)
    .or_else(|| {
      serde_json::from_slice::<RefreshBody>(body)
        .ok()
        .and_then(|b| b.refresh_token)
        .filter(|t| !t.trim().is_empty())
    })
    .or_else(|| bearer(headers))
}

// ─── Roles ───────────────────────────────────────────────────────────────────

/// Type-level account kind for [`Auth`].
pub trait Role: Send + Sync + 'static {
  const KIND: AccountKind;
}

pub struct Informant;
pub struct Rescuer;
pub struct Organization;

impl Role for Informant {
  const KIND: AccountKind = AccountKind::Informant;
}

impl Role for Rescuer {
  const KIND: AccountKind = AccountKind::Rescuer;
}

impl Role for Organization {
  const KIND: AccountKind = AccountKind::Organization;
}

// ─── Extractor ───────────────────────────────────────────────────────────────

/// The authenticated account of kind `R::KIND`.
///
/// Rejects with the same 401 whether the token is missing, malformed,
/// expired, minted for another kind, or names an account that no longer
/// exists.
pub struct Auth<R: Role> {
  pub account: Account,
  role:        PhantomData<R>,
}

impl<R: Role> Auth<R> {
  pub fn id(&self) -> Uuid { self.account.account_id }
}

impl<S, M, R> FromRequestParts<AppState<S, M>> for Auth<R>
where
  S: RescueStore + 'static,
  M: MediaStore + 'static,
  R: Role,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, M>,
  ) -> Result<Self, Self::Rejection> {
    let token = request_token(&parts.headers, ACCESS_COOKIE).ok_or_else(ApiError::unauthorized)?;
    let claims = state
      .auth
      .verify(TokenKind::Access, &token)
      .filter(|c| c.kind == R::KIND)
      .ok_or_else(ApiError::unauthorized)?;

    let account = state
      .store
      .get_account(R::KIND, claims.sub)
      .await
      .map_err(store_err)?
      .ok_or_else(ApiError::unauthorized)?;

    Ok(Self { account, role: PhantomData })
  }
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;
  use rescue_core::account::{OrganizationProfile, Profile};

  use super::*;

  fn config() -> AuthConfig {
    AuthConfig {
      access_secret:   "access-secret".into(),
      access_ttl:      Duration::from_secs(60),
      refresh_secret:  "refresh-secret".into(),
      refresh_ttl:     Duration::from_secs(600),
      secure_cookies:  true,
      password_params: argon2::Params::new(8, 1, 1, None).unwrap(),
    }
  }

  fn account() -> Account {
    Account {
      account_id:    Uuid::new_v4(),
      email:         "paws@shelter.org".into(),
      phone_number:  "555-0100".into(),
      password_hash: String::new(),
      refresh_token: None,
      profile:       Profile::Organization(OrganizationProfile {
        org_name: "Paws".into(),
        location: "Pune".into(),
        logo:     "/media/logo.png".into(),
      }),
      created_at:    Utc::now(),
      updated_at:    Utc::now(),
    }
  }

  #[test]
  fn issued_tokens_verify_with_their_own_secret_only() {
    let cfg = config();
    let acct = account();
    let pair = cfg.issue_pair(&acct).unwrap();

    let claims = cfg.verify(TokenKind::Access, &pair.access_token).unwrap();
    assert_eq!(claims.sub, acct.account_id);
    assert_eq!(claims.kind, AccountKind::Organization);
    assert_eq!(claims.name, "Paws");

    assert!(cfg.verify(TokenKind::Refresh, &pair.access_token).is_none());
    assert!(cfg.verify(TokenKind::Access, &pair.refresh_token).is_none());
    assert!(cfg.verify(TokenKind::Access, "not.a.jwt").is_none());
  }

  #[test]
  fn rotations_yield_distinct_tokens() {
    let cfg = config();
    let acct = account();
    let a = cfg.issue(TokenKind::Refresh, &acct).unwrap();
    let b = cfg.issue(TokenKind::Refresh, &acct).unwrap();
    assert_ne!(a, b);
    assert_ne!(token_digest(&a), token_digest(&b));
  }

  #[test]
  fn expired_tokens_are_rejected() {
    let cfg = config();
    let long_ago = Utc::now().timestamp() - 10_000;
    let token = cfg.issue_at(TokenKind::Access, &account(), long_ago).unwrap();
    assert!(cfg.verify(TokenKind::Access, &token).is_none());
  }

  #[test]
  fn cookie_wins_over_bearer() {
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
    assert_eq!(request_token(&headers, ACCESS_COOKIE).as_deref(), Some("from-header"));

    headers.insert(
      header::COOKIE,
      HeaderValue::from_static("theme=dark; accessToken=from-cookie; refreshToken=r"),
    );
    assert_eq!(request_token(&headers, ACCESS_COOKIE).as_deref(), Some("from-cookie"));
    assert_eq!(request_token(&headers, REFRESH_COOKIE).as_deref(), Some("r"));
  }

  #[test]
  fn refresh_token_prefers_cookie_then_body_then_bearer() {
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer access"));
    let body = br#"{"refreshToken":"from-body"}"#;
    assert_eq!(refresh_token(&headers, body).as_deref(), Some("from-body"));
    assert_eq!(refresh_token(&headers, b"").as_deref(), Some("access"));
    assert_eq!(refresh_token(&headers, br#"{"refreshToken":""}"#).as_deref(), Some("access"));

    headers.insert(header::COOKIE, HeaderValue::from_static("refreshToken=from-cookie"));
    assert_eq!(refresh_token(&headers, body).as_deref(), Some("from-cookie"));
    assert_eq!(refresh_token(&HeaderMap::new(), b"not json"), None);
  }

  #[test]
  fn cookies_carry_attributes() {
    let cfg = config();
    let [access, refresh] = cfg.cleared_cookies();
    assert!(access.starts_with("accessToken=;"));
    assert!(access.contains("Max-Age=0"));
    assert!(refresh.contains("HttpOnly"));
    assert!(refresh.contains("Secure"));
  }

  #[tokio::test]
  async fn password_hash_round_trip() {
    let cfg = config();
    let hash = cfg.hash_password("s3cret".into()).await.unwrap();
    assert!(cfg.verify_password("s3cret".into(), hash.clone()).await);
    assert!(!cfg.verify_password("wrong".into(), hash).await);
    assert!(!cfg.verify_password("s3cret".into(), "garbage".into()).await);
  }
}
