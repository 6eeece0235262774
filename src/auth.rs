use std::future::{ready, Ready};

use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::{errors::AppError, AppState};

pub fn hash_password(password: &str) -> Result<String, AppError> {
    Argon2::default()
        .hash_password(password.as_bytes(), &SaltString::generate(&mut OsRng))
        .map(|h| h.to_string())
        .map_err(|e| {
            log::error!("Failed to hash password: {}", e);
            AppError::Password(e.to_string())
        })
}

pub fn verify_password(provided: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(provided.as_bytes(), &parsed)
        .is_ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalKind {
    CompanyAdmin,
    SchoolAdmin,
    Teacher,
    Student,
}

/// Self-contained bearer token payload. `identifier` is the kind-specific
/// handle (admin/school email, employee id, admission id); `school_code` is
/// absent only for company admins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub kind: PrincipalKind,
    pub id: i64,
    pub identifier: String,
    pub school_code: Option<String>,
    pub exp: i64,
}

impl Claims {
    pub fn new(
        kind: PrincipalKind,
        id: i64,
        identifier: &str,
        school_code: Option<&str>,
        ttl_secs: i64,
    ) -> Self {
        Claims {
            kind,
            id,
            identifier: identifier.to_string(),
            school_code: school_code.map(|s| s.to_string()),
            exp: chrono::Utc::now().timestamp() + ttl_secs,
        }
    }

    pub fn require(self, kind: PrincipalKind) -> Result<Self, AppError> {
        if self.kind == kind {
            Ok(self)
        } else {
            Err(AppError::Forbidden("Insufficient privileges".to_string()))
        }
    }
}

type HmacSha256 = Hmac<Sha256>;

fn mac_for(secret: &str) -> Result<HmacSha256, AppError> {
    HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| AppError::Password("Invalid signing key".to_string()))
}

/// `base64url(claims json) . base64url(hmac-sha256(payload))`
pub fn sign_token(claims: &Claims, secret: &str) -> Result<String, AppError> {
    let payload = URL_SAFE_NO_PAD.encode(
        serde_json::to_vec(claims).map_err(|e| AppError::Password(e.to_string()))?,
    );
    let mut mac = mac_for(secret)?;
    mac.update(payload.as_bytes());
    let sig = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
    Ok(format!("{payload}.{sig}"))
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    let invalid = || AppError::Unauthorized("Invalid token".to_string());

    let (payload, sig) = token.split_once('.').ok_or_else(invalid)?;
    let sig_bytes = URL_SAFE_NO_PAD.decode(sig).map_err(|_| invalid())?;

    let mut mac = mac_for(secret)?;
    mac.update(payload.as_bytes());
    mac.verify_slice(&sig_bytes).map_err(|_| invalid())?;

    let claims: Claims = URL_SAFE_NO_PAD
        .decode(payload)
        .ok()
        .and_then(|raw| serde_json::from_slice(&raw).ok())
        .ok_or_else(invalid)?;

    if claims.exp < chrono::Utc::now().timestamp() {
        return Err(AppError::Unauthorized("Token expired".to_string()));
    }
    Ok(claims)
}

/// Extractor for bearer-protected handlers; rejects missing, malformed and
/// expired tokens before the handler body runs.
pub struct AuthedPrincipal(pub Claims);

impl FromRequest for AuthedPrincipal {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(extract_principal(req))
    }
}

fn extract_principal(req: &HttpRequest) -> Result<AuthedPrincipal, AppError> {
    let missing = || AppError::Unauthorized("Missing authorization token".to_string());

    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(missing)?;
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(missing)?;

    let claims = verify_token(token, &state.config.token_secret)?;
    Ok(AuthedPrincipal(claims))
}
