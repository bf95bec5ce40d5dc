//! JWT verification

use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Audience Supabase puts on signed-in user tokens
const DEFAULT_AUDIENCE: &str = "authenticated";

/// Auth errors (all map to 401)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,

    #[error("token expired")]
    Expired,

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("malformed token")]
    Malformed,
}

/// Claims carried by Supabase access tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Auth user id
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.sub).map_err(|_| AuthError::Malformed)
    }
}

/// Auth configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub audience: String,
}

impl AuthConfig {
    /// Read `SUPABASE_JWT_SECRET`. Without it, authenticated routes answer 503.
    pub fn from_env() -> Option<Self> {
        let jwt_secret = std::env::var("SUPABASE_JWT_SECRET")
            .ok()
            .filter(|s| !s.trim().is_empty())?;
        Some(Self::new(jwt_secret))
    }

    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            audience: DEFAULT_AUDIENCE.to_owned(),
        }
    }
}

/// Verifies HS256 access tokens
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&config.audience]);

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Validate a token and return its claims.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::Malformed,
            }
        })?;
        Ok(data.claims)
    }

    /// Pull the token out of an `Authorization` header value.
    pub fn bearer(header: Option<&str>) -> Result<&str, AuthError> {
        let value = header.ok_or(AuthError::MissingToken)?;
        let (scheme, token) = value.split_once(' ').ok_or(AuthError::Malformed)?;
        if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
            return Err(AuthError::Malformed);
        }
        Ok(token.trim())
    }
}

#[cfg(test)]
pub(crate) mod test_tokens {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;
    use uuid::Uuid;

    pub const SECRET: &str = "test-secret-for-classdesk";

    /// Sign a token the way Supabase would.
    pub fn sign(user_id: Uuid, email: &str, expires_in_secs: i64) -> String {
        let exp = chrono::Utc::now().timestamp() + expires_in_secs;
        let claims = json!({
            "sub": user_id.to_string(),
            "email": email,
            "role": "authenticated",
            "aud": "authenticated",
            "exp": exp,
        });
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .expect("sign test token")
    }
}
