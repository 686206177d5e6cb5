use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,        // user_id
    pub email: String,
    pub username: String,
    pub exp: i64,         // expiration timestamp
}

/// Émet et vérifie les assertions d'identité signées (JWT HS256)
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// Génère un JWT token pour un utilisateur
    pub fn generate_token(&self, user_id: Uuid, email: &str, username: &str) -> Result<String, String> {
        let expiration = Utc::now()
            .checked_add_signed(self.ttl)
            .ok_or("Failed to calculate expiration")?
            .timestamp();

        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            username: username.to_string(),
            exp: expiration,
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| format!("Failed to generate token: {}", e))
    }

    /// Vérifie et décode un JWT token
    pub fn verify_token(&self, token: &str) -> Result<Claims, String> {
        decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|e| format!("Invalid token: {}", e))
    }
}
