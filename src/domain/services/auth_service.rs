use crate::config::Config;
use crate::error::AppError;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, SaltString},
    Argon2, PasswordVerifier,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};
use serde::{Deserialize, Serialize};

const ACCESS_TOKEN_TTL_HOURS: i64 = 1;
const REFRESH_TOKEN_TTL_DAYS: i64 = 7;
const INVITE_CODE_LEN: usize = 12;

pub const TOKEN_USE_ACCESS: &str = "access";
pub const TOKEN_USE_REFRESH: &str = "refresh";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
    pub token_use: String,
}

pub struct AuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl AuthService {
    pub fn new(config: &Config) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret_key.as_bytes()),
        }
    }

    pub fn hash_password(&self, password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|_| AppError::Internal)
    }

    pub fn verify_password(&self, password: &str, password_hash: &str) -> Result<(), AppError> {
        let parsed_hash = PasswordHash::new(password_hash).map_err(|_| AppError::Internal)?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| AppError::Unauthorized)
    }

    pub fn issue_access_token(&self, email: &str) -> Result<String, AppError> {
        self.issue_token(email, TOKEN_USE_ACCESS, Duration::hours(ACCESS_TOKEN_TTL_HOURS))
    }

    pub fn issue_refresh_token(&self, email: &str) -> Result<String, AppError> {
        self.issue_token(email, TOKEN_USE_REFRESH, Duration::days(REFRESH_TOKEN_TTL_DAYS))
    }

    fn issue_token(&self, email: &str, token_use: &str, ttl: Duration) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: email.to_string(),
            exp: (now + ttl).timestamp() as usize,
            iat: now.timestamp() as usize,
            token_use: token_use.to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("JWT encoding failed: {}", e);
            AppError::Internal
        })
    }

    /// Any decode failure (malformed, expired, wrong key) maps to 401, as
    /// does presenting a refresh token where an access token is expected.
    pub fn verify_access(&self, token: &str) -> Result<Claims, AppError> {
        let claims = self.decode(token)?;
        if claims.token_use != TOKEN_USE_ACCESS {
            return Err(AppError::Unauthorized);
        }
        Ok(claims)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<Claims, AppError> {
        let claims = self.decode(token)?;
        if claims.token_use != TOKEN_USE_REFRESH {
            return Err(AppError::Unauthorized);
        }
        Ok(claims)
    }

    fn decode(&self, token: &str) -> Result<Claims, AppError> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| AppError::Unauthorized)
    }

    pub fn generate_invite_code(&self) -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(INVITE_CODE_LEN)
            .map(char::from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(secret: &str) -> Config {
        Config {
            database_url: "sqlite://:memory:".to_string(),
            port: 0,
            public_base_url: "http://localhost:3000".to_string(),
            data_dir: "./data".to_string(),
            upload_dir: "./uploads".to_string(),
            max_file_size: 1024,
            jwt_secret_key: secret.to_string(),
            openai_api_key: "test".to_string(),
            openai_base_url: "http://localhost".to_string(),
            chat_model: "test-model".to_string(),
            embedding_model: "test-embed".to_string(),
            pinecone_api_key: "test".to_string(),
            pinecone_index_host: "http://localhost".to_string(),
            mail_service_url: "http://localhost".to_string(),
            mail_service_token: "token".to_string(),
        }
    }

    #[test]
    fn test_access_token_roundtrip() {
        let service = AuthService::new(&test_config("secret-a"));
        let token = service.issue_access_token("a@x.com").unwrap();
        let claims = service.verify_access(&token).unwrap();
        assert_eq!(claims.sub, "a@x.com");
        assert_eq!(claims.token_use, TOKEN_USE_ACCESS);
    }

    #[test]
    fn test_wrong_key_rejected() {
        let issuer = AuthService::new(&test_config("secret-a"));
        let verifier = AuthService::new(&test_config("secret-b"));
        let token = issuer.issue_access_token("a@x.com").unwrap();
        assert!(matches!(verifier.verify_access(&token), Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_malformed_token_rejected() {
        let service = AuthService::new(&test_config("secret-a"));
        assert!(matches!(service.verify_access("not-a-jwt"), Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = AuthService::new(&test_config("secret-a"));
        let past = Utc::now() - Duration::hours(2);
        let claims = Claims {
            sub: "a@x.com".to_string(),
            exp: past.timestamp() as usize,
            iat: (past - Duration::hours(1)).timestamp() as usize,
            token_use: TOKEN_USE_ACCESS.to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"secret-a"),
        )
        .unwrap();
        assert!(matches!(service.verify_access(&token), Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_refresh_token_not_valid_as_access() {
        let service = AuthService::new(&test_config("secret-a"));
        let refresh = service.issue_refresh_token("a@x.com").unwrap();
        assert!(matches!(service.verify_access(&refresh), Err(AppError::Unauthorized)));
        assert!(service.verify_refresh(&refresh).is_ok());
    }

    #[test]
    fn test_password_hash_and_verify() {
        let service = AuthService::new(&test_config("secret-a"));
        let hash = service.hash_password("pw123").unwrap();
        assert_ne!(hash, "pw123");
        assert!(service.verify_password("pw123", &hash).is_ok());
        assert!(matches!(service.verify_password("wrong", &hash), Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_invite_codes_are_random() {
        let service = AuthService::new(&test_config("secret-a"));
        let a = service.generate_invite_code();
        let b = service.generate_invite_code();
        assert_eq!(a.len(), 12);
        assert_ne!(a, b);
    }
}
