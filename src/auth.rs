use actix_web::{http::header::AUTHORIZATION, HttpRequest};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Lifetime of a provider login token
pub const TOKEN_TTL_DAYS: i64 = 7;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub exp: i64,
}

impl Claims {
    /// Provider id from `providerId`, then `sub`, then `id`.
    pub fn provider_ref(&self) -> Option<Uuid> {
        [&self.provider_id, &self.sub, &self.id]
            .into_iter()
            .flatten()
            .find_map(|raw| Uuid::parse_str(raw).ok())
    }
}

/// HS256 keys for issuing and checking provider tokens
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenKeys {
    pub fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn issue(&self, provider_id: Uuid, phone_number: &str) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = Claims {
            provider_id: Some(provider_id.to_string()),
            sub: None,
            id: None,
            email: None,
            phone_number: Some(phone_number.to_string()),
            exp: (Utc::now() + Duration::days(TOKEN_TTL_DAYS)).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
    }

    /// `None` for missing, malformed, expired or foreign tokens.
    pub fn verify(&self, token: &str) -> Option<Claims> {
        match decode::<Claims>(token, &self.decoding, &Validation::default()) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                debug!("Rejected provider token: {}", e);
                None
            }
        }
    }
}

/// Token from the Authorization header, with or without the `Bearer ` prefix.
pub fn bearer_token(req: &HttpRequest) -> Option<&str> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn issued_token_round_trips_provider_id() {
        let keys = TokenKeys::from_secret("test-secret");
        let id = Uuid::new_v4();
        let token = keys.issue(id, "9999999999").unwrap();

        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.provider_ref(), Some(id));
        assert_eq!(claims.phone_number.as_deref(), Some("9999999999"));
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let token = TokenKeys::from_secret("one").issue(Uuid::new_v4(), "1").unwrap();
        assert!(TokenKeys::from_secret("two").verify(&token).is_none());
        assert!(TokenKeys::from_secret("one").verify("not-a-token").is_none());
    }

    #[test]
    fn provider_ref_falls_back_through_sub_and_id() {
        let id = Uuid::new_v4();
        let claims = Claims {
            provider_id: Some("legacy-object-id".into()),
            sub: None,
            id: Some(id.to_string()),
            email: None,
            phone_number: None,
            exp: 0,
        };
        assert_eq!(claims.provider_ref(), Some(id));

        let claims = Claims {
            provider_id: None,
            sub: None,
            id: None,
            email: Some("a@b.c".into()),
            phone_number: None,
            exp: 0,
        };
        assert_eq!(claims.provider_ref(), None);
    }

    #[test]
    fn bearer_prefix_is_optional() {
        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, "Bearer abc.def"))
            .to_http_request();
        assert_eq!(bearer_token(&req), Some("abc.def"));

        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, "abc.def"))
            .to_http_request();
        assert_eq!(bearer_token(&req), Some("abc.def"));

        let req = TestRequest::default().to_http_request();
        assert_eq!(bearer_token(&req), None);
    }
}
