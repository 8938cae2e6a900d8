use axum::http;
use jsonwebtoken::{decode, Algorithm, DecodingKey, TokenData, Validation};

// Get the auth token from a request
pub fn get_auth_token<B>(req: &http::Request<B>) -> Result<String, String> {
    // 1. Try to get token from Authorization header
    if let Some(auth_header) = req.headers().get(http::header::AUTHORIZATION) {
        let auth_str = auth_header
            .to_str()
            .map_err(|_| "Invalid Authorization header".to_string())?;
        Ok(auth_str.strip_prefix("Bearer ").unwrap_or(auth_str).to_string())
    }
    // 2. Browsers cannot set headers on a WebSocket upgrade, so fall back to the cookie
    else {
        let cookie_header = req
            .headers()
            .get(http::header::COOKIE)
            .ok_or_else(|| "Missing Authorization header or Cookie".to_string())?
            .to_str()
            .map_err(|_| "Invalid Cookie header".to_string())?;

        for c in cookie::Cookie::split_parse(cookie_header).flatten() {
            if c.name() == "auth_token" {
                return Ok(c.value().to_string());
            }
        }
        Err("auth_token cookie not found".to_string())
    }
}

// Validate a JWT token and return the token data
pub fn validate_jwt(token: &str, secret: &str) -> Result<TokenData<serde_json::Value>, jsonwebtoken::errors::Error> {
    let validation = Validation::new(Algorithm::HS256);
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    decode::<serde_json::Value>(token, &decoding_key, &validation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    fn request(header: (http::HeaderName, &str)) -> http::Request<()> {
        http::Request::builder()
            .header(header.0, header.1)
            .body(())
            .unwrap()
    }

    #[test]
    fn token_from_bearer_header() {
        let req = request((http::header::AUTHORIZATION, "Bearer abc"));
        assert_eq!(get_auth_token(&req).unwrap(), "abc");
    }

    #[test]
    fn token_from_cookie() {
        let req = request((http::header::COOKIE, "theme=dark; auth_token=xyz"));
        assert_eq!(get_auth_token(&req).unwrap(), "xyz");
    }

    #[test]
    fn missing_token_is_an_error() {
        let req = http::Request::builder().body(()).unwrap();
        assert!(get_auth_token(&req).is_err());
    }

    #[test]
    fn validates_signature() {
        let exp = chrono::Utc::now().timestamp() + 60;
        let claims = json!({"sub": "1", "exp": exp});
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(b"secret")).unwrap();
        assert_eq!(validate_jwt(&token, "secret").unwrap().claims["sub"], json!("1"));
        assert!(validate_jwt(&token, "other").is_err());
    }
}
