//! Auth Provider Contract
//!
//! Bearer/OAuth protection for the HTTP transports. `AuthProvider` is the
//! seam a host implements: an in-memory demo provider for examples/tests,
//! or a provider backed by a real authorization server.
//!
//! PKCE is mandatory: `authorization_url()` always generates an S256
//! challenge via `oauth2::PkceCodeChallenge::new_random_sha256()`. There is
//! no `plain` code path to opt into.

use std::time::{Duration, Instant};

use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge,
    PkceCodeVerifier, RedirectUrl, Scope, TokenResponse, TokenUrl,
};
use tokio::sync::Mutex;

/// A bearer token plus its expiry, as handed back to a transport for the
/// `Authorization: Bearer <token>` header.
#[derive(Debug, Clone)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<Instant>,
}

impl Token {
    pub fn is_expired(&self) -> bool {
        self.expires_at.map(|at| Instant::now() >= at).unwrap_or(false)
    }
}

/// Errors raised by an [`AuthProvider`].
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("no token available; call authorization_url() and exchange_code() first")]
    NoToken,

    #[error("token is expired and no refresh token is available")]
    Expired,

    #[error("OAuth request failed: {0}")]
    Request(String),
}

/// Contract for bearer/OAuth-protected transports. A provider owns token
/// acquisition, storage, and refresh; transports only ever call
/// [`AuthProvider::token`].
#[async_trait::async_trait]
pub trait AuthProvider: Send + Sync {
    /// Build the authorization-code URL the user should be sent to, and the
    /// PKCE verifier the caller must hold onto until [`Self::exchange_code`].
    fn authorization_url(&self, scopes: &[String]) -> Result<(String, PkceVerifier), AuthError>;

    /// Exchange an authorization code (plus its PKCE verifier) for a token.
    async fn exchange_code(&self, code: &str, verifier: PkceVerifier) -> Result<Token, AuthError>;

    /// Refresh the current token using its refresh token.
    async fn refresh(&self) -> Result<Token, AuthError>;

    /// Return a valid access token, refreshing it first if it's expired and
    /// refreshable.
    async fn token(&self) -> Result<Token, AuthError>;
}

/// Opaque carrier for a PKCE code verifier between `authorization_url()`
/// and `exchange_code()`. Not `Clone`: a verifier is meant to be used once.
pub struct PkceVerifier(PkceCodeVerifier);

/// An `AuthProvider` backed by a standard OAuth 2.0 authorization server,
/// using the authorization-code + PKCE (S256) flow throughout.
pub struct OAuthProvider {
    client: BasicClient,
    current: Mutex<Option<Token>>,
}

impl OAuthProvider {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: Option<String>,
        auth_url: impl Into<String>,
        token_url: impl Into<String>,
        redirect_url: impl Into<String>,
    ) -> Result<Self, AuthError> {
        let client = BasicClient::new(
            ClientId::new(client_id.into()),
            client_secret.map(ClientSecret::new),
            AuthUrl::new(auth_url.into()).map_err(|e| AuthError::Request(e.to_string()))?,
            Some(TokenUrl::new(token_url.into()).map_err(|e| AuthError::Request(e.to_string()))?),
        )
        .set_redirect_uri(
            RedirectUrl::new(redirect_url.into()).map_err(|e| AuthError::Request(e.to_string()))?,
        );

        Ok(Self {
            client,
            current: Mutex::new(None),
        })
    }
}

#[async_trait::async_trait]
impl AuthProvider for OAuthProvider {
    fn authorization_url(&self, scopes: &[String]) -> Result<(String, PkceVerifier), AuthError> {
        let (challenge, verifier) = PkceCodeChallenge::new_random_sha256();

        let mut request = self
            .client
            .authorize_url(CsrfToken::new_random)
            .set_pkce_challenge(challenge);

        for scope in scopes {
            request = request.add_scope(Scope::new(scope.clone()));
        }

        let (url, _csrf) = request.url();
        Ok((url.to_string(), PkceVerifier(verifier)))
    }

    async fn exchange_code(&self, code: &str, verifier: PkceVerifier) -> Result<Token, AuthError> {
        let response = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .set_pkce_verifier(verifier.0)
            .request_async(oauth2::reqwest::async_http_client)
            .await
            .map_err(|e| AuthError::Request(e.to_string()))?;

        let token = token_from_response(&response);
        *self.current.lock().await = Some(token.clone());
        Ok(token)
    }

    async fn refresh(&self) -> Result<Token, AuthError> {
        let refresh_token = {
            let current = self.current.lock().await;
            current
                .as_ref()
                .and_then(|t| t.refresh_token.clone())
                .ok_or(AuthError::NoToken)?
        };

        let response = self
            .client
            .exchange_refresh_token(&oauth2::RefreshToken::new(refresh_token))
            .request_async(oauth2::reqwest::async_http_client)
            .await
            .map_err(|e| AuthError::Request(e.to_string()))?;

        let token = token_from_response(&response);
        *self.current.lock().await = Some(token.clone());
        Ok(token)
    }

    async fn token(&self) -> Result<Token, AuthError> {
        let existing = self.current.lock().await.clone();
        match existing {
            Some(token) if !token.is_expired() => Ok(token),
            Some(token) if token.refresh_token.is_some() => {
                let _ = token;
                self.refresh().await
            }
            Some(_) => Err(AuthError::Expired),
            None => Err(AuthError::NoToken),
        }
    }
}

fn token_from_response<TR>(response: &TR) -> Token
where
    TR: TokenResponse<oauth2::basic::BasicTokenType>,
{
    Token {
        access_token: response.access_token().secret().to_string(),
        refresh_token: response.refresh_token().map(|t| t.secret().to_string()),
        expires_at: response.expires_in().map(|d| Instant::now() + d),
    }
}

/// A static, always-valid token provider for tests and local demos — no
/// authorization server involved.
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

#[async_trait::async_trait]
impl AuthProvider for StaticTokenProvider {
    fn authorization_url(&self, _scopes: &[String]) -> Result<(String, PkceVerifier), AuthError> {
        Err(AuthError::Request("StaticTokenProvider has no authorization server".into()))
    }

    async fn exchange_code(&self, _code: &str, _verifier: PkceVerifier) -> Result<Token, AuthError> {
        Err(AuthError::Request("StaticTokenProvider has no authorization server".into()))
    }

    async fn refresh(&self) -> Result<Token, AuthError> {
        self.token().await
    }

    async fn token(&self) -> Result<Token, AuthError> {
        Ok(Token {
            access_token: self.token.clone(),
            refresh_token: None,
            expires_at: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_expiry() {
        let expired = Token {
            access_token: "a".into(),
            refresh_token: None,
            expires_at: Some(Instant::now() - Duration::from_secs(1)),
        };
        assert!(expired.is_expired());

        let fresh = Token {
            access_token: "a".into(),
            refresh_token: None,
            expires_at: Some(Instant::now() + Duration::from_secs(60)),
        };
        assert!(!fresh.is_expired());

        let no_expiry = Token {
            access_token: "a".into(),
            refresh_token: None,
            expires_at: None,
        };
        assert!(!no_expiry.is_expired());
    }

    #[tokio::test]
    async fn test_static_token_provider_returns_fixed_token() {
        let provider = StaticTokenProvider::new("fixed-token");
        let token = provider.token().await.unwrap();
        assert_eq!(token.access_token, "fixed-token");
        assert!(!token.is_expired());
    }

    #[tokio::test]
    async fn test_static_token_provider_rejects_authorization_flow() {
        let provider = StaticTokenProvider::new("fixed-token");
        assert!(provider.authorization_url(&[]).is_err());
    }

    #[test]
    fn test_oauth_provider_construction_requires_valid_urls() {
        let result = OAuthProvider::new(
            "client-id",
            None,
            "https://auth.example.com/authorize",
            "https://auth.example.com/token",
            "https://app.example.com/callback",
        );
        assert!(result.is_ok());
    }
}
