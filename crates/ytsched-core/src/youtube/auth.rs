//! OAuth2 Authorization Code flow for the installed-app client.
//!
//! 1. Opens the browser to Google's authorization URL
//! 2. Starts a tiny localhost HTTP server to receive the callback
//! 3. Exchanges the code for an access token (+ refresh token)
//! 4. Persists tokens to the project's token file
//!
//! Client id/secret come from the client-secrets JSON downloaded from the
//! Google Cloud console (the `installed`/`web` envelope).

use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::Path;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::OAuthError;
use crate::youtube::{READONLY_SCOPE, UPLOAD_SCOPE};

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Stored OAuth tokens for one project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Unix timestamp of access-token expiry.
    pub expires_at: Option<i64>,
    pub token_type: String,
    pub scope: Option<String>,
}

/// OAuth client credentials from a Google client-secrets file.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
}

impl ClientSecrets {
    /// Reads a downloaded client-secrets JSON, accepting either the
    /// `installed` (desktop app) or `web` envelope.
    pub fn from_file(path: &Path) -> Result<Self, OAuthError> {
        let unreadable = |message: String| OAuthError::SecretsUnreadable {
            path: path.to_path_buf(),
            message,
        };
        let content = std::fs::read_to_string(path).map_err(|e| unreadable(e.to_string()))?;
        let value: serde_json::Value =
            serde_json::from_str(&content).map_err(|e| unreadable(e.to_string()))?;
        let envelope = value
            .get("installed")
            .or_else(|| value.get("web"))
            .ok_or_else(|| unreadable("expected an 'installed' or 'web' section".into()))?;
        serde_json::from_value(envelope.clone()).map_err(|e| unreadable(e.to_string()))
    }
}

fn redirect_uri(port: u16) -> String {
    format!("http://localhost:{port}/callback")
}

fn auth_url(secrets: &ClientSecrets, port: u16) -> String {
    let scopes = format!("{UPLOAD_SCOPE} {READONLY_SCOPE}");
    let mut url = url::Url::parse(AUTH_URL).expect("static URL is valid");
    url.query_pairs_mut()
        .append_pair("client_id", &secrets.client_id)
        .append_pair("redirect_uri", &redirect_uri(port))
        .append_pair("response_type", "code")
        .append_pair("scope", &scopes)
        .append_pair("access_type", "offline")
        .append_pair("prompt", "consent");
    url.to_string()
}

/// Run the full OAuth2 flow: open browser -> listen for callback ->
/// exchange code -> persist tokens to `token_path`.
pub async fn authorize(
    secrets: &ClientSecrets,
    port: u16,
    token_path: &Path,
) -> Result<OAuthTokens, OAuthError> {
    open::that(auth_url(secrets, port))
        .map_err(|e| OAuthError::AuthorizationFailed(e.to_string()))?;

    let listener = TcpListener::bind(format!("127.0.0.1:{port}"))
        .map_err(|e| OAuthError::AuthorizationFailed(e.to_string()))?;
    let (mut stream, _) = listener
        .accept()
        .map_err(|e| OAuthError::AuthorizationFailed(e.to_string()))?;
    let mut buf = [0u8; 4096];
    let n = stream.read(&mut buf)?;
    let request = String::from_utf8_lossy(&buf[..n]);

    let code = extract_code(&request)
        .ok_or_else(|| OAuthError::InvalidCallback("no code parameter in callback".into()))?;

    let response = "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n<html><body><h2>Authentication successful!</h2><p>You can close this tab.</p></body></html>";
    stream.write_all(response.as_bytes())?;
    drop(stream);
    drop(listener);

    let tokens = exchange_code(secrets, &code, port).await?;
    save_tokens(token_path, &tokens)?;
    Ok(tokens)
}

/// Exchange an authorization code for tokens.
async fn exchange_code(
    secrets: &ClientSecrets,
    code: &str,
    port: u16,
) -> Result<OAuthTokens, OAuthError> {
    let params = [
        ("client_id", secrets.client_id.as_str()),
        ("client_secret", secrets.client_secret.as_str()),
        ("code", code),
        ("grant_type", "authorization_code"),
        ("redirect_uri", &redirect_uri(port)),
    ];
    let body = post_token_request(&params)
        .await
        .map_err(OAuthError::TokenExchangeFailed)?;
    Ok(tokens_from_response(&body, None))
}

/// Refresh an access token and persist the refreshed tokens.
pub async fn refresh_tokens(
    secrets: &ClientSecrets,
    refresh: &str,
    token_path: &Path,
) -> Result<OAuthTokens, OAuthError> {
    let params = [
        ("client_id", secrets.client_id.as_str()),
        ("client_secret", secrets.client_secret.as_str()),
        ("refresh_token", refresh),
        ("grant_type", "refresh_token"),
    ];
    let body = post_token_request(&params)
        .await
        .map_err(OAuthError::TokenRefreshFailed)?;
    let tokens = tokens_from_response(&body, Some(refresh));
    save_tokens(token_path, &tokens)?;
    Ok(tokens)
}

async fn post_token_request(params: &[(&str, &str)]) -> Result<serde_json::Value, String> {
    let resp = Client::new()
        .post(TOKEN_URL)
        .form(params)
        .send()
        .await
        .map_err(|e| e.to_string())?;
    let body: serde_json::Value = resp.json().await.map_err(|e| e.to_string())?;
    if let Some(error) = body.get("error") {
        return Err(error.to_string());
    }
    Ok(body)
}

fn tokens_from_response(body: &serde_json::Value, prior_refresh: Option<&str>) -> OAuthTokens {
    let expires_in = body.get("expires_in").and_then(|v| v.as_i64());
    OAuthTokens {
        access_token: body["access_token"].as_str().unwrap_or_default().to_string(),
        refresh_token: body
            .get("refresh_token")
            .and_then(|v| v.as_str())
            .map(String::from)
            .or_else(|| prior_refresh.map(String::from)),
        expires_at: expires_in.map(|ei| chrono::Utc::now().timestamp() + ei),
        token_type: body["token_type"].as_str().unwrap_or("Bearer").to_string(),
        scope: body.get("scope").and_then(|v| v.as_str()).map(String::from),
    }
}

/// Load stored tokens, if any.
pub fn load_tokens(token_path: &Path) -> Option<OAuthTokens> {
    let content = std::fs::read_to_string(token_path).ok()?;
    serde_json::from_str(&content).ok()
}

/// Persist tokens (write-to-temp then rename).
pub fn save_tokens(token_path: &Path, tokens: &OAuthTokens) -> Result<(), OAuthError> {
    let content = serde_json::to_string_pretty(tokens)
        .map_err(|e| OAuthError::TokenExchangeFailed(e.to_string()))?;
    let tmp = token_path.with_extension("json.tmp");
    std::fs::write(&tmp, content)?;
    std::fs::rename(&tmp, token_path)?;
    Ok(())
}

/// Whether stored tokens are expired (with a 60s buffer).
pub fn is_expired(tokens: &OAuthTokens) -> bool {
    match tokens.expires_at {
        Some(exp) => chrono::Utc::now().timestamp() > exp - 60,
        None => false,
    }
}

/// Return a valid access token for the project, refreshing if expired.
pub async fn access_token(
    secrets: &ClientSecrets,
    token_path: &Path,
) -> Result<String, OAuthError> {
    let tokens = load_tokens(token_path).ok_or_else(|| {
        OAuthError::AuthorizationFailed("no stored token; run the auth flow first".into())
    })?;

    if !is_expired(&tokens) {
        return Ok(tokens.access_token);
    }

    let refresh = tokens.refresh_token.as_deref().ok_or(OAuthError::TokenExpired)?;
    let refreshed = refresh_tokens(secrets, refresh, token_path).await?;
    Ok(refreshed.access_token)
}

fn extract_code(request: &str) -> Option<String> {
    let first_line = request.lines().next()?;
    let path = first_line.split_whitespace().nth(1)?;
    let url = url::Url::parse(&format!("http://localhost{path}")).ok()?;
    url.query_pairs()
        .find(|(k, _)| k == "code")
        .map(|(_, v)| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn extract_code_from_callback_request() {
        let request = "GET /callback?code=4/abc-DEF_123&scope=youtube HTTP/1.1\r\nHost: localhost\r\n\r\n";
        assert_eq!(extract_code(request).as_deref(), Some("4/abc-DEF_123"));
        assert_eq!(extract_code("GET /callback?error=access_denied HTTP/1.1"), None);
        assert_eq!(extract_code(""), None);
    }

    #[test]
    fn client_secrets_accepts_installed_and_web() {
        let dir = TempDir::new().unwrap();
        let installed = dir.path().join("installed.json");
        std::fs::write(
            &installed,
            r#"{"installed": {"client_id": "id1", "client_secret": "sec1", "auth_uri": "x"}}"#,
        )
        .unwrap();
        let s = ClientSecrets::from_file(&installed).unwrap();
        assert_eq!(s.client_id, "id1");
        assert_eq!(s.client_secret, "sec1");

        let web = dir.path().join("web.json");
        std::fs::write(
            &web,
            r#"{"web": {"client_id": "id2", "client_secret": "sec2"}}"#,
        )
        .unwrap();
        assert_eq!(ClientSecrets::from_file(&web).unwrap().client_id, "id2");

        let bare = dir.path().join("bare.json");
        std::fs::write(&bare, r#"{"client_id": "x"}"#).unwrap();
        assert!(ClientSecrets::from_file(&bare).is_err());
    }

    #[test]
    fn token_save_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("demo.token.json");
        let tokens = OAuthTokens {
            access_token: "at".into(),
            refresh_token: Some("rt".into()),
            expires_at: Some(1_900_000_000),
            token_type: "Bearer".into(),
            scope: None,
        };
        save_tokens(&path, &tokens).unwrap();
        assert!(!path.with_extension("json.tmp").exists());

        let loaded = load_tokens(&path).unwrap();
        assert_eq!(loaded.access_token, "at");
        assert_eq!(loaded.refresh_token.as_deref(), Some("rt"));
    }

    #[test]
    fn expiry_check_uses_buffer() {
        let now = chrono::Utc::now().timestamp();
        let fresh = OAuthTokens {
            access_token: "at".into(),
            refresh_token: None,
            expires_at: Some(now + 3600),
            token_type: "Bearer".into(),
            scope: None,
        };
        assert!(!is_expired(&fresh));

        let expiring = OAuthTokens {
            expires_at: Some(now + 30),
            ..fresh.clone()
        };
        assert!(is_expired(&expiring));

        let no_expiry = OAuthTokens {
            expires_at: None,
            ..fresh
        };
        assert!(!is_expired(&no_expiry));
    }

    #[test]
    fn auth_url_carries_offline_scope_params() {
        let secrets = ClientSecrets {
            client_id: "my-id".into(),
            client_secret: "sec".into(),
        };
        let url = auth_url(&secrets, 17653);
        assert!(url.starts_with(AUTH_URL));
        assert!(url.contains("client_id=my-id"));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("17653%2Fcallback") || url.contains("17653/callback"));
    }
}
