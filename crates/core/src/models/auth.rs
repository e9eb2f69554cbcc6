use serde::{Deserialize, Serialize};

/// Access/refresh credential pair held in memory by the API client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Body of a successful login or token refresh.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(rename = "rol", default)]
    pub role: Option<String>,
}

impl LoginResponse {
    pub fn token_pair(&self) -> TokenPair {
        TokenPair {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
        }
    }
}

/// Session state persisted in durable local storage across app restarts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub role: Option<String>,
}

impl StoredSession {
    pub fn tokens(&self) -> Option<TokenPair> {
        Some(TokenPair {
            access_token: self.access_token.clone()?,
            refresh_token: self.refresh_token.clone()?,
        })
    }
}
