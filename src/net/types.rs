//! Wire types shared by the gateway and the auth API.

use serde::{Deserialize, Serialize};

use super::error::RequestError;

/// Response envelope used by every bench-hub endpoint. `code == 0` is
/// success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Unwrap the payload, turning a non-zero code into `RequestError::Api`.
    ///
    /// # Errors
    ///
    /// Returns `Api` when `code` is non-zero.
    pub fn into_data(self) -> Result<Option<T>, RequestError> {
        if self.code != 0 {
            return Err(RequestError::Api { code: self.code, message: self.message });
        }
        Ok(self.data)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginData {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub user: Option<User>,
}

/// Console user as returned by the login endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub created_at: String,
}
