use crate::constants::{PASSWORD_LEN, USERNAME_SUFFIX_LEN};
use crate::random::RandomSource;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Credentials of a user registered by the journey, plus the token `/auth` handed back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl UserRecord {
    /// Fresh `user_<unix-millis>_<suffix>` name and random password, no token yet.
    pub fn generate(random: &dyn RandomSource) -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();

        Self {
            username: format!("user_{millis}_{}", random.alphanumeric(USERNAME_SUFFIX_LEN)),
            password: random.alphanumeric(PASSWORD_LEN),
            token: None,
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    /// Token to present as `Authorization: Bearer ...`. Empty when registration never produced one.
    pub fn bearer(&self) -> &str {
        self.token.as_deref().unwrap_or_default()
    }
}

/// Body of `POST /auth`.
#[derive(Debug, Serialize)]
pub(crate) struct Credentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

impl<'a> From<&'a UserRecord> for Credentials<'a> {
    fn from(user: &'a UserRecord) -> Self {
        Self {
            username: &user.username,
            password: &user.password,
        }
    }
}

/// The only part of the `/auth` answer the journey looks at.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct AuthResponse {
    #[serde(default)]
    pub token: Option<String>,
}

/// Body of `POST /sendCoin`. The whole recipient record is sent, not just its name.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TransferRequest<'a> {
    pub to_user: &'a UserRecord,
    pub amount: u32,
}
