//! Credential kinds and their trust levels

use serde::{Deserialize, Serialize};

use crate::constants::{APP_TOKEN_SLOT, REFRESH_TOKEN_SLOT, USER_TOKEN_SLOT};
use crate::impl_label_conversions;

/// How carefully a credential must be stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sensitivity {
    /// General-purpose storage is acceptable
    Low,
    /// Requires the secure backend when one is available
    High,
}

impl_label_conversions!(Sensitivity {
    Low => "low",
    High => "high",
});

/// The three credentials the client manages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    /// Application identity; opaque, never expiry-checked
    AppToken,
    /// User identity; signed and expiry-bearing
    UserToken,
    /// Exchanged for a new user token without re-authentication
    RefreshToken,
}

impl_label_conversions!(CredentialKind {
    AppToken => "app_token",
    UserToken => "user_token",
    RefreshToken => "refresh_token",
});

impl CredentialKind {
    /// Every credential kind, in clearing order
    pub const ALL: [Self; 3] = [Self::AppToken, Self::UserToken, Self::RefreshToken];

    /// Storage slot name for this credential
    #[must_use]
    pub const fn slot(self) -> &'static str {
        match self {
            Self::AppToken => APP_TOKEN_SLOT,
            Self::UserToken => USER_TOKEN_SLOT,
            Self::RefreshToken => REFRESH_TOKEN_SLOT,
        }
    }

    #[must_use]
    pub const fn sensitivity(self) -> Sensitivity {
        match self {
            Self::AppToken => Sensitivity::Low,
            Self::UserToken | Self::RefreshToken => Sensitivity::High,
        }
    }
}
