//! Identity-provider client
//!
//! User accounts, sessions, and profile data live entirely in a third-party
//! identity provider. This module covers the one lookup the services need:
//! resolving an opaque user id to a display nickname and avatar URL.
//!
//! Profile lookups are display enrichment only. Callers that render reviews
//! use [`profile_or_anonymous`], which recovers every failure into the
//! `"Anonymous"` placeholder so a provider outage never breaks a read path.

use crate::errors::{AppError, Result};
use crate::ANONYMOUS_NICKNAME;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Display profile resolved from the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub nickname: String,
    pub profile_image_url: String,
}

impl UserProfile {
    /// The placeholder profile substituted when a lookup fails
    pub fn anonymous() -> Self {
        Self {
            nickname: ANONYMOUS_NICKNAME.to_string(),
            profile_image_url: String::new(),
        }
    }
}

/// Seam for profile lookups, so services can be exercised without the
/// real provider
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve a user id to a display profile
    async fn fetch_profile(&self, user_id: &str) -> Result<UserProfile>;
}

/// Fetch a profile, degrading to the Anonymous placeholder on any failure
pub async fn profile_or_anonymous(provider: &dyn IdentityProvider, user_id: &str) -> UserProfile {
    match provider.fetch_profile(user_id).await {
        Ok(profile) => profile,
        Err(e) => {
            tracing::warn!(
                user_id = %user_id,
                error = %e,
                "Identity lookup failed, using Anonymous placeholder"
            );
            UserProfile::anonymous()
        }
    }
}

/// Provider-native user record
#[derive(Debug, Deserialize)]
struct ProviderUser {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    profile_image_url: Option<String>,
}

impl ProviderUser {
    /// Nickname precedence: username, then first name, then Anonymous
    fn nickname(&self) -> String {
        self.username
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.first_name.as_deref().filter(|s| !s.is_empty()))
            .unwrap_or(ANONYMOUS_NICKNAME)
            .to_string()
    }
}

/// HTTP client for the identity provider's management API
#[derive(Clone)]
pub struct IdentityClient {
    http: reqwest::Client,
    base_url: String,
    secret_key: Option<String>,
}

impl IdentityClient {
    /// Create a new client from configuration
    pub fn new(config: &crate::config::IdentityConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to build identity HTTP client: {}", e),
            })?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            secret_key: config.secret_key.clone(),
        })
    }
}

#[async_trait]
impl IdentityProvider for IdentityClient {
    async fn fetch_profile(&self, user_id: &str) -> Result<UserProfile> {
        let url = format!("{}/users/{}", self.base_url, user_id);

        let mut request = self.http.get(&url);
        if let Some(ref key) = self.secret_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| AppError::Identity {
            message: format!("Request failed: {}", e),
        })?;

        if !response.status().is_success() {
            return Err(AppError::Identity {
                message: format!("API error {}", response.status()),
            });
        }

        let user: ProviderUser = response.json().await.map_err(|e| AppError::Identity {
            message: format!("Failed to parse response: {}", e),
        })?;

        Ok(UserProfile {
            nickname: user.nickname(),
            profile_image_url: user.profile_image_url.clone().unwrap_or_default(),
        })
    }
}

/// In-memory provider for tests: fixed profiles, optional forced failure
pub struct MockIdentity {
    profiles: std::collections::HashMap<String, UserProfile>,
    fail_all: bool,
}

impl MockIdentity {
    pub fn new() -> Self {
        Self {
            profiles: std::collections::HashMap::new(),
            fail_all: false,
        }
    }

    /// A provider whose every lookup fails
    pub fn failing() -> Self {
        Self {
            profiles: std::collections::HashMap::new(),
            fail_all: true,
        }
    }

    pub fn with_profile(mut self, user_id: &str, nickname: &str, avatar: &str) -> Self {
        self.profiles.insert(
            user_id.to_string(),
            UserProfile {
                nickname: nickname.to_string(),
                profile_image_url: avatar.to_string(),
            },
        );
        self
    }
}

impl Default for MockIdentity {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for MockIdentity {
    async fn fetch_profile(&self, user_id: &str) -> Result<UserProfile> {
        if self.fail_all {
            return Err(AppError::Identity {
                message: "mock failure".to_string(),
            });
        }

        self.profiles
            .get(user_id)
            .cloned()
            .ok_or_else(|| AppError::Identity {
                message: format!("unknown user {}", user_id),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nickname_prefers_username() {
        let user = ProviderUser {
            username: Some("bookworm".into()),
            first_name: Some("Alex".into()),
            profile_image_url: None,
        };
        assert_eq!(user.nickname(), "bookworm");
    }

    #[test]
    fn test_nickname_falls_back_to_first_name() {
        let user = ProviderUser {
            username: None,
            first_name: Some("Alex".into()),
            profile_image_url: None,
        };
        assert_eq!(user.nickname(), "Alex");
    }

    #[test]
    fn test_nickname_falls_back_to_anonymous() {
        let user = ProviderUser {
            username: Some(String::new()),
            first_name: None,
            profile_image_url: None,
        };
        assert_eq!(user.nickname(), ANONYMOUS_NICKNAME);
    }

    #[tokio::test]
    async fn test_profile_or_anonymous_recovers_failure() {
        let provider = MockIdentity::failing();
        let profile = profile_or_anonymous(&provider, "user_1").await;
        assert_eq!(profile, UserProfile::anonymous());
    }

    #[tokio::test]
    async fn test_profile_or_anonymous_passes_through() {
        let provider = MockIdentity::new().with_profile("user_1", "bookworm", "a.jpg");
        let profile = profile_or_anonymous(&provider, "user_1").await;
        assert_eq!(profile.nickname, "bookworm");
        assert_eq!(profile.profile_image_url, "a.jpg");
    }
}
