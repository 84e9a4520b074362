use crate::client::audience::{CredentialKind, HostFamily};
use crate::errors::ClientError;
use async_trait::async_trait;
use std::collections::HashMap;

#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn token(&self, host: HostFamily, credential: CredentialKind)
        -> Result<String, ClientError>;
}

#[derive(Debug, Clone, Default)]
pub struct StaticTokenProvider {
    tokens: HashMap<(HostFamily, CredentialKind), String>,
}

impl StaticTokenProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn uniform(token: &str) -> Self {
        let mut provider = Self::new();
        for host in [HostFamily::Fabric, HostFamily::PowerBi] {
            for credential in [CredentialKind::ServicePrincipal, CredentialKind::User] {
                provider = provider.with_token(host, credential, token);
            }
        }
        provider
    }

    pub fn with_token(mut self, host: HostFamily, credential: CredentialKind, token: &str) -> Self {
        self.tokens.insert((host, credential), token.to_string());
        self
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn token(
        &self,
        host: HostFamily,
        credential: CredentialKind,
    ) -> Result<String, ClientError> {
        self.tokens
            .get(&(host, credential))
            .cloned()
            .ok_or_else(|| {
                ClientError::authentication(format!(
                    "No token configured for {} ({})",
                    host, credential
                ))
            })
    }
}

/// Reads `FABRICOPS_<HOST>_<CREDENTIAL>_TOKEN`, e.g. `FABRICOPS_FABRIC_SPN_TOKEN`.
#[derive(Debug, Clone)]
pub struct EnvTokenProvider {
    prefix: String,
}

impl EnvTokenProvider {
    pub fn new() -> Self {
        Self::with_prefix("FABRICOPS")
    }

    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            prefix: prefix.trim_end_matches('_').to_string(),
        }
    }

    pub fn variable_name(&self, host: HostFamily, credential: CredentialKind) -> String {
        format!(
            "{}_{}_{}_TOKEN",
            self.prefix,
            host.as_str().to_uppercase(),
            credential.as_str().to_uppercase()
        )
    }
}

impl Default for EnvTokenProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenProvider for EnvTokenProvider {
    async fn token(
        &self,
        host: HostFamily,
        credential: CredentialKind,
    ) -> Result<String, ClientError> {
        let name = self.variable_name(host, credential);
        std::env::var(&name)
            .map(|value| value.trim().to_string())
            .map_err(|_| {
                ClientError::authentication(format!("Failed to retrieve token for {}", host))
                    .with_hint(format!("Set {} to a valid bearer token.", name))
            })
    }
}
