use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HostFamily {
    #[default]
    #[serde(rename = "fabric")]
    Fabric,
    #[serde(rename = "powerbi")]
    PowerBi,
}

impl HostFamily {
    pub fn as_str(self) -> &'static str {
        match self {
            HostFamily::Fabric => "fabric",
            HostFamily::PowerBi => "powerbi",
        }
    }
}

impl fmt::Display for HostFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CredentialKind {
    #[default]
    #[serde(rename = "spn")]
    ServicePrincipal,
    #[serde(rename = "user")]
    User,
}

impl CredentialKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CredentialKind::ServicePrincipal => "spn",
            CredentialKind::User => "user",
        }
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
