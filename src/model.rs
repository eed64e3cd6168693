//! Read-only projection of the server configuration.
//!
//! Everything here is deserialized from the configuration endpoint and
//! replaced wholesale on every refresh. Nothing in the UI edits these values
//! in place.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Account role, ordered by privilege.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
    Owner,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::Owner => "owner",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    pub role: Role,
    #[serde(default)]
    pub banned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled_apis: Option<Vec<String>>,
}

impl User {
    pub fn tags(&self) -> &[String] {
        self.tags.as_deref().unwrap_or(&[])
    }

    pub fn enabled_apis(&self) -> &[String] {
        self.enabled_apis.as_deref().unwrap_or(&[])
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags().iter().any(|t| t == name)
    }
}

/// A named permission bucket ("tag"). No sources means unrestricted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserGroup {
    pub name: String,
    #[serde(default)]
    pub enabled_apis: Vec<String>,
}

impl UserGroup {
    pub fn is_unrestricted(&self) -> bool {
        self.enabled_apis.is_empty()
    }

    /// Short label for tables and pickers: "3 sources" or "unrestricted".
    pub fn sources_label(&self) -> String {
        match self.enabled_apis.len() {
            0 => "unrestricted".to_string(),
            1 => "1 source".to_string(),
            n => format!("{n} sources"),
        }
    }
}

/// A video source offered by the site, used to populate source pickers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSource {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub api: String,
    #[serde(default)]
    pub disabled: bool,
}

impl ApiSource {
    /// `name (host)` for display; the raw api string when it is not a URL.
    pub fn display_label(&self) -> String {
        format!("{} ({})", self.name, extract_domain(&self.api))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserConfig {
    #[serde(default)]
    pub allow_register: bool,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub tags: Vec<UserGroup>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ConfigSnapshot {
    #[serde(default)]
    pub user_config: UserConfig,
    #[serde(default)]
    pub source_config: Vec<ApiSource>,
}

impl ConfigSnapshot {
    pub fn find_user(&self, username: &str) -> Option<&User> {
        self.user_config
            .users
            .iter()
            .find(|u| u.username == username)
    }

    pub fn find_group(&self, name: &str) -> Option<&UserGroup> {
        self.user_config.tags.iter().find(|g| g.name == name)
    }

    /// Users currently tagged with `group`, in snapshot order.
    pub fn users_in_group(&self, group: &str) -> Vec<&User> {
        self.user_config
            .users
            .iter()
            .filter(|u| u.has_tag(group))
            .collect()
    }
}

/// Host part of a URL, or the input unchanged when it does not parse.
pub fn extract_domain(url: &str) -> String {
    match reqwest::Url::parse(url) {
        Ok(parsed) => parsed
            .host_str()
            .map(str::to_string)
            .unwrap_or_else(|| url.to_string()),
        Err(_) => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_parses_wire_casing() {
        let raw = r#"{
            "UserConfig": {
                "AllowRegister": true,
                "Users": [
                    {"username": "root", "role": "owner"},
                    {"username": "alice", "role": "user", "tags": ["vip"], "enabledApis": ["a"], "banned": true}
                ],
                "Tags": [{"name": "vip", "enabledApis": ["a", "b"]}, {"name": "free"}]
            }
        }"#;
        let snap: ConfigSnapshot = serde_json::from_str(raw).unwrap();
        assert!(snap.user_config.allow_register);
        assert_eq!(snap.user_config.users.len(), 2);
        let alice = snap.find_user("alice").unwrap();
        assert!(alice.banned);
        assert_eq!(alice.tags(), ["vip".to_string()]);
        assert_eq!(alice.enabled_apis(), ["a".to_string()]);
        assert!(snap.find_group("free").unwrap().is_unrestricted());
        assert!(snap.source_config.is_empty());
    }

    #[test]
    fn sources_label_counts() {
        let g = UserGroup { name: "g".into(), enabled_apis: vec![] };
        assert_eq!(g.sources_label(), "unrestricted");
        let g = UserGroup { name: "g".into(), enabled_apis: vec!["a".into(), "b".into()] };
        assert_eq!(g.sources_label(), "2 sources");
    }

    #[test]
    fn extract_domain_falls_back_to_input() {
        assert_eq!(extract_domain("https://api.example.com/v1/list"), "api.example.com");
        assert_eq!(extract_domain("not a url"), "not a url");
    }
}
