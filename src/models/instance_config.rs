//! Ordered key/value configuration written into each instance.

use serde::Deserialize;

use super::identity::SessionIdentity;

/// Fixed operational defaults merged with the session identity.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct InstanceDefaults {
    /// Work mode of the instance (`private` or `public`).
    #[serde(default = "default_worktype")]
    pub worktype: String,
    /// Command prefix pattern recognized by the runtime.
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// IANA timezone name.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Display name of the owner.
    #[serde(default = "default_owner_name")]
    pub owner_name: String,
    /// Display name of the bot.
    #[serde(default = "default_bot_name")]
    pub bot_name: String,
}

fn default_worktype() -> String {
    "private".into()
}

fn default_prefix() -> String {
    "[.!?]".into()
}

fn default_timezone() -> String {
    "Africa/Lagos".into()
}

fn default_owner_name() -> String {
    "Mirage".into()
}

fn default_bot_name() -> String {
    "Kord".into()
}

impl Default for InstanceDefaults {
    fn default() -> Self {
        Self {
            worktype: default_worktype(),
            prefix: default_prefix(),
            timezone: default_timezone(),
            owner_name: default_owner_name(),
            bot_name: default_bot_name(),
        }
    }
}

/// Insertion-ordered mapping of configuration keys to values.
///
/// Setting an existing key replaces its value in place, keeping the
/// original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstanceConfig {
    entries: Vec<(String, String)>,
}

impl InstanceConfig {
    /// Empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Standard configuration for a resolved identity.
    ///
    /// Keys, in order: `SESSION_ID`, `OWNER_NUMBER`, `WORKTYPE`, `PREFIX`,
    /// `TIMEZONE`, `OWNER_NAME`, `BOT_NAME`.
    #[must_use]
    pub fn for_identity(identity: &SessionIdentity, defaults: &InstanceDefaults) -> Self {
        let mut config = Self::new();
        config.set("SESSION_ID", identity.session_token());
        config.set("OWNER_NUMBER", identity.owner_number());
        config.set("WORKTYPE", &defaults.worktype);
        config.set("PREFIX", &defaults.prefix);
        config.set("TIMEZONE", &defaults.timezone);
        config.set("OWNER_NAME", &defaults.owner_name);
        config.set("BOT_NAME", &defaults.bot_name);
        config
    }

    /// Insert or replace a key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// Look up a value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the configuration has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
