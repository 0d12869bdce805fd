//! Container configuration.
//!
//! [`ContainerOptions`] carries the settings a container is built with. They
//! can be written in code, read from any [`ConfigSource`] (the process
//! environment being the built-in one) or, with the `config` feature, parsed
//! from JSON.

use std::env;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::error::DiResult;
use crate::lifetime::LifetimeScope;

/// A flat key/value source of configuration strings.
pub trait ConfigSource: Send + Sync {
    /// Raw value for a lowercase key such as `name` or `default_scope`.
    fn get(&self, key: &str) -> Option<String>;
}

/// Environment variable configuration source
///
/// Keys are uppercased and joined to the prefix with `_`, so
/// `EnvironmentConfigSource::with_prefix("APP").get("default_scope")` reads
/// `APP_DEFAULT_SCOPE`.
#[derive(Debug, Default)]
pub struct EnvironmentConfigSource {
    prefix: Option<String>,
}

impl EnvironmentConfigSource {
    pub fn new() -> Self {
        Self { prefix: None }
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }

    fn env_key(&self, key: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}_{}", prefix.to_uppercase(), key.to_uppercase()),
            None => key.to_uppercase(),
        }
    }
}

impl ConfigSource for EnvironmentConfigSource {
    fn get(&self, key: &str) -> Option<String> {
        env::var(self.env_key(key)).ok()
    }
}

/// Settings a container is created with.
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{Container, ContainerOptions, LifetimeScope};
///
/// let options = ContainerOptions {
///     name: Some("workers".to_string()),
///     default_lifetime_scope: LifetimeScope::ContainerManaged,
/// };
/// let container = Container::with_options(options);
/// assert_eq!(container.name(), "workers");
/// assert_eq!(container.default_lifetime_scope(), LifetimeScope::ContainerManaged);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ContainerOptions {
    /// Label used in log events and debug output
    pub name: Option<String>,
    /// Lifetime for factories registered without an explicit scope
    pub default_lifetime_scope: LifetimeScope,
}

impl ContainerOptions {
    pub const DEFAULT_NAME: &'static str = "root";

    /// Reads `name` and `default_scope` from a source; missing keys keep their defaults.
    pub fn load(source: &dyn ConfigSource) -> DiResult<Self> {
        let mut options = ContainerOptions::default();
        if let Some(name) = source.get("name") {
            let name = name.trim();
            if !name.is_empty() {
                options.name = Some(name.to_string());
            }
        }
        if let Some(scope) = source.get("default_scope") {
            options.default_lifetime_scope = scope.parse()?;
        }
        Ok(options)
    }

    /// Reads `<PREFIX>_NAME` and `<PREFIX>_DEFAULT_SCOPE` from the environment.
    pub fn from_env(prefix: &str) -> DiResult<Self> {
        Self::load(&EnvironmentConfigSource::with_prefix(prefix))
    }

    /// Parses options from JSON, e.g.
    /// `{"name": "app", "default_lifetime_scope": "ContainerManaged"}`.
    #[cfg(feature = "config")]
    pub fn from_json_str(json: &str) -> DiResult<Self> {
        serde_json::from_str(json).map_err(|e| crate::error::DiError::InvalidConfig(e.to_string()))
    }

    /// Effective container name.
    pub fn name_or_default(&self) -> &str {
        self.name.as_deref().unwrap_or(Self::DEFAULT_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiError;
    use std::collections::HashMap;

    struct MapSource(HashMap<&'static str, &'static str>);

    impl ConfigSource for MapSource {
        fn get(&self, key: &str) -> Option<String> {
            self.0.get(key).map(|v| v.to_string())
        }
    }

    #[test]
    fn test_load_from_source() {
        let source = MapSource(HashMap::from([("name", " api "), ("default_scope", "Container")]));
        let options = ContainerOptions::load(&source).unwrap();
        assert_eq!(options.name.as_deref(), Some("api"));
        assert_eq!(options.default_lifetime_scope, LifetimeScope::ContainerManaged);
    }

    #[test]
    fn test_load_defaults_when_missing() {
        let options = ContainerOptions::load(&MapSource(HashMap::new())).unwrap();
        assert_eq!(options, ContainerOptions::default());
        assert_eq!(options.name_or_default(), "root");
        assert_eq!(options.default_lifetime_scope, LifetimeScope::InvokeManaged);
    }

    #[test]
    fn test_load_rejects_bad_scope() {
        let source = MapSource(HashMap::from([("default_scope", "forever")]));
        assert!(matches!(ContainerOptions::load(&source), Err(DiError::InvalidConfig(_))));
    }

    #[test]
    fn test_env_key_format() {
        let source = EnvironmentConfigSource::with_prefix("app");
        assert_eq!(source.env_key("default_scope"), "APP_DEFAULT_SCOPE");
        assert_eq!(EnvironmentConfigSource::new().env_key("name"), "NAME");
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_json_options() {
        let options =
            ContainerOptions::from_json_str(r#"{"name": "jobs", "default_lifetime_scope": "ContainerManaged"}"#).unwrap();
        assert_eq!(options.name.as_deref(), Some("jobs"));
        assert_eq!(options.default_lifetime_scope, LifetimeScope::ContainerManaged);

        let partial = ContainerOptions::from_json_str("{}").unwrap();
        assert_eq!(partial, ContainerOptions::default());

        assert!(matches!(
            ContainerOptions::from_json_str(r#"{"default_lifetime_scope": "Forever"}"#),
            Err(DiError::InvalidConfig(_))
        ));
    }
}
