//! Configuration types for the assistant.
//!
//! This module provides CLI argument parsing via `arrrg` and the resolved
//! configuration the binary runs with. Values come from command-line flags,
//! then the environment, then defaults.

use std::path::PathBuf;

use arrrg_derive::CommandLine;

use crate::cache::LocalCache;
use crate::chat::prompt::DEFAULT_MODEL;

/// Environment variable holding the model API key.
pub const API_KEY_VAR: &str = "API_KEY";

/// Fallback environment variable for the model API key.
pub const FALLBACK_API_KEY_VAR: &str = "GEMINI_API_KEY";

/// Environment variable holding the persistence service base URL.
pub const BACKEND_URL_VAR: &str = "BACKEND_URL";

/// Persistence service used when nothing else is configured.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3001";

/// Command-line arguments for the techreq-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Model to use for chat.
    #[arrrg(optional, "Model to use (default: gemini-2.5-flash)", "MODEL")]
    pub model: Option<String>,

    /// Base URL of the persistence service.
    #[arrrg(optional, "Persistence service URL (default: $BACKEND_URL or http://localhost:3001)", "URL")]
    pub backend_url: Option<String>,

    /// Directory for the local transcript cache.
    #[arrrg(optional, "Directory for the local chat history cache", "DIR")]
    pub cache_dir: Option<String>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Resolved configuration for one run of the assistant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantConfig {
    /// The model to use for generating responses.
    pub model: String,

    /// Credential for the model provider. `None` fails session start.
    pub api_key: Option<String>,

    /// Base URL of the persistence service.
    pub backend_url: String,

    /// Directory holding the local transcript cache.
    pub cache_dir: PathBuf,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl AssistantConfig {
    /// Creates a config with default values and no API key.
    pub fn new() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            cache_dir: LocalCache::default_dir(),
            use_color: true,
        }
    }

    /// Resolves a config from arguments and an environment lookup.
    ///
    /// Flags win over the environment, which wins over defaults. Blank
    /// environment values count as unset.
    pub fn resolve(args: ChatArgs, env: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |name: &str| env(name).filter(|value| !value.trim().is_empty());
        let api_key = lookup(API_KEY_VAR).or_else(|| lookup(FALLBACK_API_KEY_VAR));
        let backend_url = args
            .backend_url
            .or_else(|| lookup(BACKEND_URL_VAR))
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());

        let mut config = Self::new()
            .with_api_key(api_key)
            .with_backend_url(backend_url);
        if let Some(model) = args.model {
            config = config.with_model(model);
        }
        if let Some(dir) = args.cache_dir {
            config = config.with_cache_dir(PathBuf::from(dir));
        }
        if args.no_color {
            config = config.without_color();
        }
        config
    }

    /// Resolves a config from arguments and the process environment.
    pub fn from_env(args: ChatArgs) -> Self {
        Self::resolve(args, |name| std::env::var(name).ok())
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the API key.
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    /// Sets the persistence service base URL.
    pub fn with_backend_url(mut self, backend_url: impl Into<String>) -> Self {
        self.backend_url = backend_url.into();
        self
    }

    /// Sets the cache directory.
    pub fn with_cache_dir(mut self, cache_dir: PathBuf) -> Self {
        self.cache_dir = cache_dir;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn default_config() {
        let config = AssistantConfig::new();
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.backend_url, "http://localhost:3001");
        assert!(config.api_key.is_none());
        assert!(config.use_color);
    }

    #[test]
    fn resolve_with_empty_environment() {
        let config = AssistantConfig::resolve(ChatArgs::default(), env_of(&[]));
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.backend_url, DEFAULT_BACKEND_URL);
        assert_eq!(config.api_key, None);
        assert_eq!(config.cache_dir, LocalCache::default_dir());
    }

    #[test]
    fn api_key_prefers_primary_variable() {
        let config = AssistantConfig::resolve(
            ChatArgs::default(),
            env_of(&[("API_KEY", "primary"), ("GEMINI_API_KEY", "fallback")]),
        );
        assert_eq!(config.api_key.as_deref(), Some("primary"));

        let config = AssistantConfig::resolve(
            ChatArgs::default(),
            env_of(&[("API_KEY", "  "), ("GEMINI_API_KEY", "fallback")]),
        );
        assert_eq!(config.api_key.as_deref(), Some("fallback"));
    }

    #[test]
    fn flags_win_over_environment() {
        let args = ChatArgs {
            model: Some("gemini-2.5-pro".to_string()),
            backend_url: Some("http://flag:9000".to_string()),
            cache_dir: Some("/tmp/techreq-test".to_string()),
            no_color: true,
        };
        let config =
            AssistantConfig::resolve(args, env_of(&[("BACKEND_URL", "http://env:8000")]));
        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(config.backend_url, "http://flag:9000");
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/techreq-test"));
        assert!(!config.use_color);
    }

    #[test]
    fn environment_wins_over_default() {
        let config = AssistantConfig::resolve(
            ChatArgs::default(),
            env_of(&[("BACKEND_URL", "http://env:8000")]),
        );
        assert_eq!(config.backend_url, "http://env:8000");
    }

    #[test]
    fn config_builder_pattern() {
        let config = AssistantConfig::new()
            .with_model("custom")
            .with_api_key(Some("k".to_string()))
            .with_backend_url("http://b")
            .with_cache_dir(PathBuf::from("c"))
            .without_color();
        assert_eq!(config.model, "custom");
        assert_eq!(config.api_key.as_deref(), Some("k"));
        assert_eq!(config.backend_url, "http://b");
        assert_eq!(config.cache_dir, PathBuf::from("c"));
        assert!(!config.use_color);
    }
}
