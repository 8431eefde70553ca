//! Environment toggles and their precedence over config flags
//!
//! Environment variables always win. When a config flag disagrees with a
//! set environment variable the config value is dropped and a warning is
//! recorded.

use super::schema::FlagsConfig;
use std::collections::HashMap;

/// Production-mode detector
pub const ENV_MODE: &str = "KILN_ENV";
/// Spare the downloaded-asset cache on purge
pub const ENV_PRESERVE_DOWNLOAD_CACHE: &str = "KILN_PRESERVE_DOWNLOAD_CACHE";
/// Spare the compiler cache on purge
pub const ENV_PRESERVE_COMPILER_CACHE: &str = "KILN_PRESERVE_COMPILER_CACHE";
/// Disables stale output deletion
pub const ENV_PAGE_BUILD_ON_DATA_CHANGES: &str = "KILN_PAGE_BUILD_ON_DATA_CHANGES";

/// Toggles read from the process environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvToggles {
    /// Raw value of `KILN_ENV`, if set
    pub mode: Option<String>,
    pub preserve_download_cache: Option<bool>,
    pub preserve_compiler_cache: Option<bool>,
    pub page_build_on_data_changes: Option<bool>,
    /// Values that could not be parsed as booleans
    pub unparsed: Vec<(String, String)>,
}

impl EnvToggles {
    /// Read toggles from the current process environment
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Read toggles from an explicit variable set
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let mut unparsed = Vec::new();
        let mut flag = |name: &str| -> Option<bool> {
            let raw = vars.get(name)?;
            let parsed = parse_bool(raw);
            if parsed.is_none() {
                unparsed.push((name.to_string(), raw.clone()));
            }
            parsed
        };

        let preserve_download_cache = flag(ENV_PRESERVE_DOWNLOAD_CACHE);
        let preserve_compiler_cache = flag(ENV_PRESERVE_COMPILER_CACHE);
        let page_build_on_data_changes = flag(ENV_PAGE_BUILD_ON_DATA_CHANGES);

        Self {
            mode: vars.get(ENV_MODE).cloned(),
            preserve_download_cache,
            preserve_compiler_cache,
            page_build_on_data_changes,
            unparsed,
        }
    }

    /// Whether the environment forces production mode on or off
    pub fn production_override(&self) -> Option<bool> {
        self.mode.as_deref().map(|m| m == "production")
    }
}

/// Parse a boolean-ish environment value
fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Effective flags after applying environment precedence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolvedFlags {
    pub preserve_download_cache: bool,
    pub preserve_compiler_cache: bool,
    pub page_build_on_data_changes: bool,
}

impl ResolvedFlags {
    /// Merge config flags with environment toggles, returning any warnings
    pub fn resolve(config: &FlagsConfig, env: &EnvToggles) -> (Self, Vec<String>) {
        let mut warnings = Vec::new();

        for (name, raw) in &env.unparsed {
            warnings.push(format!(
                "Ignoring {}={:?}: expected a boolean (1/0, true/false)",
                name, raw
            ));
        }

        let mut pick = |key: &str, var: &str, cfg: Option<bool>, env: Option<bool>| match (cfg, env)
        {
            (Some(c), Some(e)) if c != e => {
                warnings.push(format!(
                    "flags.{} = {} conflicts with {}={}; the environment wins",
                    key, c, var, e
                ));
                e
            }
            (_, Some(e)) => e,
            (Some(c), None) => c,
            (None, None) => false,
        };

        let flags = Self {
            preserve_download_cache: pick(
                "preserve_download_cache",
                ENV_PRESERVE_DOWNLOAD_CACHE,
                config.preserve_download_cache,
                env.preserve_download_cache,
            ),
            preserve_compiler_cache: pick(
                "preserve_compiler_cache",
                ENV_PRESERVE_COMPILER_CACHE,
                config.preserve_compiler_cache,
                env.preserve_compiler_cache,
            ),
            page_build_on_data_changes: pick(
                "page_build_on_data_changes",
                ENV_PAGE_BUILD_ON_DATA_CHANGES,
                config.page_build_on_data_changes,
                env.page_build_on_data_changes,
            ),
        };

        (flags, warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn parses_truthy_and_falsy() {
        let env = EnvToggles::from_vars([
            (ENV_PRESERVE_DOWNLOAD_CACHE, "true"),
            (ENV_PRESERVE_COMPILER_CACHE, "0"),
        ]);
        assert_eq!(env.preserve_download_cache, Some(true));
        assert_eq!(env.preserve_compiler_cache, Some(false));
        assert_eq!(env.page_build_on_data_changes, None);
        assert!(env.unparsed.is_empty());
    }

    #[test]
    fn records_unparsable_values() {
        let env = EnvToggles::from_vars([(ENV_PAGE_BUILD_ON_DATA_CHANGES, "maybe")]);
        assert_eq!(env.page_build_on_data_changes, None);
        assert_eq!(env.unparsed.len(), 1);

        let (_, warnings) = ResolvedFlags::resolve(&FlagsConfig::default(), &env);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("maybe"));
    }

    #[test]
    fn production_override() {
        let env = EnvToggles::from_vars([(ENV_MODE, "production")]);
        assert_eq!(env.production_override(), Some(true));
        let env = EnvToggles::from_vars([(ENV_MODE, "development")]);
        assert_eq!(env.production_override(), Some(false));
        assert_eq!(EnvToggles::default().production_override(), None);
    }

    #[test]
    fn environment_wins_over_config() {
        let config = FlagsConfig {
            preserve_download_cache: Some(false),
            preserve_compiler_cache: Some(true),
            page_build_on_data_changes: None,
        };
        let env = EnvToggles::from_vars([(ENV_PRESERVE_DOWNLOAD_CACHE, "1")]);

        let (flags, warnings) = ResolvedFlags::resolve(&config, &env);
        assert!(flags.preserve_download_cache);
        assert!(flags.preserve_compiler_cache);
        assert!(!flags.page_build_on_data_changes);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("preserve_download_cache"));
    }

    #[test]
    fn agreeing_values_do_not_warn() {
        let config = FlagsConfig {
            preserve_compiler_cache: Some(true),
            ..FlagsConfig::default()
        };
        let env = EnvToggles::from_vars([(ENV_PRESERVE_COMPILER_CACHE, "yes")]);
        let (flags, warnings) = ResolvedFlags::resolve(&config, &env);
        assert!(flags.preserve_compiler_cache);
        assert!(warnings.is_empty());
    }

    #[test]
    #[serial]
    fn reads_process_environment() {
        std::env::set_var(ENV_PRESERVE_COMPILER_CACHE, "on");
        let env = EnvToggles::from_env();
        std::env::remove_var(ENV_PRESERVE_COMPILER_CACHE);
        assert_eq!(env.preserve_compiler_cache, Some(true));
    }
}
