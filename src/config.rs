use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

pub const ENV_BOT_TOKEN: &str = "TG_AI_TOKEN";
pub const ENV_MODEL: &str = "MODEL_NAME";
pub const ENV_API_URL: &str = "API_URL";
pub const ENV_API_KEY: &str = "YA_AI_TOKEN";
pub const ENV_MENTION: &str = "BOT_MENTION";

#[derive(Debug, Clone, PartialEq)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Literal `@botname` a group message must contain. Resolved from `getMe` when unset.
    pub mention: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    /// Model URI sent as `modelUri`, e.g. `gpt://<folder>/yandexgpt/latest`
    pub model: String,
    pub api_url: String,
    pub api_key: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub llm: LlmConfig,
}

/// Optional TOML file layout. Every key may be omitted; the environment fills the gaps.
#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    #[serde(default)]
    telegram: FileTelegram,
    #[serde(default)]
    llm: FileLlm,
}

#[derive(Debug, Deserialize, Default)]
struct FileTelegram {
    bot_token: Option<String>,
    mention: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct FileLlm {
    model: Option<String>,
    api_url: Option<String>,
    api_key: Option<String>,
}

impl Config {
    /// Load from the process environment, with `file` (if any) supplying defaults.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let file_config = match file {
            Some(path) => Self::read_file(path)?,
            None => FileConfig::default(),
        };
        Self::resolve(file_config, |key| std::env::var(key).ok())
    }

    fn read_file(path: &Path) -> Result<FileConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::File {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::File {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Merge file values with `lookup` (environment wins) and check that all
    /// required values are present. Every missing key is reported at once.
    fn resolve<F>(file: FileConfig, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let clean = |v: String| {
            let v = v.trim();
            (!v.is_empty()).then(|| v.to_string())
        };
        let pick = |key: &str, fallback: Option<String>| {
            lookup(key).and_then(clean).or(fallback.and_then(clean))
        };

        let bot_token = pick(ENV_BOT_TOKEN, file.telegram.bot_token);
        let model = pick(ENV_MODEL, file.llm.model);
        let api_url = pick(ENV_API_URL, file.llm.api_url);
        let api_key = pick(ENV_API_KEY, file.llm.api_key);
        let mention = pick(ENV_MENTION, file.telegram.mention).map(|m| normalize_mention(&m));

        let mut missing = Vec::new();
        if bot_token.is_none() {
            missing.push(ENV_BOT_TOKEN);
        }
        if model.is_none() {
            missing.push(ENV_MODEL);
        }
        if api_url.is_none() {
            missing.push(ENV_API_URL);
        }
        if api_key.is_none() {
            missing.push(ENV_API_KEY);
        }

        match (bot_token, model, api_url, api_key) {
            (Some(bot_token), Some(model), Some(api_url), Some(api_key)) => Ok(Config {
                telegram: TelegramConfig { bot_token, mention },
                llm: LlmConfig {
                    model,
                    api_url,
                    api_key,
                },
            }),
            _ => Err(ConfigError::Missing(missing)),
        }
    }
}

/// `botname` and `@botname` both become `@botname`.
pub fn normalize_mention(raw: &str) -> String {
    let name = raw.trim().trim_start_matches('@');
    format!("@{}", name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn full_env() -> HashMap<String, String> {
        env(&[
            (ENV_BOT_TOKEN, "123:abc"),
            (ENV_MODEL, "gpt://folder/yandexgpt/latest"),
            (ENV_API_URL, "https://llm.example/completion"),
            (ENV_API_KEY, "secret"),
        ])
    }

    fn resolve(vars: HashMap<String, String>, file: FileConfig) -> Result<Config, ConfigError> {
        Config::resolve(file, |key| vars.get(key).cloned())
    }

    #[test]
    fn test_resolve_from_env() {
        let config = resolve(full_env(), FileConfig::default()).unwrap();
        assert_eq!(config.telegram.bot_token, "123:abc");
        assert_eq!(config.llm.model, "gpt://folder/yandexgpt/latest");
        assert_eq!(config.llm.api_url, "https://llm.example/completion");
        assert_eq!(config.llm.api_key, "secret");
        assert!(config.telegram.mention.is_none());
    }

    #[test]
    fn test_each_missing_value_is_reported() {
        for key in [ENV_BOT_TOKEN, ENV_MODEL, ENV_API_URL, ENV_API_KEY] {
            let mut vars = full_env();
            vars.remove(key);
            let err = resolve(vars, FileConfig::default()).unwrap_err();
            assert_eq!(err, ConfigError::Missing(vec![key]));
        }
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let mut vars = full_env();
        vars.insert(ENV_API_KEY.to_string(), "  ".to_string());
        let err = resolve(vars, FileConfig::default()).unwrap_err();
        assert_eq!(err, ConfigError::Missing(vec![ENV_API_KEY]));
    }

    #[test]
    fn test_values_are_trimmed() {
        let mut vars = full_env();
        vars.insert(ENV_API_KEY.to_string(), " secret \n".to_string());
        vars.insert(ENV_API_URL.to_string(), "https://llm.example/completion\r\n".to_string());
        let file: FileConfig = toml::from_str("[telegram]\nbot_token = \"123:abc \"\n").unwrap();
        vars.remove(ENV_BOT_TOKEN);

        let config = resolve(vars, file).unwrap();
        assert_eq!(config.llm.api_key, "secret");
        assert_eq!(config.llm.api_url, "https://llm.example/completion");
        assert_eq!(config.telegram.bot_token, "123:abc");
    }

    #[test]
    fn test_all_missing_listed_together() {
        let err = resolve(HashMap::new(), FileConfig::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required configuration: TG_AI_TOKEN, MODEL_NAME, API_URL, YA_AI_TOKEN"
        );
    }

    #[test]
    fn test_file_values_fill_gaps_and_env_wins() {
        let file: FileConfig = toml::from_str(
            r#"
            [telegram]
            bot_token = "from-file"
            mention = "MyBot"

            [llm]
            model = "file-model"
            api_url = "https://file.example"
            api_key = "file-key"
            "#,
        )
        .unwrap();
        let vars = env(&[(ENV_API_KEY, "env-key")]);

        let config = resolve(vars, file).unwrap();
        assert_eq!(config.telegram.bot_token, "from-file");
        assert_eq!(config.telegram.mention.as_deref(), Some("@MyBot"));
        assert_eq!(config.llm.model, "file-model");
        assert_eq!(config.llm.api_key, "env-key");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = Config::read_file(Path::new("/nonexistent/yagpt-relay.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::File { .. }));
    }

    #[test]
    fn test_normalize_mention() {
        assert_eq!(normalize_mention("Bot"), "@Bot");
        assert_eq!(normalize_mention(" @Bot "), "@Bot");
    }
}
