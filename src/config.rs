use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

fn default_base_url() -> String {
    "https://api.cerebras.ai/v1".to_string()
}

fn default_model() -> String {
    "llama3.1-8b".to_string()
}

fn default_critic_research_window() -> usize {
    1000
}

fn default_synthesis_window() -> usize {
    2000
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("outputs")
}

fn default_listen_addr() -> String {
    "127.0.0.1:5000".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub inference: InferenceConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InferenceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Fallback credential; the QUARTET_API_KEY environment variable wins.
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Character-count truncation windows applied to upstream text before it is
/// embedded in a downstream prompt. Counts characters, not tokens.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LimitsConfig {
    #[serde(default = "default_critic_research_window")]
    pub critic_research_window: usize,
    #[serde(default = "default_synthesis_window")]
    pub synthesis_window: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        InferenceConfig {
            base_url: default_base_url(),
            model: default_model(),
            api_key: None,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        LimitsConfig {
            critic_research_window: default_critic_research_window(),
            synthesis_window: default_synthesis_window(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            listen_addr: default_listen_addr(),
            output_dir: default_output_dir(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            inference: InferenceConfig::default(),
            limits: LimitsConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Self {
        let config_path = Self::get_config_path();

        if config_path.exists() {
            match fs::read_to_string(&config_path) {
                Ok(contents) => match toml::from_str(&contents) {
                    Ok(config) => return config,
                    Err(e) => eprintln!("Error parsing config.toml: {}. Using defaults.", e),
                },
                Err(e) => eprintln!("Error reading config.toml: {}. Using defaults.", e),
            }
        }

        Config::default()
    }

    pub fn get_config_path() -> PathBuf {
        if PathBuf::from("config.toml").exists() {
            return PathBuf::from("config.toml");
        }
        if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home).join(".config/quartet/config.toml")
        } else {
            PathBuf::from("config.toml")
        }
    }

    /// Resolves the inference credential: environment first, config file second.
    pub fn resolve_api_key(&self) -> Option<String> {
        std::env::var("QUARTET_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .or_else(|| self.inference.api_key.clone().filter(|k| !k.is_empty()))
    }
}
