use std::{str::FromStr, time::Duration};

use crate::error::{DesignError, Result};

pub const DEFAULT_API_BASE: &str = "http://localhost:3000";

pub const DEFAULT_MODELS: [&str; 4] = [
    "stabilityai/sdxl-turbo:free",
    "google/gemini-2.0-flash-exp:free",
    "black-forest-labs/FLUX-1-schnell:free",
    "HiDream-ai/HiDream-I1-Full:free",
];

/// Which body shape `/api/generate` receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestSchema {
    /// `{ length, shape, style, color, baseColor?, ... }`
    #[default]
    Attributes,
    /// Legacy `{ prompt, ... }` bodies.
    Prompt,
}

impl FromStr for RequestSchema {
    type Err = DesignError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "attributes" | "structured" => Ok(RequestSchema::Attributes),
            "prompt" => Ok(RequestSchema::Prompt),
            other => Err(DesignError::Config(format!("DESIGN_REQUEST_SCHEMA: unknown schema '{other}'"))),
        }
    }
}

/// Image size and count sent with every generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDefaults {
    pub width: u32,
    pub height: u32,
    pub num_images: u32,
}

impl Default for ImageDefaults {
    fn default() -> Self {
        Self { width: 1024, height: 1024, num_images: 1 }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base: String,
    pub models: Vec<String>,
    pub image: ImageDefaults,
    pub request_timeout: Duration,
    pub schema: RequestSchema,
    pub force_token_refresh: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            image: ImageDefaults::default(),
            request_timeout: Duration::from_secs(60),
            schema: RequestSchema::default(),
            force_token_refresh: true,
        }
    }
}

impl Config {
    /// Reads the process environment. Call `dotenv::dotenv()` first if a `.env` file should count.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let api_base = lookup("EXPO_PUBLIC_API_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.api_base)
            .trim()
            .trim_end_matches('/')
            .to_string();

        let models = match lookup("DESIGN_MODELS") {
            Some(raw) => {
                let models: Vec<String> = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .map(str::to_string)
                    .collect();
                if models.is_empty() {
                    return Err(DesignError::Config("DESIGN_MODELS: at least one model is required".into()));
                }
                models
            }
            None => defaults.models,
        };

        let image = ImageDefaults {
            width: parse_nonzero(&lookup, "DESIGN_IMAGE_WIDTH", defaults.image.width)?,
            height: parse_nonzero(&lookup, "DESIGN_IMAGE_HEIGHT", defaults.image.height)?,
            num_images: parse_nonzero(&lookup, "DESIGN_NUM_IMAGES", defaults.image.num_images)?,
        };
        let timeout_secs: u64 = parse_nonzero(&lookup, "DESIGN_REQUEST_TIMEOUT_SECS", defaults.request_timeout.as_secs())?;
        let schema = match lookup("DESIGN_REQUEST_SCHEMA") {
            Some(raw) => raw.parse()?,
            None => defaults.schema,
        };
        let force_token_refresh = parse_or(&lookup, "DESIGN_FORCE_TOKEN_REFRESH", defaults.force_token_refresh)?;

        Ok(Self {
            api_base,
            models,
            image,
            request_timeout: Duration::from_secs(timeout_secs),
            schema,
            force_token_refresh,
        })
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| DesignError::Config(format!("{key}: {e}"))),
        None => Ok(default),
    }
}

/// Like [`parse_or`], but zero is rejected: a zero timeout or image count
/// would make every generation fail.
fn parse_nonzero<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr + Default + PartialEq,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let value = parse_or(lookup, key, default)?;
    if value == T::default() {
        return Err(DesignError::Config(format!("{key}: must be greater than zero")));
    }
    Ok(value)
}
