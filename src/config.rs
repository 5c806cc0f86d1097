use std::{env, time::Duration};

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{
    constants::{DEFAULT_EXPIRATION_SECS, DEFAULT_SIZE, MAX_SIZE, MIN_SIZE},
    error::ServiceError,
    models::DefaultImage,
};

const ENV_SIZE: &str = "GRAVATAR_SIZE";
const ENV_EXPIRATION: &str = "GRAVATAR_EXPIRATION";
const ENV_DEFAULT_IMAGE: &str = "GRAVATAR_DEFAULT_IMAGE";

/// Startup configuration for the URL service. Immutable once resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GravatarConfig {
    size: u32,
    expiration: Duration,
    default_image: DefaultImage,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawConfig {
    expiration: Option<i64>,
    size: Option<i64>,
    default_image: Option<RawDefaultImage>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawDefaultImage {
    Flag(bool),
    Image(String),
}

impl Default for GravatarConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_SIZE,
            expiration: Duration::from_secs(DEFAULT_EXPIRATION_SECS),
            default_image: DefaultImage::none(),
        }
    }
}

impl GravatarConfig {
    /// Resolves a raw `expiration` / `size` / `defaultImage` mapping, filling
    /// in defaults for missing keys.
    pub fn resolve(raw: &Map<String, Value>) -> Result<Self, ServiceError> {
        let parsed: RawConfig = serde_json::from_value(Value::Object(raw.clone()))
            .map_err(|err| ServiceError::Configuration(err.to_string()))?;

        let size = match parsed.size {
            Some(size) => validate_size(size).map_err(ServiceError::Configuration)?,
            None => DEFAULT_SIZE,
        };

        let expiration = match parsed.expiration {
            Some(seconds) => u64::try_from(seconds).map(Duration::from_secs).map_err(|_| {
                ServiceError::Configuration(format!("expiration must be >= 0, got {seconds}"))
            })?,
            None => Duration::from_secs(DEFAULT_EXPIRATION_SECS),
        };

        let default_image = match parsed.default_image {
            Some(RawDefaultImage::Flag(enabled)) => DefaultImage::from_flag(enabled),
            Some(RawDefaultImage::Image(value)) => {
                DefaultImage::parse(&value).map_err(ServiceError::Configuration)?
            }
            None => DefaultImage::none(),
        };

        Ok(Self {
            size,
            expiration,
            default_image,
        })
    }

    pub fn from_env() -> Result<Self, ServiceError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ServiceError> {
        let mut raw = Map::new();
        for (key, option, coerce) in [
            (ENV_SIZE, "size", coerce_env_integer as fn(&str) -> Value),
            (ENV_EXPIRATION, "expiration", coerce_env_integer),
            (ENV_DEFAULT_IMAGE, "defaultImage", coerce_env_default_image),
        ] {
            if let Some(value) = lookup(key)
                && !value.trim().is_empty()
            {
                raw.insert(option.to_string(), coerce(value.trim()));
            }
        }

        Self::resolve(&raw)
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn expiration(&self) -> Duration {
        self.expiration
    }

    pub fn default_image(&self) -> &DefaultImage {
        &self.default_image
    }
}

pub fn validate_size(size: i64) -> Result<u32, String> {
    u32::try_from(size)
        .ok()
        .filter(|size| (MIN_SIZE..=MAX_SIZE).contains(size))
        .ok_or_else(|| format!("size must be between {MIN_SIZE} and {MAX_SIZE}, got {size}"))
}

fn coerce_env_integer(raw: &str) -> Value {
    raw.parse::<i64>()
        .map(Value::from)
        .unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Keywords such as `404` stay strings; only `true`/`false` become flags.
fn coerce_env_default_image(raw: &str) -> Value {
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::{Map, Value, json};

    use super::GravatarConfig;
    use crate::error::ServiceError;

    fn raw(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn empty_mapping_uses_defaults() {
        let config = GravatarConfig::resolve(&Map::new()).unwrap();
        assert_eq!(config, GravatarConfig::default());
        assert_eq!(config.size(), 80);
        assert_eq!(config.expiration(), Duration::from_secs(172_800));
        assert_eq!(config.default_image().value(), None);
    }

    #[test]
    fn present_keys_override_defaults() {
        let config = GravatarConfig::resolve(&raw(json!({
            "size": 120,
            "expiration": 60,
            "defaultImage": "identicon",
        })))
        .unwrap();

        assert_eq!(config.size(), 120);
        assert_eq!(config.expiration(), Duration::from_secs(60));
        assert_eq!(config.default_image().value(), Some("identicon"));
    }

    #[test]
    fn default_image_flag_is_accepted() {
        let config = GravatarConfig::resolve(&raw(json!({ "defaultImage": true }))).unwrap();
        assert_eq!(config.default_image().value(), Some("mp"));
    }

    #[test]
    fn type_mismatch_is_a_configuration_error() {
        for value in [
            json!({ "size": "large" }),
            json!({ "expiration": 1.5 }),
            json!({ "defaultImage": 3 }),
        ] {
            let err = GravatarConfig::resolve(&raw(value)).unwrap_err();
            assert!(matches!(err, ServiceError::Configuration(_)), "{err:?}");
        }
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        assert!(GravatarConfig::resolve(&raw(json!({ "size": 0 }))).is_err());
        assert!(GravatarConfig::resolve(&raw(json!({ "size": 2049 }))).is_err());
        assert!(GravatarConfig::resolve(&raw(json!({ "expiration": -1 }))).is_err());
        assert!(GravatarConfig::resolve(&raw(json!({ "defaultImage": "nope" }))).is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = GravatarConfig::resolve(&raw(json!({ "rating": "pg" }))).unwrap_err();
        assert!(matches!(err, ServiceError::Configuration(_)));
    }

    #[test]
    fn env_values_are_coerced_before_resolving() {
        let config = GravatarConfig::from_lookup(|key| match key {
            "GRAVATAR_SIZE" => Some("200".to_string()),
            "GRAVATAR_DEFAULT_IMAGE" => Some("false".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.size(), 200);
        assert_eq!(config.default_image().value(), None);

        let err = GravatarConfig::from_lookup(|key| {
            (key == "GRAVATAR_EXPIRATION").then(|| "soon".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ServiceError::Configuration(_)));
    }

    #[test]
    fn numeric_default_image_keyword_from_env_stays_a_string() {
        let config = GravatarConfig::from_lookup(|key| {
            (key == "GRAVATAR_DEFAULT_IMAGE").then(|| "404".to_string())
        })
        .unwrap();
        assert_eq!(config.default_image().value(), Some("404"));

        let config = GravatarConfig::from_lookup(|key| {
            (key == "GRAVATAR_DEFAULT_IMAGE").then(|| "true".to_string())
        })
        .unwrap();
        assert_eq!(config.default_image().value(), Some("mp"));
    }

    #[test]
    fn boolean_size_from_env_is_rejected() {
        let err = GravatarConfig::from_lookup(|key| {
            (key == "GRAVATAR_SIZE").then(|| "true".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ServiceError::Configuration(_)));
    }
}
