use url::Url;

use crate::constants::{BUILTIN_DEFAULT_IMAGES, MYSTERY_PERSON_IMAGE};

/// Fallback image Gravatar serves when no avatar is registered for a hash.
///
/// `None` leaves the `d` parameter off the URL entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DefaultImage(Option<String>);

impl DefaultImage {
    pub fn none() -> Self {
        Self(None)
    }

    pub fn from_flag(enabled: bool) -> Self {
        if enabled {
            Self(Some(MYSTERY_PERSON_IMAGE.to_string()))
        } else {
            Self(None)
        }
    }

    /// Accepts one of Gravatar's built-in keywords or an absolute http(s) URL.
    pub fn parse(value: &str) -> Result<Self, String> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(Self(None));
        }

        let keyword = value.to_ascii_lowercase();
        if BUILTIN_DEFAULT_IMAGES.contains(&keyword.as_str()) {
            return Ok(Self(Some(keyword)));
        }

        match Url::parse(value) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(Self(Some(value.to_string()))),
            _ => Err(format!(
                "default image '{value}' is neither a built-in keyword ({}) nor an http(s) URL",
                BUILTIN_DEFAULT_IMAGES.join(", ")
            )),
        }
    }

    pub fn value(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GravatarRequest {
    pub email: String,
    pub size: Option<i64>,
    pub default_image: Option<DefaultImage>,
    pub secure: Option<bool>,
}

impl GravatarRequest {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            size: None,
            default_image: None,
            secure: None,
        }
    }

    pub fn with_size(mut self, size: i64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_default_image(mut self, default_image: DefaultImage) -> Self {
        self.default_image = Some(default_image);
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = Some(secure);
        self
    }
}
