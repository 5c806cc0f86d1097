use std::collections::HashMap;

use url::form_urlencoded;

use crate::{
    error::ServiceError,
    models::{DefaultImage, GravatarRequest},
};

#[derive(Debug, Default)]
pub struct ParsedParams {
    values: HashMap<String, Vec<String>>,
}

impl ParsedParams {
    pub fn from_raw(raw_query: Option<&str>) -> Self {
        let mut values: HashMap<String, Vec<String>> = HashMap::new();

        if let Some(raw) = raw_query {
            for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
                values
                    .entry(key.into_owned())
                    .or_default()
                    .push(value.into_owned());
            }
        }

        Self { values }
    }

    pub fn get_optional_string(&self, key: &str) -> Option<String> {
        self.values
            .get(key)
            .and_then(|list| list.first())
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    pub fn get_optional_number(&self, key: &str) -> Result<Option<i64>, ServiceError> {
        self.get_optional_string(key)
            .map(|value| {
                value.parse::<i64>().map_err(|_| {
                    ServiceError::Validation(format!("'{key}' must be an integer, got '{value}'"))
                })
            })
            .transpose()
    }

    pub fn get_optional_boolean(&self, key: &str) -> Result<Option<bool>, ServiceError> {
        self.get_optional_string(key)
            .map(|value| match value.as_str() {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                _ => Err(ServiceError::Validation(format!(
                    "'{key}' must be true or false, got '{value}'"
                ))),
            })
            .transpose()
    }

    /// Reads `email`, `size`, `default` and `secure` into a request.
    pub fn to_request(&self) -> Result<GravatarRequest, ServiceError> {
        let email = self
            .get_optional_string("email")
            .ok_or_else(|| ServiceError::Validation("'email' is a required parameter".into()))?;

        let mut request = GravatarRequest::new(email);
        if let Some(size) = self.get_optional_number("size")? {
            request = request.with_size(size);
        }
        if let Some(secure) = self.get_optional_boolean("secure")? {
            request = request.with_secure(secure);
        }
        if let Some(value) = self.get_optional_string("default") {
            let default_image = match value.as_str() {
                "true" => DefaultImage::from_flag(true),
                "false" => DefaultImage::from_flag(false),
                _ => DefaultImage::parse(&value).map_err(ServiceError::Validation)?,
            };
            request = request.with_default_image(default_image);
        }

        Ok(request)
    }
}
