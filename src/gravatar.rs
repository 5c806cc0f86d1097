use std::sync::Arc;

use md5::{Digest, Md5};
use tracing::{debug, warn};
use url::form_urlencoded;

use crate::{
    cache::CacheStore,
    config::{GravatarConfig, validate_size},
    constants::{GRAVATAR_HOST, URL_CACHE_NAMESPACE},
    error::ServiceError,
    html,
    models::{DefaultImage, GravatarRequest},
};

/// Builds Gravatar URLs and tags, reading through a shared cache.
pub struct GravatarService {
    config: GravatarConfig,
    cache: Arc<dyn CacheStore>,
}

struct ResolvedRequest<'a> {
    email_hash: String,
    size: u32,
    default_image: &'a DefaultImage,
    secure: bool,
}

impl GravatarService {
    pub fn new(config: GravatarConfig, cache: Arc<dyn CacheStore>) -> Self {
        Self { config, cache }
    }

    pub fn config(&self) -> &GravatarConfig {
        &self.config
    }

    pub fn build_url(&self, request: &GravatarRequest) -> Result<String, ServiceError> {
        let resolved = self.resolve(request)?;
        let key = cache_key(&resolved);

        match self.cache.get(&key) {
            Ok(Some(url)) => {
                debug!("gravatar cache hit for hash='{}'", resolved.email_hash);
                return Ok(url);
            }
            Ok(None) => debug!("gravatar cache miss for hash='{}'", resolved.email_hash),
            Err(err) => warn!("gravatar cache read failed, computing directly: {err}"),
        }

        let url = avatar_url(&resolved);
        if let Err(err) = self
            .cache
            .set(&key, url.clone(), self.config.expiration())
        {
            warn!("gravatar cache write failed: {err}");
        }

        Ok(url)
    }

    pub fn build_tag(&self, request: &GravatarRequest) -> Result<String, ServiceError> {
        let size = self.resolve_size(request)?;
        let url = self.build_url(request)?;
        Ok(html::image_tag(&url, size))
    }

    fn resolve<'a>(
        &'a self,
        request: &'a GravatarRequest,
    ) -> Result<ResolvedRequest<'a>, ServiceError> {
        let email_hash = email_hash(&request.email)?;
        let size = self.resolve_size(request)?;
        let default_image = request
            .default_image
            .as_ref()
            .unwrap_or_else(|| self.config.default_image());

        Ok(ResolvedRequest {
            email_hash,
            size,
            default_image,
            secure: request.secure.unwrap_or(true),
        })
    }

    fn resolve_size(&self, request: &GravatarRequest) -> Result<u32, ServiceError> {
        match request.size {
            Some(size) => validate_size(size).map_err(ServiceError::Validation),
            None => Ok(self.config.size()),
        }
    }
}

/// MD5 hex of the trimmed, lower-cased address, as Gravatar expects.
pub fn email_hash(email: &str) -> Result<String, ServiceError> {
    let normalized = email.trim().to_lowercase();
    if normalized.is_empty() {
        return Err(ServiceError::Validation("email must not be empty".to_string()));
    }

    Ok(md5_hex(normalized.as_bytes()))
}

pub fn avatar_base_url(email_hash: &str, secure: bool) -> String {
    let scheme = if secure { "https" } else { "http" };
    format!("{scheme}://{GRAVATAR_HOST}/avatar/{email_hash}")
}

fn avatar_url(resolved: &ResolvedRequest<'_>) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    query.append_pair("s", &resolved.size.to_string());
    if let Some(default_image) = resolved.default_image.value() {
        query.append_pair("d", default_image);
    }

    format!(
        "{}?{}",
        avatar_base_url(&resolved.email_hash, resolved.secure),
        query.finish()
    )
}

fn cache_key(resolved: &ResolvedRequest<'_>) -> String {
    let composite = format!(
        "{}|{}|{}|{}",
        resolved.email_hash,
        resolved.size,
        resolved.default_image.value().unwrap_or("-"),
        resolved.secure
    );
    format!("{URL_CACHE_NAMESPACE}:{}", md5_hex(composite.as_bytes()))
}

fn md5_hex(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
