use std::time::Duration;

use moka::sync::Cache;
use reqwest::{
    StatusCode,
    header::{HeaderMap, HeaderValue, USER_AGENT},
};
use tracing::{debug, warn};

use crate::{
    constants::{PROBE_CACHE_MAX_CAPACITY, PROBE_MAX_TTL_SECS, PROBE_TIMEOUT_SECS},
    error::ServiceError,
    gravatar::{avatar_base_url, email_hash},
};

/// Asks gravatar.com whether an avatar is registered for an address.
#[derive(Clone)]
pub struct GravatarProbe {
    http_client: reqwest::Client,
    answers: Cache<String, bool>,
}

impl GravatarProbe {
    pub fn new(expiration: Duration) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("gravatar-rs"));

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .pool_max_idle_per_host(16)
            .pool_idle_timeout(Duration::from_secs(90))
            .connect_timeout(Duration::from_secs(PROBE_TIMEOUT_SECS))
            .timeout(Duration::from_secs(PROBE_TIMEOUT_SECS * 2))
            .build()?;

        let answers = Cache::builder()
            .max_capacity(PROBE_CACHE_MAX_CAPACITY)
            .time_to_live(probe_ttl(expiration))
            .build();

        Ok(Self {
            http_client,
            answers,
        })
    }

    pub async fn exists(&self, email: &str) -> Result<bool, ServiceError> {
        let hash = email_hash(email)?;
        if let Some(known) = self.answers.get(&hash) {
            debug!("probe cache hit for hash='{hash}'");
            return Ok(known);
        }

        let response = self
            .http_client
            .get(probe_url(&hash))
            .send()
            .await
            .map_err(|err| {
                warn!("gravatar probe failed for hash='{hash}': {err}");
                ServiceError::Upstream
            })?;

        let exists = existence_from_status(response.status())?;
        self.answers.insert(hash, exists);
        Ok(exists)
    }
}

/// moka rejects TTLs past 1000 years, so long expirations are capped.
fn probe_ttl(expiration: Duration) -> Duration {
    expiration.clamp(Duration::from_secs(1), Duration::from_secs(PROBE_MAX_TTL_SECS))
}

fn probe_url(email_hash: &str) -> String {
    format!("{}?d=404", avatar_base_url(email_hash, true))
}

fn existence_from_status(status: StatusCode) -> Result<bool, ServiceError> {
    if status.is_success() {
        Ok(true)
    } else if status == StatusCode::NOT_FOUND {
        Ok(false)
    } else {
        warn!("unexpected gravatar probe status {status}");
        Err(ServiceError::Upstream)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use reqwest::StatusCode;

    use super::{GravatarProbe, existence_from_status, probe_ttl, probe_url};
    use crate::constants::PROBE_MAX_TTL_SECS;
    use crate::error::ServiceError;

    #[test]
    fn probe_url_requests_404_fallback() {
        assert_eq!(
            probe_url("55502f40dc8b7c769880b10874abc9d0"),
            "https://www.gravatar.com/avatar/55502f40dc8b7c769880b10874abc9d0?d=404"
        );
    }

    #[test]
    fn status_maps_to_existence() {
        assert_eq!(existence_from_status(StatusCode::OK), Ok(true));
        assert_eq!(existence_from_status(StatusCode::NOT_FOUND), Ok(false));
        assert_eq!(
            existence_from_status(StatusCode::SERVICE_UNAVAILABLE),
            Err(ServiceError::Upstream)
        );
    }

    #[test]
    fn answer_ttl_is_clamped() {
        assert_eq!(probe_ttl(Duration::ZERO), Duration::from_secs(1));
        assert_eq!(probe_ttl(Duration::from_secs(60)), Duration::from_secs(60));
        assert_eq!(
            probe_ttl(Duration::from_secs(40_000_000_000)),
            Duration::from_secs(PROBE_MAX_TTL_SECS)
        );
    }

    #[test]
    fn huge_expiration_still_builds() {
        assert!(GravatarProbe::new(Duration::from_secs(i64::MAX as u64)).is_ok());
    }
}
