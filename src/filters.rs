//! Template filter table.
//!
//! Host renderers look filters up by name; the Gravatar filters are
//! registered once at startup by [`install`].

use std::{collections::HashMap, sync::Arc};

use crate::{error::ServiceError, gravatar::GravatarService, models::GravatarRequest};

pub const URL_FILTER: &str = "gravatar";
pub const TAG_FILTER: &str = "gravatarTag";

pub type Filter = Box<dyn Fn(&GravatarRequest) -> Result<String, ServiceError> + Send + Sync>;

#[derive(Default)]
pub struct FilterRegistry {
    filters: HashMap<String, Filter>,
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `filter` under `name`, replacing any earlier registration.
    pub fn register<F>(&mut self, name: &str, filter: F)
    where
        F: Fn(&GravatarRequest) -> Result<String, ServiceError> + Send + Sync + 'static,
    {
        self.filters.insert(name.to_string(), Box::new(filter));
    }

    pub fn apply(&self, name: &str, request: &GravatarRequest) -> Result<String, ServiceError> {
        let filter = self
            .filters
            .get(name)
            .ok_or_else(|| ServiceError::Validation(format!("unknown filter '{name}'")))?;
        filter(request)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names = self.filters.keys().map(String::as_str).collect::<Vec<_>>();
        names.sort_unstable();
        names
    }
}

pub fn install(registry: &mut FilterRegistry, service: Arc<GravatarService>) {
    let url_service = service.clone();
    registry.register(URL_FILTER, move |request| url_service.build_url(request));
    registry.register(TAG_FILTER, move |request| service.build_tag(request));
}
