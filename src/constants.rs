pub const STALE_WHILE_REVALIDATE: u32 = 86_400;

pub const DEFAULT_PORT: u16 = 8080;

pub const DEFAULT_SIZE: u32 = 80;
pub const MIN_SIZE: u32 = 1;
pub const MAX_SIZE: u32 = 2048;
pub const DEFAULT_EXPIRATION_SECS: u64 = 172_800;

pub const GRAVATAR_HOST: &str = "www.gravatar.com";
pub const MYSTERY_PERSON_IMAGE: &str = "mp";
pub const BUILTIN_DEFAULT_IMAGES: [&str; 9] = [
    "404",
    "mp",
    "mm",
    "identicon",
    "monsterid",
    "wavatar",
    "retro",
    "robohash",
    "blank",
];

pub const URL_CACHE_NAMESPACE: &str = "gravatar:v1";
pub const URL_CACHE_MAX_CAPACITY: u64 = 20_000;
pub const PROBE_CACHE_MAX_CAPACITY: u64 = 20_000;
pub const PROBE_TIMEOUT_SECS: u64 = 10;
pub const PROBE_MAX_TTL_SECS: u64 = 60 * 60 * 24 * 30;
