//! Shared constants used across metasidebar crates.

/// Default API port for the metadata server.
pub const DEFAULT_PORT: u16 = 38512;

/// Default base URL for HTTP clients.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:38512";

/// Default HTTP client request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Template key of the free-form key/value template gated by the properties flag.
pub const PROPERTIES_TEMPLATE_KEY: &str = "properties";

/// Scope shared by every tenant (home of the `properties` template).
pub const GLOBAL_SCOPE: &str = "global";

/// Scope used for tenant-defined templates.
pub const ENTERPRISE_SCOPE: &str = "enterprise";
