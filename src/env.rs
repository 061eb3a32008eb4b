/// Environment variable names used by this crate for convenient
/// configuration from services.
///
/// These are purely helpers; the core types remain decoupled from
/// environment access and take their configuration explicitly.

/// Google Cloud project id used to build trace identifiers,
/// e.g. `my-project-123456`.
pub const GOOGLE_CLOUD_PROJECT_ENV: &str = "GOOGLE_CLOUD_PROJECT";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
