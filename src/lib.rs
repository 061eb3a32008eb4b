pub mod severity;
pub mod record;
pub mod handler;
pub mod format;
pub mod json;
pub mod correlate;
pub mod context;
pub mod logger;
pub mod middleware;
pub mod layer;
pub mod init;
pub mod env;
