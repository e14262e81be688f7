mod http_cache;
mod random_slowdown;
mod rate_limit;
mod requests_logging;

pub use http_cache::http_cache;
#[allow(unused_imports)] // Only layered with the slowdown feature
pub use random_slowdown::slowdown_request;
pub use rate_limit::{limit_per_minute, IpKeyExtractor};
pub use requests_logging::{log_requests, RequestsLoggingLevel};
