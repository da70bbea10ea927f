//! HTTP middleware

pub mod audit;
pub mod metrics;
pub mod rate_limit;
pub mod request_id;
pub mod tenant;

pub use audit::audit_middleware;
pub use metrics::metrics_middleware;
pub use rate_limit::{create_rate_limiter, rate_limit_middleware};
pub use request_id::request_id_middleware;
pub use tenant::tenant_middleware;
