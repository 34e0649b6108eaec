//! API route handlers

mod analytics;
mod audit;
mod brands;
mod health;
mod prompts;
mod sse;

pub use analytics::{analytics_routes, AnalyticsResponse};
pub use audit::{audit_routes, AuditResponse};
pub use brands::{brand_routes, AddBrandRequest, AddBrandResponse};
pub use health::health_routes;
pub use prompts::prompt_routes;
pub use sse::event_stream;
