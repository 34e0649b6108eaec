//! Supporting services for the API layer

pub mod crawler;
pub mod rate_limiter;
pub mod site_scraper;
