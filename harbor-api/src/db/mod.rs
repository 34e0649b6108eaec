//! Database queries for harbor-api

pub mod brands;
