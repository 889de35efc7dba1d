//! Solar installation quoting: kit sizing, production valuation and loan
//! schedules driven by regional rule tables.

pub mod api;
pub mod config;
pub mod controller;
pub mod domain;
pub mod engine;
pub mod forecast;
pub mod rules;
pub mod telemetry;
