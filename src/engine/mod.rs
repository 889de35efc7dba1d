//! Sizing and financial comparison engine.
//!
//! Everything here is synchronous and side-effect free; callers share the
//! rule tables read-only and may run scenarios concurrently.

pub mod amortization;
pub mod error;
pub mod production;
pub mod scenario;
pub mod sizing;

pub use amortization::{
    amortize, build_schedule, build_tier_quotes, pick_optimal_duration, PrincipalAdjustments,
};
pub use error::EngineError;
pub use production::{bill_summary, split_production};
pub use scenario::{build_scenario, resolve_kit, ScenarioRequest};
pub use sizing::{select_kit, SizingConstants};
