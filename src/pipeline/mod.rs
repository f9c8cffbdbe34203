//! Pipeline entry points.
//!
//! - `TrendPipeline::run_cycle`: one ranking → details → snapshot cycle
//! - `run_schedule`: repeat cycles at a fixed interval until the end time

pub mod cycle;
pub mod schedule;

pub use cycle::{CycleReport, CycleState, TrendPipeline};
pub use schedule::{Schedule, ScheduleSummary, StopReason, run_schedule};
