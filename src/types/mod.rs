//! Core type definitions using newtype patterns for type safety.
//!
//! Levels and grades are closed enumerations so an unknown level or grade
//! label can never reach the statistics map.

mod grade;
mod instant;
mod level;
mod result_id;
mod score;

pub use grade::{Grade, GradeInfo, PASS_THRESHOLD};
pub use instant::{lenient_instant, lenient_optional_instant, parse_instant};
pub use level::{LevelError, TestLevel};
pub use result_id::{ResultId, ResultIdError};
pub use score::{finite_percentage, lenient_count, lenient_percentage};
