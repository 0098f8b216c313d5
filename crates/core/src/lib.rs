//! Pure domain logic for the station scheduler.
//!
//! Nothing in this crate performs I/O. Everything here is a total function
//! over its inputs so it can be shared by the API, the scheduler and the
//! generation worker without pulling in the database layer.

pub mod clock;
pub mod eligibility;
pub mod error;
pub mod payment;
pub mod rating;
pub mod selection;
pub mod submission;
pub mod track_status;
pub mod types;
