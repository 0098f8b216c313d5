//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument. Status writes always guard on
//! the expected source status so a row can only move along the track state
//! machine.

pub mod reaction_repo;
pub mod station_repo;
pub mod track_repo;

pub use reaction_repo::ReactionRepo;
pub use station_repo::StationRepo;
pub use track_repo::TrackRepo;
