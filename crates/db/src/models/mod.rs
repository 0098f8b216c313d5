//! Domain model structs and DTOs.
//!
//! Each submodule contains a `FromRow` + `Serialize` entity struct matching
//! the database row, plus any `Deserialize` DTOs used to create rows.

pub mod reaction;
pub mod station;
pub mod track;
