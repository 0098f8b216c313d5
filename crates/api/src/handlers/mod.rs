pub mod health;
pub mod station;
pub mod tracks;
