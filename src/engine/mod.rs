pub mod assignment;
pub mod tracking;
