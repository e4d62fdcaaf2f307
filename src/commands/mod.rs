pub mod issues;
pub mod schedule;
