pub mod quiz;
pub mod result;
pub mod schedule;
pub mod training;
