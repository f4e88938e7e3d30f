pub mod compare;
pub mod continents;
pub mod hierarchy;
