pub mod app;
pub mod config;
pub mod engine;
pub mod event;
pub mod geo;
pub mod session;
pub mod ui;
