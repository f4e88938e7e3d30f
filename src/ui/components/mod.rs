pub mod bars;
pub mod browser;
pub mod globe;
pub mod info_panel;
pub mod menu;
pub mod progress_bar;
pub mod quiz_panel;
pub mod results;
