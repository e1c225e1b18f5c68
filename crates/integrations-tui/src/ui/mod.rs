pub mod app;
pub mod data_panel;
pub mod footer;
pub mod header;
pub mod selector;
