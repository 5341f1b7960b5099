pub mod cli;
pub mod engine;
pub mod model;
pub mod store;
pub mod tui;
pub mod util;
