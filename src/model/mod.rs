pub mod item;
pub mod layer;
pub mod tray;
pub mod recurrence;
pub mod settings;
pub mod board;
pub mod config;

pub use item::*;
pub use layer::*;
pub use tray::*;
pub use recurrence::*;
pub use settings::*;
pub use board::*;
pub use config::*;
