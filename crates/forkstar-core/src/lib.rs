pub mod config;
pub mod parallax;
pub mod scroll;
pub mod smooth_scroll;
pub mod transition;
pub mod ui_state;

pub use config::*;
pub use parallax::*;
pub use scroll::*;
pub use smooth_scroll::*;
pub use transition::*;
pub use ui_state::*;
