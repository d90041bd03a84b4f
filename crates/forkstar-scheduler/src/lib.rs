pub mod frame;
pub mod periodic;
pub mod timer;

pub use frame::*;
pub use periodic::*;
pub use timer::*;
