//! Domain models for the fabric warehouse

mod position;
mod roll;
mod search;
mod session;

pub use position::*;
pub use roll::*;
pub use search::*;
pub use session::*;
