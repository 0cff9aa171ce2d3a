pub mod asset;
pub mod bet;
pub mod event;
pub mod grid;
pub mod price;

pub use asset::*;
pub use bet::*;
pub use event::*;
pub use grid::*;
pub use price::*;
