mod cell;
mod column;
mod row;
mod selection;

pub use cell::*;
pub use column::*;
pub use row::*;
pub use selection::*;
