// Wire-row normalization. Everything here is pure and total so the store
// can transform at read time without error paths.
pub mod entities;
pub mod fields;

pub use entities::*;
pub use fields::*;
