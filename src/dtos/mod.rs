pub mod consultationdtos;
pub mod filters;

pub use consultationdtos::*;
pub use filters::*;
