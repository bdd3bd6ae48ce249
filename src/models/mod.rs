// Canonical entities, post-transform
pub mod consultationmodel;
pub mod favoritemodel;
pub mod newsmodel;
pub mod projectmodel;
pub mod propertymodel;
pub mod usermodel;

pub use consultationmodel::*;
pub use favoritemodel::*;
pub use newsmodel::*;
pub use projectmodel::*;
pub use propertymodel::*;
pub use usermodel::*;
