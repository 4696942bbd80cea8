pub mod member;
pub mod charge;
pub mod address;
pub mod admin;
pub mod validation;

pub use member::*;
pub use charge::*;
pub use address::*;
pub use admin::*;
