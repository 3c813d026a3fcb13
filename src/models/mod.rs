pub mod request;
pub mod response;
pub mod role;

pub use request::*;
pub use response::*;
pub use role::*;
