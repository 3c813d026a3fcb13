pub mod identity;
pub mod validation;

pub use identity::{client_identifier, session_token};
pub use validation::{validate_chat_messages, validate_email, validate_quote, validate_zip_code};
