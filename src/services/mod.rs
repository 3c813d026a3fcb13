pub mod ai_chat;
pub mod rate_limiter;
pub mod roles;
