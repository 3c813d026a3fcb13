pub mod access_gate;
pub mod rate_limit;
