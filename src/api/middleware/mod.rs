//! API middleware stack.
//!
//! Execution order (outermost → innermost):
//! 1. Auth validator: bearer token → owner
//! 2. Audit logger: logs after auth, has owner id

pub mod audit;
pub mod auth;
