//! REST surface for the medication schedule store.
//!
//! Routes are nested under `/api/`. Medication routes run behind
//! Auth → Audit → Handler; `/api/health` is open.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::medication_router;
pub use server::{start_server, ApiServer, ServerError};
pub use types::ApiContext;
