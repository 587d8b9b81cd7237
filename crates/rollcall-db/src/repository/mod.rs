//! SurrealDB implementations of the core store traits.

mod record;
mod session;

pub use record::SurrealRecordRepository;
pub use session::SurrealSessionRepository;
