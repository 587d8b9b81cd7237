//! ROLLCALL QR — Payload codec and symbol rendering for attendance
//! sessions.
//!
//! Pure and stateless: a session reference goes in, one scannable
//! text string comes out, and back again.

pub mod error;
pub mod payload;
pub mod render;

pub use error::QrError;
pub use payload::{QrPayload, decode, encode};
pub use render::render_svg;
