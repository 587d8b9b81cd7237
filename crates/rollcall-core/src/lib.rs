//! ROLLCALL Core — Domain models, store contracts, and shared
//! abstractions for the QR attendance check-in protocol.

pub mod clock;
pub mod error;
pub mod geo;
pub mod models;
pub mod repository;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{RollcallError, RollcallResult};
