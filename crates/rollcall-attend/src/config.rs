//! Protocol configuration.

use chrono::Duration;

/// Tunables for session issuance and check-in validation.
///
/// Which verification gates run (and in what order) is deployment
/// policy, configured on the [`crate::VerificationChain`] itself; an
/// empty chain is the plain-scan variant.
#[derive(Debug, Clone)]
pub struct AttendConfig {
    /// Session validity window. The canonical deployment uses 90
    /// seconds; one revision ran hour-long sessions, so this is a
    /// parameter rather than a constant.
    pub validity: Duration,
    /// Whether the issuing principal's id is embedded in the QR
    /// payload.
    pub embed_issuer: bool,
    /// Accept radius for the location gate, in meters.
    pub location_radius_m: f64,
    /// One-shot geolocation acquisition timeout.
    pub position_timeout: std::time::Duration,
}

impl Default for AttendConfig {
    fn default() -> Self {
        Self {
            validity: Duration::seconds(90),
            embed_issuer: true,
            location_radius_m: 200.0,
            position_timeout: std::time::Duration::from_secs(10),
        }
    }
}
