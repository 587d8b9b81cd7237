//! Challenge generation for the credential-challenge surface.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

/// Generate a cryptographically random challenge for a device-bound
/// credential assertion (32 bytes → base64url, no padding).
pub fn generate_challenge() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rand::Rng::random(&mut rng);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn challenge_is_url_safe() {
        let c = generate_challenge();
        assert!(
            c.chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
        );
        // 32 bytes → 43 base64url chars.
        assert_eq!(c.len(), 43);
    }

    #[test]
    fn challenges_are_unique() {
        assert_ne!(generate_challenge(), generate_challenge());
    }
}
