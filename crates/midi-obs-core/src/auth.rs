//! Authentication string derivation for the OBS WebSocket v5 handshake.
//!
//! When the OBS server has a password set, its `Hello` message carries a
//! random `salt` and `challenge`.  The client proves it knows the password by
//! running a two-round hash chain:
//!
//! ```text
//! secret      = base64( SHA-256( password || salt ) )
//! auth_string = base64( SHA-256( secret   || challenge ) )
//! ```
//!
//! The result must match the server's computation bit-for-bit, so the base64
//! alphabet is the standard one *with* padding.  A SHA-256 digest is 32 bytes,
//! which always encodes to 44 characters ending in a single `=`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256};

/// Length in characters of every string returned by [`derive_auth_string`].
pub const AUTH_STRING_LEN: usize = 44;

/// Derives the `authentication` value for an `Identify` message.
///
/// Pure and infallible: equal inputs always give equal output.
///
/// # Examples
///
/// ```rust
/// use midi_obs_core::auth::{derive_auth_string, AUTH_STRING_LEN};
///
/// let auth = derive_auth_string("password", "salt", "challenge");
/// assert_eq!(auth.len(), AUTH_STRING_LEN);
/// ```
pub fn derive_auth_string(password: &str, salt: &str, challenge: &str) -> String {
    let secret = sha256_base64(&[password.as_bytes(), salt.as_bytes()]);
    sha256_base64(&[secret.as_bytes(), challenge.as_bytes()])
}

/// Hashes the concatenation of `parts` and returns the padded base64 digest.
fn sha256_base64(parts: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    STANDARD.encode(hasher.finalize())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_base64_matches_known_digest() {
        // Arrange / Act
        let digest = sha256_base64(&[b"hello"]);

        // Assert
        assert_eq!(digest, "LPJNul+wow4m6DsqxbninhsWHlwfp0JecwQzYpOLmCQ=");
    }

    #[test]
    fn test_sha256_base64_concatenates_parts() {
        assert_eq!(sha256_base64(&[b"hel", b"lo"]), sha256_base64(&[b"hello"]));
    }

    #[test]
    fn test_derive_auth_string_matches_reference_vector() {
        // Arrange – intermediate secret for ("password", "salt") is
        // "eje4XIkY6sGakInA+loqtNzj+QUo3N7sEIsj3fNge5k="
        let secret = sha256_base64(&[b"password", b"salt"]);
        assert_eq!(secret, "eje4XIkY6sGakInA+loqtNzj+QUo3N7sEIsj3fNge5k=");

        // Act
        let auth = derive_auth_string("password", "salt", "challenge");

        // Assert
        assert_eq!(auth, "zTM5ki6L2vVvBQiTG9ckH1Lh64AbnCf6XZ226UmnkIA=");
    }

    #[test]
    fn test_derive_auth_string_is_deterministic() {
        let a = derive_auth_string("pw", "s4lt", "ch4llenge");
        let b = derive_auth_string("pw", "s4lt", "ch4llenge");
        assert_eq!(a, b);
    }

    #[test]
    fn test_derive_auth_string_changes_when_any_input_changes() {
        // Arrange
        let base = derive_auth_string("password", "salt", "challenge");

        // Act / Assert
        assert_ne!(base, derive_auth_string("Password", "salt", "challenge"));
        assert_ne!(base, derive_auth_string("password", "salT", "challenge"));
        assert_ne!(base, derive_auth_string("password", "salt", "challengE"));
    }

    #[test]
    fn test_derive_auth_string_is_44_chars_of_padded_base64() {
        for (password, salt, challenge) in [
            ("", "", ""),
            ("password", "salt", "challenge"),
            ("pässwörd ✓", "lM1GncleQOaCu9lT1yeUZhFYnqhsLLP1G5lAGo3ixaI=", "+IxH4CnCiqpX1rM9"),
        ] {
            let auth = derive_auth_string(password, salt, challenge);

            assert_eq!(auth.len(), AUTH_STRING_LEN);
            assert!(auth.ends_with('='), "expected single pad char in {auth}");
            assert!(!auth.ends_with("=="));
            assert!(auth
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '/' || c == '='));
        }
    }
}
