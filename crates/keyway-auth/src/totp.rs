//! Time-based one-time-password gate.
//!
//! Standard HMAC-SHA1 TOTP with a 30-second step and 6 digits: the step
//! counter is the big-endian message, the tag is dynamically truncated at
//! the offset named by the final nibble, and the 31-bit result is reduced
//! modulo 10^6 and zero-padded.
//!
//! Validation recomputes the code at call time and compares for exact
//! equality. There is deliberately no tolerance across the 30-second
//! boundary: a code that was valid a millisecond before the window rolled
//! is rejected a millisecond after.

use crate::clock::{Clock, SystemClock};
use hmac::{Hmac, Mac};
use keyway_core::constants::{TOTP_DIGITS, TOTP_STEP_SECONDS};
use sha1::Sha1;
use std::fmt;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

type HmacSha1 = Hmac<Sha1>;

/// Raw TOTP key material.
///
/// Zeroized on drop. The secret is whatever the provisioning flow decoded
/// — typically the Base32 decoding of a provisioned passphrase, which for
/// an ASCII passphrase is the passphrase's own bytes.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct TotpSecret(Vec<u8>);

impl TotpSecret {
    pub fn from_raw(bytes: impl Into<Vec<u8>>) -> Self {
        TotpSecret(bytes.into())
    }

    /// Key material from a provisioned passphrase.
    ///
    /// Mirrors the provisioning flow's encode-then-decode round trip: the
    /// key bytes are exactly the passphrase bytes.
    pub fn from_passphrase(passphrase: &str) -> Self {
        TotpSecret(passphrase.as_bytes().to_vec())
    }

    /// Key material from an unpadded Base32 string.
    pub fn from_base32(encoded: &str) -> keyway_core::Result<Self> {
        crate::provisioning::decode_base32(encoded).map(TotpSecret)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for TotpSecret {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // Key material stays out of logs.
        write!(f, "TotpSecret({} bytes)", self.0.len())
    }
}

/// Generate the 6-digit code for the window containing `now_unix`.
#[must_use]
pub fn generate(secret: &TotpSecret, now_unix: u64) -> String {
    let step = now_unix / TOTP_STEP_SECONDS;
    let mut mac = HmacSha1::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(&step.to_be_bytes());
    let hash = mac.finalize().into_bytes();

    let offset = (hash[hash.len() - 1] & 0x0F) as usize;
    let code = ((hash[offset] & 0x7F) as u32) << 24
        | (hash[offset + 1] as u32) << 16
        | (hash[offset + 2] as u32) << 8
        | hash[offset + 3] as u32;

    format!("{:0width$}", code % 1_000_000, width = TOTP_DIGITS)
}

/// Check `candidate` against the code for the window containing
/// `now_unix`, in constant time.
#[must_use]
pub fn validate(secret: &TotpSecret, candidate: &str, now_unix: u64) -> bool {
    let expected = generate(secret, now_unix);
    bool::from(candidate.as_bytes().ct_eq(expected.as_bytes()))
}

/// Authorization gate for state-changing commands.
///
/// Every physical command that changes peripheral state must pass
/// [`AuthorizationGate::validate`] before it is sent. The check is purely
/// client-side against the provisioned secret.
///
/// # Examples
///
/// ```
/// use keyway_auth::TotpSecret;
/// use keyway_auth::totp::{generate, validate};
///
/// let secret = TotpSecret::from_passphrase("pe9MTzo9TNKZCFl1hR2Kg");
/// let code = generate(&secret, 1_700_000_000);
/// assert!(validate(&secret, &code, 1_700_000_000));
/// // The next window rejects it.
/// assert!(!validate(&secret, &code, 1_700_000_040));
/// ```
#[derive(Debug, Clone)]
pub struct AuthorizationGate<C: Clock = SystemClock> {
    secret: TotpSecret,
    clock: C,
}

impl AuthorizationGate<SystemClock> {
    pub fn new(secret: TotpSecret) -> Self {
        AuthorizationGate {
            secret,
            clock: SystemClock,
        }
    }
}

impl<C: Clock> AuthorizationGate<C> {
    pub fn with_clock(secret: TotpSecret, clock: C) -> Self {
        AuthorizationGate { secret, clock }
    }

    /// The code for the current window.
    #[must_use]
    pub fn generate(&self) -> String {
        generate(&self.secret, self.clock.now_unix())
    }

    /// Validate a user-entered code against the current window.
    #[must_use]
    pub fn validate(&self, candidate: &str) -> bool {
        validate(&self.secret, candidate, self.clock.now_unix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn rfc_secret() -> TotpSecret {
        // The RFC 6238 reference secret.
        TotpSecret::from_raw(*b"12345678901234567890")
    }

    #[rstest]
    #[case(59, "287082")]
    #[case(1_111_111_109, "081804")]
    fn test_rfc6238_vectors_truncated_to_six_digits(#[case] t: u64, #[case] expected: &str) {
        assert_eq!(generate(&rfc_secret(), t), expected);
    }

    #[test]
    fn test_codes_stable_within_a_window() {
        let secret = TotpSecret::from_passphrase("pe9MTzo9TNKZCFl1hR2Kg");
        assert_eq!(generate(&secret, 0), "658930");
        assert_eq!(generate(&secret, 29), "658930");
    }

    #[test]
    fn test_code_flips_at_window_boundary() {
        let secret = TotpSecret::from_passphrase("pe9MTzo9TNKZCFl1hR2Kg");
        assert_eq!(generate(&secret, 29), "658930");
        assert_eq!(generate(&secret, 30), "345443");
    }

    #[rstest]
    #[case(0)]
    #[case(59)]
    #[case(1_700_000_000)]
    #[case(u64::MAX / 2)]
    fn test_output_is_always_six_ascii_digits(#[case] t: u64) {
        let code = generate(&rfc_secret(), t);
        assert_eq!(code.len(), 6);
        assert!(code.bytes().all(|b| b.is_ascii_digit()));
    }

    #[test]
    fn test_validate_accepts_only_exact_current_code() {
        let secret = TotpSecret::from_passphrase("pe9MTzo9TNKZCFl1hR2Kg");
        assert!(validate(&secret, "658930", 15));
        assert!(!validate(&secret, "658931", 15));
        assert!(!validate(&secret, "65893", 15));
        assert!(!validate(&secret, "", 15));
    }

    #[test]
    fn test_no_tolerance_across_the_boundary() {
        let secret = TotpSecret::from_passphrase("pe9MTzo9TNKZCFl1hR2Kg");
        // Valid at t=29, rejected at t=30.
        assert!(validate(&secret, "658930", 29));
        assert!(!validate(&secret, "658930", 30));
    }

    #[test]
    fn test_gate_with_pinned_clock() {
        #[derive(Clone, Copy)]
        struct At(u64);
        impl Clock for At {
            fn now_unix(&self) -> u64 {
                self.0
            }
        }

        let gate = AuthorizationGate::with_clock(
            TotpSecret::from_passphrase("pe9MTzo9TNKZCFl1hR2Kg"),
            At(29),
        );
        assert_eq!(gate.generate(), "658930");
        assert!(gate.validate("658930"));
        assert!(!gate.validate("345443"));
    }

    #[test]
    fn test_secret_debug_does_not_leak_material() {
        let secret = TotpSecret::from_passphrase("super-secret");
        assert!(!format!("{secret:?}").contains("super-secret"));
    }

    #[test]
    fn test_base32_secret_equals_passphrase_secret() {
        let passphrase = "pe9MTzo9TNKZCFl1hR2Kg";
        let encoded = crate::provisioning::encode_base32(passphrase.as_bytes());
        let decoded = TotpSecret::from_base32(&encoded).unwrap();
        assert_eq!(decoded, TotpSecret::from_passphrase(passphrase));
    }
}
