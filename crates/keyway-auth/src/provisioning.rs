//! Registration-token decryption and the Base32 secret codec.
//!
//! A provisioning token is issued out of band as
//! `base64(iv) ":" base64(ciphertext)`. The AES-256 key is the SHA-256
//! digest of the shared secret concatenated with the client identifier;
//! the cipher is CBC with PKCS#7 padding and the plaintext is a UTF-8
//! device identifier.
//!
//! Every decryption failure — malformed token, bad Base64, wrong key, bad
//! padding, non-UTF-8 plaintext — collapses to [`Error::InvalidToken`].
//! Callers learn that the token is unusable and nothing else; no partial
//! plaintext is ever exposed, and a rejected token must leave no trace in
//! the device registry.

use aes::cipher::{BlockDecryptMut, KeyIvInit, block_padding::Pkcs7};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use data_encoding::BASE32_NOPAD;
use keyway_core::{Error, Result};
use sha2::{Digest, Sha256};

type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Decrypt a provisioning token to the device identifier it carries.
pub fn decrypt_token(token: &str, shared_secret: &str, client_id: &str) -> Result<String> {
    let (iv_part, cipher_part) = token.split_once(':').ok_or(Error::InvalidToken)?;
    let iv = BASE64
        .decode(iv_part.trim())
        .map_err(|_| Error::InvalidToken)?;
    let ciphertext = BASE64
        .decode(cipher_part.trim())
        .map_err(|_| Error::InvalidToken)?;

    let mut digest = Sha256::new();
    digest.update(shared_secret.as_bytes());
    digest.update(client_id.as_bytes());
    let key: [u8; 32] = digest.finalize().into();

    let plaintext = Aes256CbcDec::new_from_slices(&key, &iv)
        .map_err(|_| Error::InvalidToken)?
        .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
        .map_err(|_| Error::InvalidToken)?;

    String::from_utf8(plaintext).map_err(|_| Error::InvalidToken)
}

/// RFC 4648 Base32 without padding characters (alphabet `A–Z`, `2–7`).
#[must_use]
pub fn encode_base32(data: &[u8]) -> String {
    BASE32_NOPAD.encode(data)
}

/// Exact inverse of [`encode_base32`].
pub fn decode_base32(encoded: &str) -> Result<Vec<u8>> {
    BASE32_NOPAD
        .decode(encoded.as_bytes())
        .map_err(|_| Error::InvalidToken)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aes::cipher::BlockEncryptMut;
    use proptest::prelude::*;
    use rstest::rstest;

    type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;

    const SHARED_SECRET: &str = "pe9MTzo9TNKZCFl1hR2Kg";
    const CLIENT_ID: &str = "client-0042";

    /// Issuer-side counterpart of [`decrypt_token`], for round trips.
    fn seal_token(plaintext: &str, shared_secret: &str, client_id: &str, iv: &[u8; 16]) -> String {
        let mut digest = Sha256::new();
        digest.update(shared_secret.as_bytes());
        digest.update(client_id.as_bytes());
        let key: [u8; 32] = digest.finalize().into();

        let ciphertext = Aes256CbcEnc::new_from_slices(&key, iv)
            .unwrap()
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());
        format!("{}:{}", BASE64.encode(iv), BASE64.encode(ciphertext))
    }

    fn test_iv() -> [u8; 16] {
        std::array::from_fn(|i| i as u8)
    }

    #[test]
    fn test_known_token_decrypts() {
        // seal_token("DOOR-7F2A-118C", SHARED_SECRET, CLIENT_ID, 00..0F)
        let token = "AAECAwQFBgcICQoLDA0ODw==:CAEjOXA/i5w8dQFYelAyRA==";
        assert_eq!(
            decrypt_token(token, SHARED_SECRET, CLIENT_ID).unwrap(),
            "DOOR-7F2A-118C"
        );
    }

    #[test]
    fn test_round_trip() {
        let token = seal_token("LOCK-0001", SHARED_SECRET, CLIENT_ID, &test_iv());
        assert_eq!(
            decrypt_token(&token, SHARED_SECRET, CLIENT_ID).unwrap(),
            "LOCK-0001"
        );
    }

    #[rstest]
    #[case(15, 0x01)] // final block: padding garbled
    #[case(0, 0x01)] // first block
    #[case(5, 0x80)]
    fn test_single_bit_corruption_is_rejected(#[case] index: usize, #[case] mask: u8) {
        let token = seal_token("DOOR-7F2A-118C", SHARED_SECRET, CLIENT_ID, &test_iv());
        let (iv_part, cipher_part) = token.split_once(':').unwrap();
        let mut ciphertext = BASE64.decode(cipher_part).unwrap();
        ciphertext[index] ^= mask;
        let corrupted = format!("{}:{}", iv_part, BASE64.encode(&ciphertext));

        assert_eq!(
            decrypt_token(&corrupted, SHARED_SECRET, CLIENT_ID),
            Err(Error::InvalidToken)
        );
    }

    #[rstest]
    #[case(SHARED_SECRET, "client-9999")] // wrong client id
    #[case("other-secret", CLIENT_ID)] // wrong shared secret
    fn test_wrong_key_material_is_rejected(#[case] secret: &str, #[case] client: &str) {
        let token = seal_token("DOOR-7F2A-118C", SHARED_SECRET, CLIENT_ID, &test_iv());
        assert_eq!(decrypt_token(&token, secret, client), Err(Error::InvalidToken));
    }

    #[rstest]
    #[case("")]
    #[case("no-separator")]
    #[case("not base64!:AAAA")]
    #[case("AAAA:not base64!")]
    #[case(":")]
    #[case("AAECAwQFBgcICQoLDA0ODw==:")] // empty ciphertext
    fn test_malformed_tokens_are_rejected(#[case] token: &str) {
        assert_eq!(
            decrypt_token(token, SHARED_SECRET, CLIENT_ID),
            Err(Error::InvalidToken)
        );
    }

    #[test]
    fn test_base32_known_vector() {
        assert_eq!(encode_base32(b"foobar"), "MZXW6YTBOI");
        assert_eq!(decode_base32("MZXW6YTBOI").unwrap(), b"foobar");
    }

    #[test]
    fn test_base32_never_emits_padding() {
        for len in 0..16 {
            let data = vec![0xA5u8; len];
            assert!(!encode_base32(&data).contains('='));
        }
    }

    #[test]
    fn test_base32_rejects_invalid_characters() {
        assert_eq!(decode_base32("MZXW6YTB0I"), Err(Error::InvalidToken)); // '0' not in alphabet
        assert_eq!(decode_base32("mzxw6ytboi"), Err(Error::InvalidToken)); // lowercase
    }

    proptest! {
        #[test]
        fn base32_round_trips(data in proptest::collection::vec(any::<u8>(), 0..=64)) {
            let encoded = encode_base32(&data);
            prop_assert_eq!(decode_base32(&encoded).unwrap(), data);
        }

        #[test]
        fn aes_round_trips(plaintext in "[ -~]{0,48}", iv in proptest::array::uniform16(any::<u8>())) {
            let token = seal_token(&plaintext, SHARED_SECRET, CLIENT_ID, &iv);
            prop_assert_eq!(
                decrypt_token(&token, SHARED_SECRET, CLIENT_ID).unwrap(),
                plaintext
            );
        }
    }
}
