//! Boxed Deoxys-II-256-128, the misuse-resistant AEAD confidential EVM nodes
//! use for calldata and call-result envelopes.
//!
//! The boxed construction derives the symmetric key from an X25519 shared
//! secret; both sides of a request/response exchange end up with the same
//! key, so a response can be opened with the key derived for the request.
use hmac::{Hmac, Mac as _};
use sha2::Sha512_256;
use x25519_dalek::{PublicKey, StaticSecret};

pub use deoxysii::{KEY_SIZE, NONCE_SIZE, TAG_SIZE};

/// Domain separator for the boxed-AEAD key derivation.
const BOX_KDF_TWEAK: &[u8] = b"MRAE_Box_Deoxys-II-256-128";

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("unable to decrypt message or authenticate additional data")]
    DecryptionFailed,
}

/// Derives the symmetric encryption key shared with `peer_public_key`.
pub fn derive_symmetric_key(peer_public_key: &[u8; 32], secret: &StaticSecret) -> [u8; KEY_SIZE] {
    let shared = secret.diffie_hellman(&PublicKey::from(*peer_public_key));
    let mut kdf =
        Hmac::<Sha512_256>::new_from_slice(BOX_KDF_TWEAK).expect("hmac accepts any key length");
    kdf.update(shared.as_bytes());
    let mut key = [0u8; KEY_SIZE];
    key.copy_from_slice(&kdf.finalize().into_bytes());
    key
}

/// Encrypts and authenticates `message`, authenticating `additional_text`
/// alongside it.
pub fn seal(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
    message: &[u8],
    additional_text: &[u8],
) -> Vec<u8> {
    deoxysii::DeoxysII::new(key).seal(nonce, message.to_vec(), additional_text.to_vec())
}

/// Decrypts and authenticates `message`, which must carry the AEAD tag
/// produced by [`seal`].
pub fn open(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
    message: &[u8],
    additional_text: &[u8],
) -> Result<Vec<u8>, Error> {
    deoxysii::DeoxysII::new(key)
        .open(nonce, message.to_vec(), additional_text.to_vec())
        .map_err(|_| Error::DecryptionFailed)
}

#[cfg(test)]
mod test {
    use rand::rngs::OsRng;

    use super::*;

    #[test]
    fn test_basic_roundtrip() {
        let key = [0x33; KEY_SIZE];
        let nonce = *b"0123456789abcde";
        let message = b"a message to mangle";
        let ad = b"additional data";

        let sealed = seal(&key, &nonce, message, ad);
        assert_eq!(open(&key, &nonce, &sealed, ad).unwrap(), message);
        assert_eq!(
            open(&key, &nonce, &sealed, b"some other additional data").unwrap_err(),
            Error::DecryptionFailed,
        );
        assert_eq!(
            open(&key, &nonce, message, ad).unwrap_err(),
            Error::DecryptionFailed,
        );
    }

    #[test]
    fn test_tampered_ciphertext() {
        let key = [0x44; KEY_SIZE];
        let nonce = [0u8; NONCE_SIZE];
        let mut sealed = seal(&key, &nonce, b"payload", &[]);
        sealed[0] ^= 1;
        assert!(open(&key, &nonce, &sealed, &[]).is_err());
    }

    #[test]
    fn test_key_derivation_is_symmetric() {
        let ours = StaticSecret::random_from_rng(OsRng);
        let theirs = StaticSecret::random_from_rng(OsRng);
        let our_key = derive_symmetric_key(PublicKey::from(&theirs).as_bytes(), &ours);
        let their_key = derive_symmetric_key(PublicKey::from(&ours).as_bytes(), &theirs);
        assert_eq!(our_key, their_key);

        let nonce = [7u8; NONCE_SIZE];
        let sealed = seal(&our_key, &nonce, b"boxed", &[]);
        assert_eq!(open(&their_key, &nonce, &sealed, &[]).unwrap(), b"boxed");
    }
}
