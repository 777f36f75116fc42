//! Signing and verification of decision payloads.
//!
//! The ledger, authority and gate only see the [`Signer`] trait. The HMAC
//! implementation is symmetric: anyone able to verify can also forge, so it
//! is only suitable for single-process deployments and tests. Use
//! [`Ed25519Signer`] when verification has to happen outside the trust
//! boundary of the authority.

use crate::errors::SignerError;
use ed25519_dalek::{Signature, SigningKey, VerifyingKey};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use synapse_canonical::sha256_hex;

type HmacSha256 = Hmac<Sha256>;

/// Checks signatures over UTF-8 payloads.
pub trait SignatureVerifier: Send + Sync {
    /// Returns `true` iff `signature` is the exact signature of `payload`.
    ///
    /// Must never panic on malformed input.
    fn verify(&self, payload: &str, signature: &str) -> bool;
}

/// Produces signatures over UTF-8 payloads.
pub trait Signer: SignatureVerifier {
    /// Signs `payload`. Output is lowercase hex.
    fn sign(&self, payload: &str) -> String;

    /// Public identification of the key: a fingerprint for symmetric keys,
    /// the hex verifying key for asymmetric ones.
    fn public_key(&self) -> String;

    /// Short stable identifier recorded next to each signature.
    fn signer_id(&self) -> String;
}

fn is_lower_hex(value: &str, len: usize) -> bool {
    value.len() == len && value.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// HMAC-SHA256 signer. Not for production use.
#[derive(Clone)]
pub struct HmacSigner {
    mac: HmacSha256,
    fingerprint: String,
}

impl std::fmt::Debug for HmacSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacSigner")
            .field("fingerprint", &self.fingerprint)
            .finish_non_exhaustive()
    }
}

impl HmacSigner {
    /// Builds a signer keyed with `seed`.
    pub fn from_seed(seed: impl AsRef<[u8]>) -> Result<Self, SignerError> {
        let seed = seed.as_ref();
        if seed.is_empty() {
            return Err(SignerError::EmptySeed);
        }
        let mac =
            HmacSha256::new_from_slice(seed).map_err(|e| SignerError::InvalidKey(e.to_string()))?;
        let mut hasher = Sha256::new();
        hasher.update(b"synapse-hmac-key:");
        hasher.update(seed);
        let fingerprint = hex::encode(hasher.finalize());
        Ok(Self { mac, fingerprint })
    }

    fn tag(&self, payload: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

impl SignatureVerifier for HmacSigner {
    fn verify(&self, payload: &str, signature: &str) -> bool {
        if !is_lower_hex(signature, 64) {
            return false;
        }
        let expected = self.tag(payload);
        bool::from(expected.as_bytes().ct_eq(signature.as_bytes()))
    }
}

impl Signer for HmacSigner {
    fn sign(&self, payload: &str) -> String {
        self.tag(payload)
    }

    fn public_key(&self) -> String {
        self.fingerprint.clone()
    }

    fn signer_id(&self) -> String {
        format!("hmac:{}", &self.fingerprint[..16])
    }
}

/// Ed25519 signer. Signatures are 128 lowercase hex characters.
pub struct Ed25519Signer {
    key: SigningKey,
    verifier: Ed25519Verifier,
}

impl std::fmt::Debug for Ed25519Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ed25519Signer")
            .field("public_key", &self.verifier.public_key_hex())
            .finish_non_exhaustive()
    }
}

impl Ed25519Signer {
    /// Derives the secret key as `SHA-256(seed)`.
    pub fn from_seed(seed: impl AsRef<[u8]>) -> Result<Self, SignerError> {
        let seed = seed.as_ref();
        if seed.is_empty() {
            return Err(SignerError::EmptySeed);
        }
        let secret: [u8; 32] = Sha256::digest(seed).into();
        let key = SigningKey::from_bytes(&secret);
        let verifier = Ed25519Verifier {
            key: key.verifying_key(),
        };
        Ok(Self { key, verifier })
    }

    /// Verifier holding only the public half.
    pub fn verifier(&self) -> Ed25519Verifier {
        self.verifier.clone()
    }
}

impl SignatureVerifier for Ed25519Signer {
    fn verify(&self, payload: &str, signature: &str) -> bool {
        self.verifier.verify(payload, signature)
    }
}

impl Signer for Ed25519Signer {
    fn sign(&self, payload: &str) -> String {
        use ed25519_dalek::Signer as _;
        hex::encode(self.key.sign(payload.as_bytes()).to_bytes())
    }

    fn public_key(&self) -> String {
        self.verifier.public_key_hex()
    }

    fn signer_id(&self) -> String {
        self.verifier.signer_id()
    }
}

/// Verify-only half of an Ed25519 key pair.
#[derive(Debug, Clone)]
pub struct Ed25519Verifier {
    key: VerifyingKey,
}

impl Ed25519Verifier {
    /// Parses a 64-character hex verifying key.
    pub fn from_public_key_hex(public_key: &str) -> Result<Self, SignerError> {
        let bytes = hex::decode(public_key).map_err(|e| SignerError::InvalidKey(e.to_string()))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| SignerError::InvalidKey("verifying key must be 32 bytes".into()))?;
        let key =
            VerifyingKey::from_bytes(&bytes).map_err(|e| SignerError::InvalidKey(e.to_string()))?;
        Ok(Self { key })
    }

    /// Hex encoding of the verifying key.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.key.as_bytes())
    }

    /// `ed25519:` followed by the first 16 hex characters of the key digest.
    pub fn signer_id(&self) -> String {
        format!("ed25519:{}", &sha256_hex(self.key.as_bytes())[..16])
    }
}

impl SignatureVerifier for Ed25519Verifier {
    fn verify(&self, payload: &str, signature: &str) -> bool {
        if !is_lower_hex(signature, 128) {
            return false;
        }
        let Ok(bytes) = hex::decode(signature) else {
            return false;
        };
        let Ok(bytes) = <[u8; 64]>::try_from(bytes.as_slice()) else {
            return false;
        };
        let signature = Signature::from_bytes(&bytes);
        self.key.verify_strict(payload.as_bytes(), &signature).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_seed_is_rejected() {
        assert!(matches!(HmacSigner::from_seed(""), Err(SignerError::EmptySeed)));
        assert!(matches!(Ed25519Signer::from_seed(b""), Err(SignerError::EmptySeed)));
    }

    #[test]
    fn hmac_round_trip() {
        let signer = HmacSigner::from_seed("seed").unwrap();
        let sig = signer.sign("payload");
        assert_eq!(sig.len(), 64);
        assert!(signer.verify("payload", &sig));
        assert!(!signer.verify("payload!", &sig));
    }

    #[test]
    fn hmac_rejects_uppercase_and_wrong_length() {
        let signer = HmacSigner::from_seed("seed").unwrap();
        let sig = signer.sign("payload");
        assert!(!signer.verify("payload", &sig.to_uppercase()));
        assert!(!signer.verify("payload", &sig[..63]));
        assert!(!signer.verify("payload", ""));
    }

    #[test]
    fn hmac_keys_differ_by_seed() {
        let a = HmacSigner::from_seed("a").unwrap();
        let b = HmacSigner::from_seed("b").unwrap();
        assert!(!b.verify("x", &a.sign("x")));
        assert_ne!(a.public_key(), b.public_key());
        assert!(a.signer_id().starts_with("hmac:"));
    }

    #[test]
    fn hmac_public_key_is_not_the_seed() {
        let signer = HmacSigner::from_seed("secret").unwrap();
        assert!(!signer.public_key().contains(&hex::encode("secret")));
        assert!(!format!("{signer:?}").contains("secret"));
    }

    #[test]
    fn ed25519_round_trip_through_public_key() {
        let signer = Ed25519Signer::from_seed("seed").unwrap();
        let sig = signer.sign("payload");
        assert_eq!(sig.len(), 128);
        let verifier = Ed25519Verifier::from_public_key_hex(&signer.public_key()).unwrap();
        assert!(verifier.verify("payload", &sig));
        assert!(!verifier.verify("other", &sig));
        assert_eq!(verifier.signer_id(), signer.signer_id());
    }

    #[test]
    fn ed25519_is_deterministic_per_seed() {
        let a = Ed25519Signer::from_seed("seed").unwrap();
        let b = Ed25519Signer::from_seed("seed").unwrap();
        assert_eq!(a.public_key(), b.public_key());
        assert_eq!(a.sign("x"), b.sign("x"));
    }

    #[test]
    fn ed25519_rejects_garbage() {
        let signer = Ed25519Signer::from_seed("seed").unwrap();
        assert!(!signer.verify("payload", &"zz".repeat(64)));
        assert!(!signer.verify("payload", &"00".repeat(64)));
        assert!(Ed25519Verifier::from_public_key_hex("abcd").is_err());
    }
}
