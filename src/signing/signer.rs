//! Signer capability
//!
//! A signer receives a 32-byte digest plus the identity it should sign for and
//! returns a raw 65-byte recoverable signature, `r ‖ s ‖ recid`. The session
//! never sees key material.

use std::collections::HashMap;
use std::fmt;

use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{All, Message, Secp256k1, SecretKey};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::codec::{Curve, PublicKey, Signature};
use crate::error::{TxKitError, TxKitResult};

use super::canonical::{RAW_SIGNATURE_LEN, RECOVERY_MAGIC};

/// Identity a signature is requested from (address, key or account)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignerId(String);

impl SignerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SignerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SignerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A digest to sign on behalf of one signer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRequest {
    #[serde(with = "hex_digest")]
    pub digest: [u8; 32],
    pub signer: SignerId,
    /// Attempt this request belongs to
    pub attempt: u32,
}

impl SignatureRequest {
    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest)
    }
}

/// A raw signature returned by a signer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureResponse {
    pub signer: SignerId,
    #[serde(with = "hex_bytes")]
    pub signature: Vec<u8>,
}

impl SignatureResponse {
    pub fn new(signer: SignerId, signature: Vec<u8>) -> Self {
        Self { signer, signature }
    }
}

/// Signing capability injected into a session
pub trait Signer {
    fn sign(&self, digest: &[u8; 32], signer: &SignerId) -> TxKitResult<Vec<u8>>;
}

impl<F> Signer for F
where
    F: Fn(&[u8; 32], &SignerId) -> TxKitResult<Vec<u8>>,
{
    fn sign(&self, digest: &[u8; 32], signer: &SignerId) -> TxKitResult<Vec<u8>> {
        self(digest, signer)
    }
}

/// In-process secp256k1 signer holding one key per identity
pub struct LocalKeySigner {
    secp: Secp256k1<All>,
    keys: HashMap<SignerId, SecretKey>,
}

impl LocalKeySigner {
    pub fn new() -> Self {
        Self {
            secp: Secp256k1::new(),
            keys: HashMap::new(),
        }
    }

    /// Register a hex-encoded 32-byte secret key for `signer`
    pub fn add_key_hex(&mut self, signer: SignerId, private_key_hex: &str) -> TxKitResult<()> {
        let bytes = Zeroizing::new(hex::decode(private_key_hex.trim_start_matches("0x"))?);
        if bytes.len() != 32 {
            return Err(TxKitError::crypto_error(format!(
                "private key must be 32 bytes, got {}",
                bytes.len()
            )));
        }
        let key = SecretKey::from_slice(&bytes)?;
        self.keys.insert(signer, key);
        Ok(())
    }

    pub fn with_key_hex(mut self, signer: impl Into<String>, private_key_hex: &str) -> TxKitResult<Self> {
        self.add_key_hex(SignerId::new(signer), private_key_hex)?;
        Ok(self)
    }

    /// Compressed K1 public key of a registered identity
    pub fn public_key(&self, signer: &SignerId) -> Option<PublicKey> {
        self.keys.get(signer).map(|key| PublicKey {
            curve: Curve::K1,
            content: key.public_key(&self.secp).serialize().to_vec(),
        })
    }

    pub fn signer_ids(&self) -> impl Iterator<Item = &SignerId> {
        self.keys.keys()
    }
}

impl Default for LocalKeySigner {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LocalKeySigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&SignerId> = self.keys.keys().collect();
        ids.sort();
        f.debug_struct("LocalKeySigner").field("signers", &ids).finish()
    }
}

impl Drop for LocalKeySigner {
    fn drop(&mut self) {
        for key in self.keys.values_mut() {
            key.non_secure_erase();
        }
    }
}

impl Signer for LocalKeySigner {
    fn sign(&self, digest: &[u8; 32], signer: &SignerId) -> TxKitResult<Vec<u8>> {
        let key = self
            .keys
            .get(signer)
            .ok_or_else(|| TxKitError::signer(format!("no key registered for signer '{}'", signer)))?;

        let message = Message::from_digest(*digest);
        let (recovery_id, compact) = self.secp.sign_ecdsa_recoverable(&message, key).serialize_compact();

        let mut out = Vec::with_capacity(RAW_SIGNATURE_LEN);
        out.extend_from_slice(&compact);
        out.push(recovery_id.to_i32() as u8);
        Ok(out)
    }
}

/// Recover the K1 public key that produced a recovery-byte-first signature
pub fn recover_public_key(signature: &Signature, digest: &[u8; 32]) -> TxKitResult<PublicKey> {
    signature.validate()?;
    if signature.curve != Curve::K1 {
        return Err(TxKitError::invalid_signature(format!(
            "cannot recover {} signatures",
            signature.curve.suffix()
        )));
    }

    let content = &signature.content;
    let recovery = content[0].checked_sub(RECOVERY_MAGIC).unwrap_or(content[0]);
    // Compressed-key flag
    let recovery = if recovery >= 4 { recovery - 4 } else { recovery };
    let recovery_id = RecoveryId::from_i32(recovery as i32)
        .map_err(|e| TxKitError::invalid_signature(e.to_string()))?;
    let recoverable = RecoverableSignature::from_compact(&content[1..], recovery_id)
        .map_err(|e| TxKitError::invalid_signature(e.to_string()))?;

    let secp = Secp256k1::verification_only();
    let key = secp.recover_ecdsa(&Message::from_digest(*digest), &recoverable)?;
    Ok(PublicKey {
        curve: Curve::K1,
        content: key.serialize().to_vec(),
    })
}

mod hex_digest {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(digest: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(digest))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 32], D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("digest must be 32 bytes"))
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signing::canonical::SignatureCanonicalizer;

    const KEY_HEX: &str = "0101010101010101010101010101010101010101010101010101010101010101";

    #[test]
    fn test_local_signer_returns_recovery_byte_last() {
        let signer = LocalKeySigner::new().with_key_hex("alice", KEY_HEX).unwrap();
        let digest = [7u8; 32];
        let raw = signer.sign(&digest, &SignerId::new("alice")).unwrap();
        assert_eq!(raw.len(), RAW_SIGNATURE_LEN);
        assert!(raw[64] <= 3);
    }

    #[test]
    fn test_recover_matches_signing_key() {
        let id = SignerId::new("alice");
        let signer = LocalKeySigner::new().with_key_hex("alice", KEY_HEX).unwrap();
        let digest = [9u8; 32];

        let raw = signer.sign(&digest, &id).unwrap();
        let relocated = SignatureCanonicalizer::relocate_recovery_byte(&raw).unwrap();
        let sig = Signature::new(Curve::K1, relocated.to_vec()).unwrap();

        let recovered = recover_public_key(&sig, &digest).unwrap();
        assert_eq!(Some(recovered), signer.public_key(&id));
    }

    #[test]
    fn test_unknown_signer() {
        let signer = LocalKeySigner::new();
        let err = signer.sign(&[0u8; 32], &SignerId::new("nobody")).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::Signer);
    }

    #[test]
    fn test_rejects_bad_keys() {
        let mut signer = LocalKeySigner::new();
        assert!(signer.add_key_hex(SignerId::new("a"), "zz").is_err());
        assert!(signer.add_key_hex(SignerId::new("a"), "0102").is_err());
        // Zero is not a valid scalar
        assert!(signer.add_key_hex(SignerId::new("a"), &"00".repeat(32)).is_err());
    }

    #[test]
    fn test_debug_hides_keys() {
        let signer = LocalKeySigner::new().with_key_hex("alice", KEY_HEX).unwrap();
        let shown = format!("{:?}", signer);
        assert!(shown.contains("alice"));
        assert!(!shown.contains("0101"));
    }

    #[test]
    fn test_closure_signer() {
        let fixed = |_: &[u8; 32], _: &SignerId| -> TxKitResult<Vec<u8>> { Ok(vec![0u8; 65]) };
        assert_eq!(fixed.sign(&[0u8; 32], &SignerId::new("x")).unwrap().len(), 65);
    }

    #[test]
    fn test_request_json_uses_hex() {
        let request = SignatureRequest {
            digest: [0xab; 32],
            signer: SignerId::new("alice"),
            attempt: 3,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains(&"ab".repeat(32)));
        assert!(json.contains("\"signer\":\"alice\""));
        let back: SignatureRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, request);
    }
}
