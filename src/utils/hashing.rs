// sha256 and base58 helpers shared by cache keys and message tokens

use sha2::{Digest, Sha256};

pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Base58 encoded sha256 of the concatenation of `parts`.
pub fn sha256_base58(parts: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    bs58::encode(hasher.finalize()).into_string()
}
