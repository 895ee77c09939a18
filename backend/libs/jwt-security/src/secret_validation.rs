//! Signing secret provisioning and strength checks
//!
//! HMAC signing is only as strong as the shared secret, so new secrets come
//! from the OS random source and configured ones are graded before use.

use crate::error::AuthError;
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

const MIN_SECRET_LENGTH: usize = 32; // 256 bits minimum
const RECOMMENDED_SECRET_LENGTH: usize = 64; // 512 bits recommended
const PATTERN_RUN: usize = 6;

/// Secret strength classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretStrength {
    Weak,
    Acceptable,
    Strong,
}

/// Grade an HMAC secret.
///
/// **Criteria**:
/// - Minimum 32 bytes (256 bits)
/// - Recommended 64 bytes (512 bits)
/// - Shannon entropy of at least 3.5 bits/byte
/// - No obvious patterns (runs of six repeating or ascending bytes)
pub fn validate_secret_strength(secret: &[u8]) -> SecretStrength {
    if secret.len() < MIN_SECRET_LENGTH {
        return SecretStrength::Weak;
    }

    let entropy = calculate_shannon_entropy(secret);
    if entropy < 3.5 || has_obvious_patterns(secret) {
        return SecretStrength::Weak;
    }

    if secret.len() >= RECOMMENDED_SECRET_LENGTH {
        SecretStrength::Strong
    } else {
        SecretStrength::Acceptable
    }
}

/// Bits per byte (0-8 scale)
fn calculate_shannon_entropy(data: &[u8]) -> f64 {
    let mut freq = [0u32; 256];
    let len = data.len() as f64;

    for &byte in data {
        freq[byte as usize] += 1;
    }

    freq.iter()
        .filter(|&&count| count > 0)
        .map(|&count| {
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Runs of identical ("aaaaaa") or ascending ("123456") bytes
fn has_obvious_patterns(data: &[u8]) -> bool {
    data.windows(PATTERN_RUN).any(|w| {
        let repeating = w.iter().all(|&b| b == w[0]);
        let sequential = w
            .windows(2)
            .all(|pair| pair[1] as i16 - pair[0] as i16 == 1);
        repeating || sequential
    })
}

/// Generate `length` random bytes from the OS and return them hex-encoded
/// (upper case, `2 * length` characters).
///
/// Intended for provisioning a new [`TokenAuthority`](crate::TokenAuthority).
pub fn generate_secret(length: usize) -> Result<String, AuthError> {
    let mut buffer = Zeroizing::new(vec![0u8; length]);
    OsRng
        .try_fill_bytes(&mut buffer)
        .map_err(|e| AuthError::RandomSource(e.to_string()))?;

    Ok(hex::encode_upper(buffer.as_slice()))
}
