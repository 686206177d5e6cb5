use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::Hmac;
use pbkdf2::pbkdf2;
use rand::RngCore;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "pbkdf2:sha256";
const ITERATIONS: u32 = 260_000;
const SALT_LENGTH: usize = 16;
const KEY_LENGTH: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("malformed password hash")]
    Malformed,
    #[error("key derivation failed")]
    Derivation,
}

/// Hash un mot de passe au format `pbkdf2:sha256:<iterations>$<salt>$<hash>`
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);

    let key = derive(password, &salt, ITERATIONS, KEY_LENGTH)?;

    Ok(format!(
        "{}:{}${}${}",
        ALGORITHM,
        ITERATIONS,
        URL_SAFE_NO_PAD.encode(salt),
        URL_SAFE_NO_PAD.encode(key)
    ))
}

/// Vérifie un mot de passe contre un hash stocké
/// Le salt et le hash peuvent être en base64 (format actuel) ou en hex (anciens comptes)
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, PasswordError> {
    let mut parts = stored_hash.split('$');
    let (Some(header), Some(salt), Some(hash), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(PasswordError::Malformed);
    };

    let iterations = header
        .strip_prefix(ALGORITHM)
        .and_then(|rest| rest.strip_prefix(':'))
        .and_then(|n| n.parse::<u32>().ok())
        .ok_or(PasswordError::Malformed)?;

    let salt = decode_component(salt)?;
    let expected = decode_component(hash)?;
    if expected.is_empty() {
        return Err(PasswordError::Malformed);
    }

    let computed = derive(password, &salt, iterations, expected.len())?;
    Ok(constant_time_eq(&computed, &expected))
}

fn derive(password: &str, salt: &[u8], iterations: u32, len: usize) -> Result<Vec<u8>, PasswordError> {
    let mut key = vec![0u8; len];
    pbkdf2::<HmacSha256>(password.as_bytes(), salt, iterations, &mut key)
        .map_err(|_| PasswordError::Derivation)?;
    Ok(key)
}

fn decode_component(input: &str) -> Result<Vec<u8>, PasswordError> {
    // Anciens hash: 64 caractères hex
    if input.len() == 64 && input.chars().all(|c| c.is_ascii_hexdigit()) {
        return hex::decode(input).map_err(|_| PasswordError::Malformed);
    }
    URL_SAFE_NO_PAD
        .decode(input.trim_end_matches('='))
        .map_err(|_| PasswordError::Malformed)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
