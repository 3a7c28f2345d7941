//! Access-code gate for the premium tabs (Performance, Comparison, Set
//! Pieces). The binary carries only a PBKDF2 digest of the code, never the
//! code itself.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;

const ACCESS_SALT: &[u8] = b"fpl-terminal-access-v1";
const PBKDF2_ROUNDS: u32 = 10_000;
// PBKDF2-HMAC-SHA256 digest of the distributed access code.
const EXPECTED_DIGEST_B64: &str = "nQHUrm6kaTfUraiqJuoTDnIYVFUv+ijy2eYfR19w+Y8=";

pub fn verify_access_code(code: &str) -> bool {
    let Ok(expected) = BASE64.decode(EXPECTED_DIGEST_B64) else {
        return false;
    };
    let mut derived = [0u8; 32];
    pbkdf2_hmac::<Sha256>(
        code.trim().as_bytes(),
        ACCESS_SALT,
        PBKDF2_ROUNDS,
        &mut derived,
    );
    derived.as_slice() == expected.as_slice()
}

/// Honor `FPL_ACCESS_CODE` at startup so a `.env` entry unlocks the premium
/// tabs without the prompt.
pub fn access_from_env() -> bool {
    std::env::var("FPL_ACCESS_CODE")
        .map(|code| verify_access_code(&code))
        .unwrap_or(false)
}
