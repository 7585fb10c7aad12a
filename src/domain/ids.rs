// src/domain/ids.rs
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;

pub const DEFAULT_ID_BYTES: usize = 16;

/// Fresh lead id, e.g. `lead_Xy3...`. This is what the store should call.
pub fn new_lead_id() -> String {
    generate_id(&mut OsRng, "lead", DEFAULT_ID_BYTES)
}

pub fn new_note_id() -> String {
    generate_id(&mut OsRng, "note", DEFAULT_ID_BYTES)
}

/// Short random suffix used to keep placeholder emails unique.
pub fn short_suffix() -> String {
    let mut buf = [0u8; 6];
    OsRng.fill_bytes(&mut buf);
    base64_url_nopad(&buf).to_lowercase()
}

/// `<prefix>_<base64url(random bytes)>`
/// - URL-safe, no padding, so ids can sit in paths without encoding.
pub fn generate_id<R: RngCore>(rng: &mut R, prefix: &str, nbytes: usize) -> String {
    let mut buf = vec![0u8; nbytes];
    rng.fill_bytes(&mut buf);
    format!("{prefix}_{}", base64_url_nopad(&buf))
}

fn base64_url_nopad(bytes: &[u8]) -> String {
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}
