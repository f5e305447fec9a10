/// BLAKE3 hex digest of raw input bytes, taken before any decoding.
pub fn fingerprint(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}
