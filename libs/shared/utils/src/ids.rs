use rand::{Rng, RngCore};

/// Opaque account/appointment id: 12 random bytes, hex encoded.
pub fn generate_id() -> String {
    let mut bytes = [0u8; 12];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Hex token for email verification / password reset links: 20 random bytes.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 20];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// 8-digit numeric practitioner signup key.
pub fn generate_signup_key() -> String {
    let mut rng = rand::thread_rng();
    (0..8).map(|_| char::from(b'0' + rng.gen_range(0..10))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_is_24_hex_chars() {
        let id = generate_id();
        assert_eq!(id.len(), 24);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn signup_key_is_8_digits() {
        let key = generate_signup_key();
        assert_eq!(key.len(), 8);
        assert!(key.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn ids_are_unique_enough() {
        let a = generate_id();
        let b = generate_id();
        assert_ne!(a, b);
    }
}
