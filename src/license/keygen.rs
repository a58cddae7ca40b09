//! License key generation.
//!
//! Keys look like `WG-7QK2-M0ZD-A91X`: a prefix followed by three groups of
//! four symbols drawn uniformly from `A-Z0-9`.

use rand::Rng;

use super::LicenseDocument;

/// Symbols a key body is drawn from.
pub const KEY_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Number of symbol groups after the prefix.
pub const KEY_GROUPS: usize = 3;

/// Symbols per group.
pub const KEY_GROUP_LEN: usize = 4;

/// Generates a candidate key. Uniqueness is not checked.
pub fn generate_key<R: Rng + ?Sized>(rng: &mut R, prefix: &str) -> String {
    let mut key = String::with_capacity(prefix.len() + KEY_GROUPS * (KEY_GROUP_LEN + 1));
    key.push_str(prefix);

    for _ in 0..KEY_GROUPS {
        key.push('-');
        for _ in 0..KEY_GROUP_LEN {
            let idx = rng.gen_range(0..KEY_ALPHABET.len());
            key.push(char::from(KEY_ALPHABET[idx]));
        }
    }

    key
}

/// Generates keys until one is found that `document` does not contain.
pub fn generate_unique_key<R: Rng + ?Sized>(
    rng: &mut R,
    prefix: &str,
    document: &LicenseDocument,
) -> String {
    loop {
        let key = generate_key(rng, prefix);
        if !document.contains_key(&key) {
            return key;
        }
        tracing::debug!("Generated key collides with an issued key, retrying");
    }
}

/// Checks that `key` has the shape produced by [`generate_key`].
#[must_use]
pub fn is_well_formed(key: &str, prefix: &str) -> bool {
    let Some(body) = key.strip_prefix(prefix) else {
        return false;
    };

    let groups: Vec<&str> = body.split('-').skip(1).collect();
    body.starts_with('-')
        && groups.len() == KEY_GROUPS
        && groups.iter().all(|group| {
            group.len() == KEY_GROUP_LEN && group.bytes().all(|b| KEY_ALPHABET.contains(&b))
        })
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::license::LicenseRecord;

    #[test]
    fn test_generate_key_format() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let key = generate_key(&mut rng, "WG");
            assert_eq!(key.len(), 17, "{key}");
            assert!(is_well_formed(&key, "WG"), "{key}");
        }
    }

    #[test]
    fn test_generate_key_custom_prefix() {
        let mut rng = StdRng::seed_from_u64(1);
        let key = generate_key(&mut rng, "PRO");
        assert!(key.starts_with("PRO-"));
        assert!(is_well_formed(&key, "PRO"));
    }

    #[test]
    fn test_generate_key_uses_whole_alphabet() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = [false; 36];
        for _ in 0..500 {
            let key = generate_key(&mut rng, "WG");
            for b in key.bytes().skip(3).filter(|b| *b != b'-') {
                let idx = KEY_ALPHABET.iter().position(|a| *a == b).unwrap();
                seen[idx] = true;
            }
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn test_generate_unique_key_skips_existing() {
        let first = generate_key(&mut StdRng::seed_from_u64(99), "WG");

        let mut document = LicenseDocument::default();
        document
            .insert(first.clone(), &LicenseRecord::new("HWID", 1, None))
            .unwrap();

        let unique = generate_unique_key(&mut StdRng::seed_from_u64(99), "WG", &document);
        assert_ne!(unique, first);
        assert!(!document.contains_key(&unique));
        assert!(is_well_formed(&unique, "WG"));
    }

    #[test]
    fn test_is_well_formed() {
        assert!(is_well_formed("WG-0000-0000-0000", "WG"));
        assert!(is_well_formed("WG-AB12-CD34-EF56", "WG"));
        assert!(!is_well_formed("WG-ab12-CD34-EF56", "WG"));
        assert!(!is_well_formed("WG-AB12-CD34", "WG"));
        assert!(!is_well_formed("WG-AB12-CD34-EF56-GH78", "WG"));
        assert!(!is_well_formed("XX-AB12-CD34-EF56", "WG"));
        assert!(!is_well_formed("WGAB12-CD34-EF56", "WG"));
        assert!(!is_well_formed("WG-AB1-CD345-EF56", "WG"));
    }
}
