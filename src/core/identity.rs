//! Entity identity - short random identifiers checked against existing ids

use rand::Rng;

/// Number of characters in a generated id
pub const ID_LENGTH: usize = 5;

const ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generate a fresh id that `is_taken` rejects for none of the existing entities
///
/// Ids are drawn until one is free. The caller decides what "taken" means,
/// normally the union of item and product ids.
pub fn generate_id(is_taken: impl Fn(&str) -> bool) -> String {
    generate_id_with(&mut rand::rng(), is_taken)
}

/// Same as [`generate_id`] with an explicit random source
pub fn generate_id_with<R: Rng + ?Sized>(rng: &mut R, is_taken: impl Fn(&str) -> bool) -> String {
    loop {
        let candidate: String = (0..ID_LENGTH)
            .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
            .collect();
        if !is_taken(&candidate) {
            return candidate;
        }
        tracing::debug!(id = %candidate, "generated id already in use, retrying");
    }
}

/// Whether a string has the shape of a generated id
pub fn is_generated_shape(id: &str) -> bool {
    id.len() == ID_LENGTH && id.bytes().all(|b| ID_ALPHABET.contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_generated_id_format() {
        for _ in 0..100 {
            let id = generate_id(|_| false);
            assert_eq!(id.len(), ID_LENGTH);
            assert!(id
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
            assert!(is_generated_shape(&id));
        }
    }

    #[test]
    fn test_generated_ids_distinct_from_existing() {
        let mut existing: HashSet<String> = (0..200).map(|n| format!("E{:04}", n)).collect();
        let original: HashSet<String> = existing.clone();

        let mut fresh = Vec::new();
        for _ in 0..300 {
            let id = generate_id(|candidate| existing.contains(candidate));
            existing.insert(id.clone());
            fresh.push(id);
        }

        let unique: HashSet<_> = fresh.iter().collect();
        assert_eq!(unique.len(), fresh.len());
        assert!(fresh.iter().all(|id| !original.contains(id)));
    }

    #[test]
    fn test_collision_retries() {
        let first = generate_id_with(&mut StdRng::seed_from_u64(7), |_| false);
        let second = generate_id_with(&mut StdRng::seed_from_u64(7), |c| c == first);
        assert_ne!(first, second);
        assert!(is_generated_shape(&second));
    }

    #[test]
    fn test_shape_check() {
        assert!(is_generated_shape("A1B2C"));
        assert!(!is_generated_shape("a1b2c"));
        assert!(!is_generated_shape("P1"));
    }
}
