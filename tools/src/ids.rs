//! Synthetic identifiers for bookings and escalations.

use rand::Rng;

const LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";

fn sample(rng: &mut impl Rng, alphabet: &[u8], len: usize) -> String {
    (0..len)
        .map(|_| alphabet[rng.random_range(0..alphabet.len())] as char)
        .collect()
}

/// `PNR-` followed by three letters and three digits, e.g. `PNR-QZA417`.
pub fn generate_pnr(rng: &mut impl Rng) -> String {
    format!("PNR-{}{}", sample(rng, LETTERS, 3), sample(rng, DIGITS, 3))
}

/// `ESC-` followed by a five-digit number.
pub fn generate_escalation_id(rng: &mut impl Rng) -> String {
    format!("ESC-{}", rng.random_range(10000..=99999))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn pnr_shape() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..200 {
            let pnr = generate_pnr(&mut rng);
            let (prefix, code) = pnr.split_at(4);
            assert_eq!(prefix, "PNR-");
            assert_eq!(code.len(), 6);
            assert!(code[..3].chars().all(|c| c.is_ascii_uppercase()), "{pnr}");
            assert!(code[3..].chars().all(|c| c.is_ascii_digit()), "{pnr}");
        }
    }

    #[test]
    fn escalation_id_shape() {
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..200 {
            let id = generate_escalation_id(&mut rng);
            let number = id.strip_prefix("ESC-").unwrap();
            assert_eq!(number.len(), 5);
            assert!(number.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn same_seed_same_ids() {
        let a = generate_pnr(&mut StdRng::seed_from_u64(9));
        let b = generate_pnr(&mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
    }
}
