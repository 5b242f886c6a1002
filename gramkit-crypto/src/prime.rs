//! Probabilistic primality testing for DH parameter validation.

use num_bigint::BigUint;
use num_traits::{One, Zero};

/// Rounds used by [`is_probable_prime_default`]. Each round has error
/// probability at most 1/4, so 32 rounds bound it by 2⁻⁶⁴.
pub const DEFAULT_ROUNDS: usize = 32;

const SMALL_PRIMES: [u32; 25] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
];

/// A uniformly chosen witness in `[2, n - 2]`. `n` must be at least 5.
fn random_base(n: &BigUint) -> BigUint {
    let mut bytes = vec![0u8; n.to_bytes_be().len() + 8];
    crate::random::fill(&mut bytes);
    let span = n - 3u32;
    BigUint::from_bytes_be(&bytes) % span + 2u32
}

/// Miller-Rabin with `rounds` random bases.
pub fn is_probable_prime(n: &BigUint, rounds: usize) -> bool {
    if n < &BigUint::from(2u32) {
        return false;
    }
    for &p in &SMALL_PRIMES {
        let p = BigUint::from(p);
        if n == &p {
            return true;
        }
        if (n % &p).is_zero() {
            return false;
        }
    }

    let one = BigUint::one();
    let n_minus_one = n - &one;
    let s = n_minus_one.trailing_zeros().unwrap_or(0);
    let d = &n_minus_one >> s;

    'witness: for _ in 0..rounds {
        let a = random_base(n);
        let mut x = a.modpow(&d, n);
        if x == one || x == n_minus_one {
            continue;
        }
        for _ in 1..s {
            x = x.modpow(&BigUint::from(2u32), n);
            if x == n_minus_one {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

/// [`is_probable_prime`] with [`DEFAULT_ROUNDS`].
pub fn is_probable_prime_default(n: &BigUint) -> bool {
    is_probable_prime(n, DEFAULT_ROUNDS)
}

/// `p` and `(p - 1) / 2` are both probably prime.
pub fn is_safe_prime(p: &BigUint) -> bool {
    is_probable_prime_default(p) && is_probable_prime_default(&((p - 1u32) >> 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn big(n: u64) -> BigUint {
        BigUint::from(n)
    }

    #[test]
    fn small_numbers() {
        let primes: Vec<u64> = (0..200).filter(|&n| is_probable_prime_default(&big(n))).collect();
        let expected: Vec<u64> = (0..200u64)
            .filter(|&n| n >= 2 && (2..n).take_while(|d| d * d <= n).all(|d| n % d != 0))
            .collect();
        assert_eq!(primes, expected);
    }

    #[test]
    fn carmichael_numbers_are_composite() {
        for n in [561u64, 1105, 1729, 41041, 825265, 321197185] {
            assert!(!is_probable_prime_default(&big(n)), "{n}");
        }
    }

    #[test]
    fn large_values() {
        let m127 = (BigUint::one() << 127) - 1u32;
        assert!(is_probable_prime_default(&m127));
        let f7 = (BigUint::one() << 128) + 1u32;
        assert!(!is_probable_prime_default(&f7));
    }

    #[test]
    fn safe_primes() {
        assert!(is_safe_prime(&big(23)));
        assert!(is_safe_prime(&big(107)));
        assert!(!is_safe_prime(&big(13)));
    }
}
