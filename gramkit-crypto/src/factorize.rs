//! Fermat factorization of the handshake `pq`.

/// Errors from [`factorize`].
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// `pq` is a perfect square, which the server never sends.
    PerfectSquare(u64),
    /// `pq` has no non-trivial factorization.
    NotComposite(u64),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PerfectSquare(n) => write!(f, "pq {n} is a perfect square"),
            Self::NotComposite(n) => write!(f, "pq {n} is not composite"),
        }
    }
}
impl std::error::Error for Error {}

// Quadratic residues mod 64, as a bitmask.
const SQUARES_MOD_64: u64 = {
    let mut mask = 0u64;
    let mut i = 0;
    while i < 64 {
        mask |= 1 << ((i * i) % 64);
        i += 1;
    }
    mask
};

fn square_root(n: u128) -> Option<u128> {
    if SQUARES_MOD_64 & (1 << (n % 64)) == 0 {
        return None;
    }
    let root = n.isqrt();
    (root * root == n).then_some(root)
}

/// Factorize `pq` into two factors `(p, q)` where `p ≤ q`.
///
/// Walks `x` upward from `⌈√pq⌉` until `x² - pq` is a perfect square `y²`,
/// giving `p = x - y` and `q = x + y`.
pub fn factorize(pq: u64) -> Result<(u64, u64), Error> {
    if pq < 4 {
        return Err(Error::NotComposite(pq));
    }
    if pq % 2 == 0 {
        return Ok((2, pq / 2));
    }

    let n = pq as u128;
    let mut x = n.isqrt();
    if x * x == n {
        return Err(Error::PerfectSquare(pq));
    }
    x += 1;

    // r = x² - n, advanced incrementally since (x+1)² - x² = 2x + 1.
    let mut r = x * x - n;
    loop {
        if let Some(y) = square_root(r) {
            let p = (x - y) as u64;
            let q = (x + y) as u64;
            if p == 1 {
                return Err(Error::NotComposite(pq));
            }
            return Ok((p, q));
        }
        r += 2 * x + 1;
        x += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_handshake_values() {
        assert_eq!(factorize(1470626929934143021), Ok((1206429347, 1218991343)));
        assert_eq!(factorize(2363612107535801713), Ok((1518968219, 1556064227)));
    }

    #[test]
    fn small_semiprimes() {
        assert_eq!(factorize(15), Ok((3, 5)));
        assert_eq!(factorize(77), Ok((7, 11)));
        assert_eq!(factorize(3 * 1_000_003), Ok((3, 1_000_003)));
    }

    #[test]
    fn even_input() {
        assert_eq!(factorize(2 * 4_294_967_291), Ok((2, 4_294_967_291)));
    }

    #[test]
    fn perfect_square_is_fatal() {
        assert_eq!(factorize(49), Err(Error::PerfectSquare(49)));
        let p = 4_294_967_291u64;
        assert_eq!(factorize(p * p), Err(Error::PerfectSquare(p * p)));
    }

    #[test]
    fn prime_is_not_composite() {
        assert_eq!(factorize(1_000_003), Err(Error::NotComposite(1_000_003)));
        assert_eq!(factorize(3), Err(Error::NotComposite(3)));
    }

    #[test]
    fn residue_table() {
        for i in 0u128..1000 {
            assert_eq!(square_root(i * i), Some(i));
        }
        assert_eq!(square_root(2), None);
        assert_eq!(square_root(99), None);
    }
}
