//! Multiplication: dispatcher and algorithm stack
//!
//! [`mul`] partitions the `(na, nb)` plane by the ratio `nb/na` and the
//! absolute size of `nb`, then hands off to schoolbook, one of the
//! Toom-Cook variants, or the Schönhage–Strassen path:
//!
//! ```text
//! 0         1/5 1/4  1/3 2/5  1/2 5/9 3/5 2/3 3/4 4/5  9/10   1  nb/na
//!                              |-------------------|xxxxxxxxxx+  toom22
//!                     |------------|xxxxxxx+xxxxxxx|----------|  toom32
//!                |----|xxxxxxxx+xxx|-------|                     toom42
//!                                          |-------|xxxxxxxxxx+  toom33
//! ```
//!
//! Extremely unbalanced operands are chunked: schoolbook in L1-sized
//! blocks, Toom-42 over `2·nb` pieces, the FFT over `3·nb` pieces, with
//! the partial products carry-propagated between chunks.
//!
//! The thresholds form a one-dimensional dependency chain: each one
//! assumes every smaller algorithm works, and any concrete choice
//! preserves correctness.

pub mod basecase;
pub mod fft;
pub mod interp5;
pub mod plan;
pub mod sqr_toom;
pub mod toom22;
pub mod toom32;
pub mod toom33;
pub mod toom42;

pub use basecase::{mul_basecase, sqr_basecase};
pub use fft::{fft_next_size, mul_fermat, mul_fft, mul_mersenne};
pub use plan::MulPlan;
pub use sqr_toom::{sqr_toom2, sqr_toom3};
pub use toom22::mul_toom22;
pub use toom32::mul_toom32;
pub use toom33::mul_toom33;
pub use toom42::mul_toom42;

use crate::arena::scratch;
use crate::error::debug_require;
use crate::kernels::{add_n_assign, inc};
use crate::limb::Limb;

/// Schoolbook until here, then Toom-22.
pub const MUL_TOOM22_THRESHOLD: usize = 20;
/// Below this `nb`, unbalanced shapes stay on the (chunked) schoolbook.
pub const MUL_TOOMX2_THRESHOLD: usize = 30;
/// Toom-22 until here, then Toom-33.
pub const MUL_TOOM33_THRESHOLD: usize = 65;
/// Toom until here, then the FFT path.
pub const MUL_FFT_THRESHOLD: usize = 1736;
/// Pointwise FFT products recurse above this coefficient size.
pub const MUL_FFT_MODF_THRESHOLD: usize = 477;

/// L1-cache block, in limbs, for chunked schoolbook multiplication.
pub(crate) const PART_SIZE: usize = 8192 / 8 / 4;

/// `dst = a · b` for equal-length operands.
///
/// `dst.len() == 2n`, destination disjoint from both sources.
pub fn mul_n(dst: &mut [Limb], a: &[Limb], b: &[Limb]) {
    let n = a.len();
    debug_require!(n > 0);
    debug_assert!(b.len() == n && dst.len() == 2 * n);
    if n < MUL_TOOM22_THRESHOLD {
        mul_basecase(dst, a, b);
    } else if n < MUL_TOOM33_THRESHOLD {
        mul_toom22(dst, a, b);
    } else if n < MUL_FFT_THRESHOLD {
        mul_toom33(dst, a, b);
    } else {
        mul_fft(dst, a, b);
    }
}

/// `dst = a²`.
///
/// `dst.len() == 2n`, destination disjoint from the source.
pub fn sqr(dst: &mut [Limb], a: &[Limb]) {
    let n = a.len();
    debug_require!(n > 0);
    debug_assert_eq!(dst.len(), 2 * n);
    if n < MUL_TOOM22_THRESHOLD {
        sqr_basecase(dst, a);
    } else if n < MUL_TOOM33_THRESHOLD {
        sqr_toom2(dst, a);
    } else if n < MUL_FFT_THRESHOLD {
        sqr_toom3(dst, a);
    } else {
        mul_fft(dst, a, a);
    }
}

/// `dst = a · b` for any `na >= nb >= 1`.
///
/// `dst.len() == na + nb`, destination disjoint from both sources. Equal
/// operands at equal lengths are detected and squared.
pub fn mul(dst: &mut [Limb], a: &[Limb], b: &[Limb]) {
    let na = a.len();
    let nb = b.len();
    debug_require!(nb > 0);
    debug_require!(na >= nb);
    debug_assert_eq!(dst.len(), na + nb);

    if na == nb {
        if std::ptr::eq(a.as_ptr(), b.as_ptr()) {
            sqr(dst, a);
        } else {
            mul_n(dst, a, b);
        }
    } else if nb < MUL_TOOMX2_THRESHOLD && 4 * na >= 5 * nb {
        if na <= PART_SIZE || nb <= 2 {
            mul_basecase(dst, a, b);
        } else {
            mul_chunked_basecase(dst, a, b);
        }
    } else if (na + nb) >> 1 < MUL_FFT_THRESHOLD || 2 * nb < MUL_FFT_THRESHOLD {
        if na < 3 * nb {
            if 4 * na < 5 * nb {
                if nb < MUL_TOOM33_THRESHOLD {
                    mul_toom22(dst, a, b);
                } else {
                    mul_toom33(dst, a, b);
                }
            } else if 5 * na < 9 * nb {
                mul_toom32(dst, a, b);
            } else {
                mul_toom42(dst, a, b);
            }
        } else {
            mul_chunked_toom42(dst, a, b);
        }
    } else if na < 8 * nb {
        mul_fft(dst, a, b);
    } else {
        mul_chunked_fft(dst, a, b);
    }
}

/// Schoolbook over L1-sized blocks of `a`, carrying the `nb`-limb overlap
/// between consecutive partial products.
fn mul_chunked_basecase(dst: &mut [Limb], a: &[Limb], b: &[Limb]) {
    let na = a.len();
    let nb = b.len();
    let mut tp = [0 as Limb; MUL_TOOMX2_THRESHOLD];
    let tp = &mut tp[..nb];

    mul_basecase(&mut dst[..PART_SIZE + nb], &a[..PART_SIZE], b);
    let mut off = PART_SIZE;
    let mut rem = na - PART_SIZE;
    tp.copy_from_slice(&dst[off..off + nb]);

    while rem > PART_SIZE {
        mul_basecase(&mut dst[off..off + PART_SIZE + nb], &a[off..off + PART_SIZE], b);
        if add_n_assign(&mut dst[off..off + nb], tp) != 0 {
            inc(&mut dst[off + nb..off + PART_SIZE + nb]);
        }
        off += PART_SIZE;
        rem -= PART_SIZE;
        tp.copy_from_slice(&dst[off..off + nb]);
    }

    if rem >= nb {
        mul_basecase(&mut dst[off..], &a[off..], b);
    } else {
        mul_basecase(&mut dst[off..], b, &a[off..]);
    }
    if add_n_assign(&mut dst[off..off + nb], tp) != 0 {
        inc(&mut dst[off + nb..]);
    }
}

/// Toom-42 over `2·nb`-sized pieces of `a` (the `3nb <= na` corner of the
/// Toom region), carrying partial products between pieces.
fn mul_chunked_toom42(dst: &mut [Limb], a: &[Limb], b: &[Limb]) {
    let na = a.len();
    let nb = b.len();
    let mut ws = scratch(nb);

    mul_toom42(&mut dst[..3 * nb], &a[..2 * nb], b);
    let mut off = 2 * nb;
    let mut rem = na - 2 * nb;
    ws.copy_from_slice(&dst[off..off + nb]);

    while 2 * rem >= 5 * nb {
        mul_toom42(&mut dst[off..off + 3 * nb], &a[off..off + 2 * nb], b);
        if add_n_assign(&mut dst[off..off + nb], &ws) != 0 {
            inc(&mut dst[off + nb..off + 3 * nb]);
        }
        off += 2 * nb;
        rem -= 2 * nb;
        ws.copy_from_slice(&dst[off..off + nb]);
    }

    // nb/2 <= rem < 5nb/2
    if rem >= nb {
        mul(&mut dst[off..], &a[off..], b);
    } else {
        mul(&mut dst[off..], b, &a[off..]);
    }
    if add_n_assign(&mut dst[off..off + nb], &ws) != 0 {
        inc(&mut dst[off + nb..]);
    }
}

/// FFT over `3·nb`-sized pieces of `a` for extremely unbalanced shapes.
fn mul_chunked_fft(dst: &mut [Limb], a: &[Limb], b: &[Limb]) {
    let na = a.len();
    let nb = b.len();
    let mut ws = scratch(nb);

    mul_fft(&mut dst[..4 * nb], &a[..3 * nb], b);
    let mut off = 3 * nb;
    let mut rem = na - 3 * nb;
    ws.copy_from_slice(&dst[off..off + nb]);

    while 2 * rem >= 7 * nb {
        mul_fft(&mut dst[off..off + 4 * nb], &a[off..off + 3 * nb], b);
        if add_n_assign(&mut dst[off..off + nb], &ws) != 0 {
            inc(&mut dst[off + nb..off + 4 * nb]);
        }
        off += 3 * nb;
        rem -= 3 * nb;
        ws.copy_from_slice(&dst[off..off + nb]);
    }

    // nb/2 <= rem < 7nb/2
    if rem >= nb {
        mul(&mut dst[off..], &a[off..], b);
    } else {
        mul(&mut dst[off..], b, &a[off..]);
    }
    if add_n_assign(&mut dst[off..off + nb], &ws) != 0 {
        inc(&mut dst[off + nb..]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(n: usize, seed: u64) -> Vec<u64> {
        let mut x = seed | 1;
        (0..n)
            .map(|_| {
                x ^= x << 13;
                x ^= x >> 7;
                x ^= x << 17;
                x
            })
            .collect()
    }

    fn naive_mul(a: &[u64], b: &[u64]) -> Vec<u64> {
        let mut r = vec![0u64; a.len() + b.len()];
        for (i, &ai) in a.iter().enumerate() {
            let mut cy = 0u64;
            for (j, &bj) in b.iter().enumerate() {
                let t = (ai as u128) * (bj as u128) + r[i + j] as u128 + cy as u128;
                r[i + j] = t as u64;
                cy = (t >> 64) as u64;
            }
            r[i + b.len()] = cy;
        }
        r
    }

    fn check(a: &[u64], b: &[u64]) {
        let mut got = vec![0u64; a.len() + b.len()];
        mul(&mut got, a, b);
        assert_eq!(got, naive_mul(a, b), "na={} nb={}", a.len(), b.len());
    }

    #[test]
    fn one_by_one_matches_primitive() {
        let a = [0xfedc_ba98_7654_3210u64];
        let b = [0x0123_4567_89ab_cdefu64];
        let mut dst = [0u64; 2];
        mul(&mut dst, &a, &b);
        let (lo, hi) = crate::limb::mul_1_1(a[0], b[0]);
        assert_eq!(dst, [lo, hi]);
    }

    #[test]
    fn sweep_small_shapes() {
        for na in 1..=24usize {
            for nb in 1..=na {
                check(&pattern(na, (na * 31 + nb) as u64), &pattern(nb, (na + nb * 17) as u64));
            }
        }
    }

    #[test]
    fn toom_region_shapes() {
        check(&pattern(100, 3), &pattern(90, 5)); // toom33
        check(&pattern(100, 7), &pattern(70, 11)); // toom32
        check(&pattern(100, 13), &pattern(45, 17)); // toom42
        check(&pattern(200, 19), &pattern(40, 23)); // chunked toom42
    }

    #[test]
    fn chunked_basecase_long_a() {
        // na > PART_SIZE with small nb takes the L1-blocked loop.
        check(&pattern(PART_SIZE * 2 + 70, 29), &pattern(10, 31));
        check(&pattern(PART_SIZE + 40, 37), &pattern(25, 41));
    }

    #[test]
    fn equal_length_goes_through_mul_n() {
        let a = pattern(120, 43);
        let b = pattern(120, 47);
        let mut via_mul = vec![0u64; 240];
        let mut via_mul_n = vec![0u64; 240];
        mul(&mut via_mul, &a, &b);
        mul_n(&mut via_mul_n, &a, &b);
        assert_eq!(via_mul, via_mul_n);
    }

    #[test]
    fn sqr_equals_mul() {
        for n in [1usize, 7, 20, 30, 64, 66, 100] {
            let a = pattern(n, n as u64);
            let mut s = vec![0u64; 2 * n];
            sqr(&mut s, &a);
            let mut m = vec![0u64; 2 * n];
            mul_n(&mut m, &a, &pattern(n, n as u64));
            assert_eq!(s, m, "n={n}");
        }
    }
}
