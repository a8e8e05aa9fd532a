//! Toom-2 and Toom-3 squaring
//!
//! Same evaluation shapes as the multiplication variants but every point is
//! a square, so the -1 evaluations need no sign tracking and each pointwise
//! product halves to a recursive square.

use crate::arena::scratch;
use crate::error::debug_require;
use crate::kernels::{add_assign, add_n, add_n_assign, cmp, dec, inc_1, sub_n, sub_n_assign};
use crate::limb::Limb;
use crate::mul::interp5::toom_interp5;
use crate::mul::sqr;
use crate::mul::toom33::{eval_p2, eval_pm1};
use std::cmp::Ordering;

/// `dst = a²` by two-way splitting.
///
/// ```text
///    <-s--><--n-->
///    |-a1-|--a0--|
///
/// v0  =  a0    ²
/// vm1 = (a0-a1)²
/// vinf=     a1 ²
/// ```
pub fn sqr_toom2(dst: &mut [Limb], a: &[Limb]) {
    let na = a.len();
    debug_require!(na >= 5);
    debug_assert_eq!(dst.len(), 2 * na);

    let s = na >> 1;
    let n = na - s;
    let (a0, a1) = a.split_at(n);

    let mut vm1 = scratch(2 * n);

    // asm1 = |a0 - a1| in dst[0..n]
    {
        let asm1 = &mut dst[..n];
        if s == n {
            if cmp(a0, a1) == Ordering::Less {
                sub_n(asm1, a1, a0);
            } else {
                sub_n(asm1, a0, a1);
            }
        } else if a0[s] == 0 && cmp(&a0[..s], a1) == Ordering::Less {
            sub_n(&mut asm1[..s], a1, &a0[..s]);
            asm1[s] = 0;
        } else {
            let bo = sub_n(&mut asm1[..s], &a0[..s], a1);
            asm1[s] = a0[s].wrapping_sub(bo);
        }
    }

    sqr(&mut vm1, &dst[..n]);
    sqr(&mut dst[..2 * n], a0);
    sqr(&mut dst[2 * n..], a1);

    // Same recombination as Toom-22, with vm1 always subtracted.
    let (mut cy, cy2) = {
        let (lo, hi) = dst.split_at_mut(2 * n);
        let cy = add_n_assign(&mut hi[..n], &lo[n..]);
        let cy2 = cy + {
            let (v0lo, r1) = lo.split_at_mut(n);
            add_n(r1, &hi[..n], v0lo)
        };
        let cy = cy + {
            let (h1, h2) = hi.split_at_mut(n);
            add_assign(h1, &h2[..2 * s - n])
        };
        (cy as i64, cy2)
    };

    cy -= sub_n_assign(&mut dst[n..3 * n], &vm1[..2 * n]) as i64;

    inc_1(&mut dst[2 * n..], cy2);
    if cy < 0 {
        dec(&mut dst[3 * n..]);
    } else {
        inc_1(&mut dst[3 * n..], cy as Limb);
    }
}

/// `dst = a²` by three-way splitting, interpolated at five points.
///
/// ```text
///   <-s-><--n--><--n-->
///   |a2-|---a1-|---a0-|
///
/// v0  =  a0          ²
/// v1  = (a0+ a1+ a2) ²
/// vm1 = (a0- a1+ a2) ²
/// v2  = (a0+2a1+4a2) ²
/// vinf=          a2  ²
/// ```
pub fn sqr_toom3(dst: &mut [Limb], a: &[Limb]) {
    let na = a.len();
    debug_require!(na >= 13);
    debug_assert_eq!(dst.len(), 2 * na);

    let n = (na + 2) / 3;
    let s = na - 2 * n;
    debug_assert!(s >= 1 && s <= n);

    let a0 = &a[..n];
    let a1 = &a[n..2 * n];
    let a2 = &a[2 * n..];

    // Scratch: | vm1 (2n+2) | v2 (2n+2) | ap (n+1) | am1 (n+1) |
    let mut tp = scratch(6 * n + 6);

    {
        let (_, evals) = tp.split_at_mut(4 * n + 4);
        let (ap, am1) = evals.split_at_mut(n + 1);
        let cy = crate::kernels::add(&mut ap[..n], a0, a2);
        ap[n] = cy;
        // The square absorbs the sign of the -1 point.
        let _ = eval_pm1(ap, am1, a1);
    }

    // vinf = a2²; its two low limbs overlap v1's top and are restored
    // after the v1 square (whose true top limb is provably zero).
    sqr(&mut dst[4 * n..], a2);
    let vinf0 = dst[4 * n];
    let vinf1 = dst[4 * n + 1];

    {
        let evals = &tp[4 * n + 4..];
        sqr(&mut dst[2 * n..4 * n + 2], &evals[..n + 1]);
    }
    dst[4 * n + 1] = vinf1;

    {
        let (vm1, evals) = tp.split_at_mut(4 * n + 4);
        sqr(&mut vm1[..2 * n + 2], &evals[n + 1..2 * n + 2]);
    }

    {
        let (_, evals) = tp.split_at_mut(4 * n + 4);
        let (ap2, _) = evals.split_at_mut(n + 1);
        eval_p2(ap2, a0, a1, a2);
    }

    {
        let (lo, evals) = tp.split_at_mut(4 * n + 4);
        let v2 = &mut lo[2 * n + 2..4 * n + 4];
        sqr(v2, &evals[..n + 1]);
    }

    sqr(&mut dst[..2 * n], a0);

    let (vm1, rest) = tp.split_at_mut(2 * n + 2);
    let v2 = &mut rest[..2 * n + 2];
    toom_interp5(dst, v2, &mut vm1[..2 * n + 1], n, 2 * s, false, vinf0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mul::basecase::sqr_basecase;

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

    fn check2(a: &[u64]) {
        let mut want = vec![0u64; 2 * a.len()];
        sqr_basecase(&mut want, a);
        let mut got = vec![0u64; 2 * a.len()];
        sqr_toom2(&mut got, a);
        assert_eq!(got, want, "na={}", a.len());
    }

    fn check3(a: &[u64]) {
        let mut want = vec![0u64; 2 * a.len()];
        sqr_basecase(&mut want, a);
        let mut got = vec![0u64; 2 * a.len()];
        sqr_toom3(&mut got, a);
        assert_eq!(got, want, "na={}", a.len());
    }

    #[test]
    fn toom2_even_and_odd() {
        check2(&pattern(20, 3));
        check2(&pattern(21, 5));
        check2(&vec![u64::MAX; 24]);
    }

    #[test]
    fn toom2_low_half_smaller() {
        let mut a = pattern(22, 7);
        a[..11].fill(1); // a0 < a1 path
        check2(&a);
    }

    #[test]
    fn toom3_sizes() {
        check3(&pattern(30, 9));
        check3(&pattern(31, 11));
        check3(&pattern(32, 13));
        check3(&vec![u64::MAX; 33]);
    }

    #[test]
    fn toom3_middle_dominant() {
        let mut a = vec![1u64; 30];
        a[10..20].fill(u64::MAX); // A(-1) negative, squared away
        check3(&a);
    }
}
