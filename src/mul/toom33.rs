//! Toom-33 multiplication
//!
//! Evaluate in -1, 0, +1, +2, +inf:
//!
//! ```text
//!   <-s-><--n--><--n-->
//!   |a2-|---a1-|---a0-|
//!   |b2-|---b1-|---b0-|
//!   <-t-><--n--><--n-->
//!
//! v0  =  a0          · b0              A(0)·B(0)
//! v1  = (a0+ a1+ a2) · (b0+ b1+ b2)    A(1)·B(1)      ah <= 2  bh <= 2
//! vm1 = (a0- a1+ a2) · (b0- b1+ b2)    A(-1)·B(-1)   |ah| <= 1 |bh| <= 1
//! v2  = (a0+2a1+4a2) · (b0+2b1+4b2)    A(2)·B(2)      ah <= 6  bh <= 6
//! vinf=          a2  ·          b2     A(inf)·B(inf)
//! ```

use crate::arena::scratch;
use crate::error::debug_require;
use crate::kernels::{add, add_1, add_n_assign, add_shl1, add_shl1_assign, cmp, sub_n};
use crate::limb::Limb;
use crate::mul::interp5::toom_interp5;
use crate::mul::{mul, mul_n};
use std::cmp::Ordering;

/// Evaluate one operand at +1 and -1.
///
/// `gp` enters holding `x0 + x2` (n+1 limbs); on return `gp = x0 + x1 + x2`
/// and `xm1 = |x0 - x1 + x2|`. Returns true when the -1 value is negative.
pub(crate) fn eval_pm1(gp: &mut [Limb], xm1: &mut [Limb], x1: &[Limb]) -> bool {
    let n = x1.len();
    debug_assert!(gp.len() == n + 1 && xm1.len() == n + 1);

    let neg = if gp[n] == 0 && cmp(&gp[..n], x1) == Ordering::Less {
        sub_n(&mut xm1[..n], x1, &gp[..n]);
        xm1[n] = 0;
        true
    } else {
        let bo = sub_n(&mut xm1[..n], &gp[..n], x1);
        xm1[n] = gp[n].wrapping_sub(bo);
        false
    };
    let cy = add_n_assign(&mut gp[..n], x1);
    gp[n] += cy;
    neg
}

/// Evaluate one operand at +2: `xp2 = x0 + 2·x1 + 4·x2`.
pub(crate) fn eval_p2(xp2: &mut [Limb], x0: &[Limb], x1: &[Limb], x2: &[Limb]) {
    let n = x0.len();
    let s = x2.len();
    debug_assert!(xp2.len() == n + 1);

    let mut cy = add_shl1(&mut xp2[..s], &x1[..s], x2);
    if s != n {
        cy = add_1(&mut xp2[s..n], &x1[s..], cy);
    }
    cy = 2 * cy + add_shl1_assign(&mut xp2[..n], x0);
    xp2[n] = cy;
}

/// `dst = a · b` for near-balanced operands in the Toom-33 regime.
///
/// Requires `4/5 <= nb/na <= 1` and `nb >= 26`; destination disjoint from
/// both sources, `dst.len() == na + nb`.
pub fn mul_toom33(dst: &mut [Limb], a: &[Limb], b: &[Limb]) {
    let na = a.len();
    let nb = b.len();
    debug_require!(nb >= 26);
    debug_require!(na >= nb);
    debug_require!(4 * na <= 5 * nb);
    debug_assert_eq!(dst.len(), na + nb);

    let n = (na + 2) / 3;
    let s = na - 2 * n;
    let t = nb - 2 * n;
    debug_assert!(s >= 1 && s <= n && t >= 1 && t <= n);

    let a0 = &a[..n];
    let a1 = &a[n..2 * n];
    let a2 = &a[2 * n..];
    let b0 = &b[..n];
    let b1 = &b[n..2 * n];
    let b2 = &b[2 * n..];

    // Scratch: | vm1 (2n+2) | v2 (2n+2) | ap (n+1) | am1 (n+1) | bp (n+1) | bm1 (n+1) |
    let mut tp = scratch(8 * n + 8);
    let vm1_neg;

    {
        let (_, evals) = tp.split_at_mut(4 * n + 4);
        let (ap, rest) = evals.split_at_mut(n + 1);
        let (am1, rest) = rest.split_at_mut(n + 1);
        let (bp, bm1) = rest.split_at_mut(n + 1);

        let cy = add(&mut ap[..n], a0, a2);
        ap[n] = cy;
        let neg_a = eval_pm1(ap, am1, a1);
        let cy = add(&mut bp[..n], b0, b2);
        bp[n] = cy;
        let neg_b = eval_pm1(bp, bm1, b1);
        vm1_neg = neg_a != neg_b;
    }

    // vinf = a2 · b2; low two limbs overlap v1's top and are restored after
    // the v1 product (whose true top limb is provably zero).
    mul(&mut dst[4 * n..], a2, b2);
    let vinf0 = dst[4 * n];
    let vinf1 = dst[4 * n + 1];

    // v1 = (a0+a1+a2)(b0+b1+b2)
    {
        let evals = &tp[4 * n + 4..];
        mul_n(&mut dst[2 * n..4 * n + 2], &evals[..n + 1], &evals[2 * n + 2..3 * n + 3]);
    }
    dst[4 * n + 1] = vinf1;

    // vm1 = |A(-1)| · |B(-1)|
    {
        let (vm1, evals) = tp.split_at_mut(4 * n + 4);
        mul_n(
            &mut vm1[..2 * n + 2],
            &evals[n + 1..2 * n + 2],
            &evals[3 * n + 3..4 * n + 4],
        );
    }

    // Reuse the +-1 evaluation slots for the +2 points.
    {
        let (_, evals) = tp.split_at_mut(4 * n + 4);
        let (ap2, rest) = evals.split_at_mut(n + 1);
        eval_p2(ap2, a0, a1, a2);
        let bp2 = &mut rest[n + 1..2 * n + 2];
        eval_p2(bp2, b0, b1, b2);
    }

    // v2 = A(2)·B(2)
    {
        let (lo, evals) = tp.split_at_mut(4 * n + 4);
        let v2 = &mut lo[2 * n + 2..4 * n + 4];
        mul_n(v2, &evals[..n + 1], &evals[2 * n + 2..3 * n + 3]);
    }

    // v0 = a0 · b0
    mul_n(&mut dst[..2 * n], a0, b0);

    let (vm1, rest) = tp.split_at_mut(2 * n + 2);
    let v2 = &mut rest[..2 * n + 2];
    toom_interp5(dst, v2, &mut vm1[..2 * n + 1], n, s + t, vm1_neg, vinf0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mul::basecase::mul_basecase;

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

    fn check(a: &[u64], b: &[u64]) {
        let mut want = vec![0u64; a.len() + b.len()];
        mul_basecase(&mut want, a, b);
        let mut got = vec![0u64; a.len() + b.len()];
        mul_toom33(&mut got, a, b);
        assert_eq!(got, want, "na={} nb={}", a.len(), b.len());
    }

    #[test]
    fn balanced() {
        check(&pattern(30, 3), &pattern(30, 5));
        check(&pattern(31, 7), &pattern(31, 11));
        check(&pattern(32, 13), &pattern(32, 17));
    }

    #[test]
    fn skewed_within_ratio() {
        // nb/na = 26/31 > 4/5
        check(&pattern(31, 19), &pattern(26, 23));
        check(&pattern(33, 29), &pattern(27, 31));
    }

    #[test]
    fn all_ones() {
        check(&vec![u64::MAX; 29], &vec![u64::MAX; 27]);
    }

    #[test]
    fn negative_minus_one_points() {
        // Middle piece dominating makes A(-1) negative.
        let mut a = vec![1u64; 30];
        a[10..20].fill(u64::MAX);
        let mut b = vec![1u64; 30];
        b[10..20].fill(u64::MAX);
        check(&a, &b);
    }
}
