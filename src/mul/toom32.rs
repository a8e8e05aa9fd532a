//! Toom-32 multiplication
//!
//! Evaluate in -1, 0, +1, +inf; four points recover the four product
//! coefficients directly, no shared interpolation helper needed:
//!
//! ```text
//!   <-s-><--n--><--n-->
//!   |a2-|---a1-|---a0-|
//!        |-b1--|---b0-|
//!        <--t--><--n-->
//!
//! v0  =  a0         · b0          c0 = v0
//! v1  = (a0+ a1+ a2)·(b0+ b1)     c1 = (v1 - vm1)/2 - vinf
//! vm1 = (a0- a1+ a2)·(b0- b1)     c2 = (v1 + vm1)/2 - v0
//! vinf=          a2 ·     b1      c3 = vinf
//! ```

use crate::arena::scratch;
use crate::error::{debug_require, hard_assert};
use crate::kernels::{add, add_assign, add_n_assign, normalized_len, shr_assign, sub_n, sub_n_assign, sub_assign};
use crate::limb::Limb;
use crate::mul::toom33::eval_pm1;
use crate::mul::toom42::toom42_eval_b;
use crate::mul::{mul, mul_n};

/// `dst = a · b` for roughly 3:2 shaped operands.
///
/// Requires `5/9 <= nb/na <= 4/5` and `nb >= 12`; destination disjoint from
/// both sources, `dst.len() == na + nb`.
pub fn mul_toom32(dst: &mut [Limb], a: &[Limb], b: &[Limb]) {
    let na = a.len();
    let nb = b.len();
    debug_require!(nb >= 12);
    debug_require!(na >= nb);
    debug_require!(9 * nb >= 5 * na);
    debug_require!(4 * na >= 5 * nb);
    debug_assert_eq!(dst.len(), na + nb);

    let n = 1 + if 2 * na >= 3 * nb {
        (na - 1) / 3
    } else {
        (nb - 1) >> 1
    };
    let s = na - 2 * n;
    let t = nb - n;
    debug_assert!(s >= 1 && s <= n && t >= 1 && t <= n);

    let a0 = &a[..n];
    let a1 = &a[n..2 * n];
    let a2 = &a[2 * n..];
    let b0 = &b[..n];
    let b1 = &b[n..];

    // Scratch: | v1 | vm1 | w | ap1 | am1 | bp1 | bm1 |
    let mut tp = scratch(10 * n + 10);
    let vm1_neg;

    {
        let (_, evals) = tp.split_at_mut(6 * n + 6);
        let (ap1, rest) = evals.split_at_mut(n + 1);
        let (am1, rest) = rest.split_at_mut(n + 1);
        let (bp1, bm1) = rest.split_at_mut(n + 1);

        let cy = add(&mut ap1[..n], a0, a2);
        ap1[n] = cy;
        let neg_a = eval_pm1(ap1, am1, a1);
        let neg_b = toom42_eval_b(bp1, &mut bm1[..n], b0, b1);
        vm1_neg = neg_a != neg_b;
    }

    // v1 = A(1)·B(1), vm1 = |A(-1)|·|B(-1)| (the latter is n+1 by n limbs)
    {
        let (prods, evals) = tp.split_at_mut(6 * n + 6);
        let (v1, rest) = prods.split_at_mut(2 * n + 2);
        let vm1 = &mut rest[..2 * n + 2];
        mul_n(v1, &evals[..n + 1], &evals[2 * n + 2..3 * n + 3]);
        vm1[2 * n + 1] = 0;
        mul(
            &mut vm1[..2 * n + 1],
            &evals[n + 1..2 * n + 2],
            &evals[3 * n + 3..4 * n + 3],
        );
    }

    // w = v1 -+ vm1 (this is 2·(c1 + c3)); v1 becomes v1 +- vm1 (2·(c0 + c2))
    {
        let (v1, rest) = tp.split_at_mut(2 * n + 2);
        let (vm1, w) = rest.split_at_mut(2 * n + 2);
        let w = &mut w[..2 * n + 2];
        if vm1_neg {
            hard_assert!(add(w, v1, vm1) == 0);
            hard_assert!(sub_n_assign(v1, vm1) == 0);
        } else {
            hard_assert!(sub_n(w, v1, vm1) == 0);
            hard_assert!(add_n_assign(v1, vm1) == 0);
        }
        // Both differences are even; the halvings are exact.
        hard_assert!(shr_assign(w, 1) == 0);
        hard_assert!(shr_assign(v1, 1) == 0);
    }

    // Lay out v0 and vinf, clear the middle gap.
    mul_n(&mut dst[..2 * n], a0, b0);
    dst[2 * n..3 * n].fill(0);
    if s >= t {
        mul(&mut dst[3 * n..], a2, b1);
    } else {
        mul(&mut dst[3 * n..], b1, a2);
    }

    // c1 = w - vinf, c2 = (v1 half) - v0; both provably non-negative.
    {
        let (v1, rest) = tp.split_at_mut(2 * n + 2);
        let w = &mut rest[2 * n + 2..4 * n + 4];
        hard_assert!(sub_assign(w, &dst[3 * n..]) == 0);
        hard_assert!(sub_assign(v1, &dst[..2 * n]) == 0);
    }

    // dst += c1·B^n + c2·B^2n
    {
        let (v1, rest) = tp.split_at(2 * n + 2);
        let w = &rest[2 * n + 2..4 * n + 4];
        let c1_len = normalized_len(w);
        hard_assert!(c1_len <= 2 * n + 1);
        hard_assert!(add_assign(&mut dst[n..], &w[..c1_len]) == 0);
        let c2_len = normalized_len(v1);
        hard_assert!(c2_len <= n + s.max(t) + 1);
        hard_assert!(add_assign(&mut dst[2 * n..], &v1[..c2_len]) == 0);
    }
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
        mul_toom32(&mut got, a, b);
        assert_eq!(got, want, "na={} nb={}", a.len(), b.len());
    }

    #[test]
    fn two_thirds_ratio() {
        check(&pattern(18, 3), &pattern(12, 5));
        check(&pattern(21, 7), &pattern(14, 11));
    }

    #[test]
    fn wide_and_narrow_ends_of_window() {
        // nb/na just above 5/9
        check(&pattern(27, 13), &pattern(16, 17));
        // nb/na just below 4/5
        check(&pattern(20, 19), &pattern(15, 23));
    }

    #[test]
    fn all_ones() {
        check(&vec![u64::MAX; 24], &vec![u64::MAX; 15]);
    }

    #[test]
    fn negative_evaluation_sides() {
        let mut a = vec![1u64; 24];
        a[8..16].fill(u64::MAX); // a1 dominates: A(-1) < 0
        let mut b = vec![0u64; 16];
        b[8..].fill(u64::MAX); // b1 > b0: B(-1) < 0
        b[0] = 5;
        check(&a, &b);
    }
}
