//! Toom-42 multiplication
//!
//! Evaluate in -1, 0, +1, +2, +inf:
//!
//! ```text
//!   <-s-><--n--><--n--><--n-->
//!   |a3-|---a2-|---a1-|---a0-|
//!                |-b1-|---b0-|
//!                <-t--><--n-->
//!
//! v0  =  a0             · b0        A(0)·B(0)
//! v1  = (a0+ a1+ a2+ a3)·(b0+ b1)   A(1)·B(1)       ah <= 3   bh <= 1
//! vm1 = (a0- a1+ a2- a3)·(b0- b1)   A(-1)·B(-1)    |ah| <= 1  bh  = 0
//! v2  = (a0+2a1+4a2+8a3)·(b0+2b1)   A(2)·B(2)       ah <= 14  bh <= 2
//! vinf=              a3 ·     b1    A(inf)·B(inf)
//! ```

use crate::arena::scratch;
use crate::error::debug_require;
use crate::kernels::{
    add, add_1, add_assign, add_n, add_n_assign, add_shl1, add_shl1_assign, add_sub_n, cmp,
    is_zero, sub_1, sub_n,
};
use crate::limb::Limb;
use crate::mul::interp5::toom_interp5;
use crate::mul::{mul, mul_n};
use std::cmp::Ordering;

/// Split point for the four-way decomposition of `a`.
#[inline]
pub(crate) fn toom42_n(na: usize, nb: usize) -> usize {
    if na >= 2 * nb {
        (na + 3) >> 2
    } else {
        (nb + 1) >> 1
    }
}

/// Evaluate the two-way side: `bp1 = b0 + b1`, `bm1 = |b0 - b1|`.
///
/// `bp1` takes `n + 1` limbs, `bm1` takes `n`. Returns true when
/// `b0 - b1` is negative (folded into the product sign by the caller).
pub(crate) fn toom42_eval_b(
    bp1: &mut [Limb],
    bm1: &mut [Limb],
    b0: &[Limb],
    b1: &[Limb],
) -> bool {
    let n = b0.len();
    let t = b1.len();
    debug_assert!(bp1.len() == n + 1 && bm1.len() == n);

    if t == n {
        if cmp(b0, b1) == Ordering::Less {
            let code = add_sub_n(&mut bp1[..n], bm1, b1, b0);
            bp1[n] = code >> 1;
            true
        } else {
            let code = add_sub_n(&mut bp1[..n], bm1, b0, b1);
            bp1[n] = code >> 1;
            false
        }
    } else if is_zero(&b0[t..]) && cmp(&b0[..t], b1) == Ordering::Less {
        let cy = add_sub_n(&mut bp1[..t], &mut bm1[..t], b1, &b0[..t]);
        bm1[t..].fill(0);
        let top = add_1(&mut bp1[t..n], &b0[t..], cy >> 1);
        bp1[n] = top;
        true
    } else {
        let cy = add_sub_n(&mut bp1[..t], &mut bm1[..t], &b0[..t], b1);
        sub_1(&mut bm1[t..], &b0[t..], cy & 1);
        let top = add_1(&mut bp1[t..n], &b0[t..], cy >> 1);
        bp1[n] = top;
        false
    }
}

/// Cached Toom-42 evaluation of a fixed multiplier `b`, valid while the
/// split point `n` matches.
pub(crate) struct Toom42Eval {
    pub(crate) n: usize,
    pub(crate) bp1: Vec<Limb>,
    pub(crate) bm1: Vec<Limb>,
    pub(crate) neg: bool,
}

/// `dst = a · b` for roughly 4:2 shaped operands.
///
/// Requires `1/3 <= nb/na <= 5/9` and `nb >= 20`; destination disjoint from
/// both sources, `dst.len() == na + nb`.
pub fn mul_toom42(dst: &mut [Limb], a: &[Limb], b: &[Limb]) {
    toom42_inner(dst, a, b, None)
}

/// Toom-42 against a cached evaluation of `b` (see [`Toom42Eval`]).
pub(crate) fn mul_toom42_planned(dst: &mut [Limb], a: &[Limb], b: &[Limb], eval: &Toom42Eval) {
    debug_assert_eq!(eval.n, toom42_n(a.len(), b.len()));
    toom42_inner(dst, a, b, Some(eval))
}

fn toom42_inner(dst: &mut [Limb], a: &[Limb], b: &[Limb], beval: Option<&Toom42Eval>) {
    let na = a.len();
    let nb = b.len();
    debug_require!(nb >= 20);
    debug_require!(na >= nb);
    debug_assert_eq!(dst.len(), na + nb);

    let n = toom42_n(na, nb);
    let s = na - 3 * n;
    let t = nb - n;
    debug_assert!(s >= 1 && s <= n && t >= 1 && t <= n);

    let a0 = &a[..n];
    let a1 = &a[n..2 * n];
    let a2 = &a[2 * n..3 * n];
    let a3 = &a[3 * n..];
    let b0 = &b[..n];
    let b1 = &b[n..];

    // Scratch layout: | ap1/ap2, a13 (2n+2) | v2 (2n+2) | bp1 (n+1) |
    // vm1 later reuses the first zone once the +-1 evaluations are consumed.
    let mut tp = scratch(5 * n + 5);
    let mut vm1_neg;
    let am1h;

    {
        let (eval, rest) = tp.split_at_mut(2 * n + 2);
        let (ap1, a13) = eval.split_at_mut(n + 1);
        let bp1 = &mut rest[2 * n + 2..3 * n + 3];

        // ap1 = a0 + a2 (+ a1 + a3 below), am1 = |a0 + a2 - a1 - a3|
        let cy = add_n(&mut ap1[..n], a0, a2);
        ap1[n] = cy;
        let cy = add(&mut a13[..n], a1, a3);
        a13[n] = cy;
        vm1_neg = cmp(ap1, a13) == Ordering::Less;
        let am1 = &mut dst[n..2 * n + 1];
        if vm1_neg {
            sub_n(am1, a13, ap1);
        } else {
            sub_n(am1, ap1, a13);
        }
        add_n_assign(&mut ap1[..n + 1], a13);
        am1h = dst[2 * n]; // shares storage with v1[0]

        // bp1 = b0 + b1, bm1 = |b0 - b1|
        let bm1 = &mut dst[..n];
        let neg_b = match beval {
            Some(e) => {
                bp1.copy_from_slice(&e.bp1);
                bm1.copy_from_slice(&e.bm1);
                e.neg
            }
            None => toom42_eval_b(bp1, bm1, b0, b1),
        };
        if neg_b {
            vm1_neg = !vm1_neg;
        }
    }

    // vinf = a3 · b1; its two low limbs overlap v1's top and are restored
    // after the v1 product (whose own top limb is provably zero).
    if s > t {
        mul(&mut dst[4 * n..], a3, b1);
    } else {
        mul(&mut dst[4 * n..], b1, a3);
    }
    let vinf0 = dst[4 * n];
    let vinf1 = dst[4 * n + 1];

    // v1 = ap1 · bp1
    {
        let (lo, hi) = tp.split_at_mut(4 * n + 4);
        mul_n(&mut dst[2 * n..4 * n + 2], &lo[..n + 1], &hi[..n + 1]);
    }
    dst[4 * n + 1] = vinf1;

    // ap2 = a0 + 2a1 + 4a2 + 8a3 by repeated a + 2·acc
    {
        let ap2 = &mut tp[..n + 1];
        let mut cy = add_shl1(&mut ap2[..s], &a2[..s], a3);
        if s != n {
            cy = add_1(&mut ap2[s..n], &a2[s..], cy);
        }
        cy = 2 * cy + add_shl1_assign(&mut ap2[..n], a1);
        cy = 2 * cy + add_shl1_assign(&mut ap2[..n], a0);
        ap2[n] = cy;
    }

    // bp2 = bp1 + b1 in place
    add_assign(&mut tp[4 * n + 4..5 * n + 5], b1);

    // v2 = ap2 · bp2
    {
        let (lo, rest) = tp.split_at_mut(2 * n + 2);
        let (v2, bp2) = rest.split_at_mut(2 * n + 2);
        mul_n(v2, &lo[..n + 1], &bp2[..n + 1]);
    }

    // vm1 = am1 · bm1, widened by bm1·B^n when am1's top limb is set
    {
        let vm1 = &mut tp[..2 * n + 1];
        let (bm1, rest) = dst.split_at(n);
        mul_n(&mut vm1[..2 * n], &rest[..n], bm1);
        if am1h != 0 {
            let cy = {
                let (_, vhi) = vm1.split_at_mut(n);
                add_n_assign(&mut vhi[..n], bm1)
            };
            vm1[2 * n] = cy;
        } else {
            vm1[2 * n] = 0;
        }
    }

    // v0 = a0 · b0
    mul_n(&mut dst[..2 * n], a0, b0);

    let (vm1, rest) = tp.split_at_mut(2 * n + 2);
    let v2 = &mut rest[..2 * n + 2];
    toom_interp5(dst, v2, &mut vm1[..2 * n + 1], n, s + t, vm1_neg, vinf0);
}
