//! Recursive divide-and-conquer division
//!
//! Split numerator and divisor, divide the high half, subtract the low
//! quotient contribution, divide the low half. Overshoot never survives
//! more than two add-back rounds per half. The quotient is produced in
//! `nb`-sized blocks from the top; the leading (smaller) block goes back
//! through the front-door dispatcher.

use crate::arena::scratch;
use crate::div::{div, DIV_DIVIDE_THRESHOLD};
use crate::div::basecase::div_basecase;
use crate::error::debug_require;
use crate::kernels::{add_n_assign, sub_1_assign, sub_n_assign};
use crate::limb::Limb;
use crate::mul::mul;

/// One balanced step: `a` is `2n` limbs, `d` is `n`, quotient `n`.
///
/// Remainder replaces `a[..n]`; returns `qh`. `tp` is `n` limbs of
/// scratch. Requires `n >= 6`, top bit of `d` set, and `inv21` for `d`'s
/// top two limbs.
pub(crate) fn div_divide_n(
    q: &mut [Limb],
    a: &mut [Limb],
    d: &[Limb],
    inv21: Limb,
    tp: &mut [Limb],
) -> Limb {
    let n = d.len();
    debug_require!(n >= 6);
    debug_require!(d[n - 1] >> 63 == 1);
    debug_assert!(q.len() == n && a.len() == 2 * n && tp.len() >= n);

    let lo = n >> 1;
    let hi = n - lo;

    // High half of the quotient from the high halves of a and d.
    let mut qh = {
        let (_, qhi) = q.split_at_mut(lo);
        if hi < DIV_DIVIDE_THRESHOLD {
            div_basecase(qhi, &mut a[2 * lo..], &d[lo..], inv21)
        } else {
            div_divide_n(qhi, &mut a[2 * lo..], &d[lo..], inv21, &mut tp[..hi])
        }
    };

    // Subtract q_hi · d_lo from the running remainder.
    mul(&mut tp[..n], &q[lo..], &d[..lo]);
    let mut cy = sub_n_assign(&mut a[lo..lo + n], &tp[..n]);
    if qh != 0 {
        cy += sub_n_assign(&mut a[n..n + lo], &d[..lo]);
    }
    while cy > 0 {
        qh = qh.wrapping_sub(sub_1_assign(&mut q[lo..], 1));
        cy -= add_n_assign(&mut a[lo..lo + n], d);
    }

    // Low half, same dance against d's top half.
    let ql = {
        let (qlo, _) = q.split_at_mut(lo);
        if lo < DIV_DIVIDE_THRESHOLD {
            div_basecase(qlo, &mut a[hi..hi + 2 * lo], &d[hi..], inv21)
        } else {
            div_divide_n(qlo, &mut a[hi..hi + 2 * lo], &d[hi..], inv21, &mut tp[..lo])
        }
    };

    mul(&mut tp[..n], &d[..hi], &q[..lo]);
    let mut cy = sub_n_assign(&mut a[..n], &tp[..n]);
    if ql != 0 {
        cy += sub_n_assign(&mut a[lo..lo + hi], &d[..hi]);
    }
    while cy > 0 {
        sub_1_assign(&mut q[..lo], 1);
        cy -= add_n_assign(&mut a[..n], d);
    }
    qh
}

/// Divide-and-conquer entry: `na >= 2·nb`, `nb >= 6`, `d` normalized.
///
/// `q` receives `na - nb` limbs, the remainder replaces `a[..nb]`;
/// returns `qh`.
pub fn div_divide(q: &mut [Limb], a: &mut [Limb], d: &[Limb], inv21: Limb) -> Limb {
    let na = a.len();
    let nb = d.len();
    debug_require!(na >= 2 * nb);
    debug_require!(nb >= 6);
    debug_require!(d[nb - 1] >> 63 == 1);
    debug_assert_eq!(q.len(), na - nb);

    let nq = na - nb;
    let head = nq % nb;
    let base = nq - head;

    // The typically smaller top block first.
    let qh = div(&mut q[base..], &mut a[base..base + nb + head], d);

    let mut tp = scratch(nb);
    let mut off = base;
    while off > 0 {
        off -= nb;
        div_divide_n(&mut q[off..off + nb], &mut a[off..off + 2 * nb], d, inv21, &mut tp);
    }
    qh
}
