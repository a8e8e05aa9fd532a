//! Five-point Toom interpolation
//!
//! Shared by Toom-33, Toom-42 and the Toom-3 square: given the evaluations
//! `v(-1), v(0), v(1), v(2), v(inf)` of the product polynomial, recover its
//! coefficients in place. The layout contract mirrors the callers:
//!
//! ```text
//!    dst:  |  v0 (2n)  |  v1 (2n+1)  | vinf (spt) |    total 4n + spt
//!                       ^ dst+2n      ^ dst+4n (vinf[0] passed separately
//!                                      because v1's top overlaps it)
//! ```
//!
//! `v2` and `vm1` arrive in caller scratch, `2n+1` limbs each. `vm1_neg`
//! carries the tracked sign of `(a0 - a1 + a2 - a3)·(b0 - b1)`. The exact
//! division by 3 multiplies by the inverse of 3 modulo B and propagates a
//! single-word running carry.

use crate::error::debug_require;
use crate::kernels::{
    add_n_assign, dec_1, half_add_assign, half_rsub_assign, half_sub_assign, inc_1, shl,
    sub_n_assign,
};
use crate::limb::Limb;

/// Inverse of 3 modulo 2^64: 3 · 0xAAAA…AAAB = 1 (mod B).
const MODLIMB_INVERSE_3: Limb = 0xAAAA_AAAA_AAAA_AAAB;

/// In-place exact division by 3.
///
/// The input must be an exact multiple of 3; the running borrow tracks the
/// per-limb correction and must end at zero for exact inputs.
pub fn divexact_by3_assign(a: &mut [Limb]) {
    let mut c: Limb = 0;
    for limb in a.iter_mut() {
        let s = *limb;
        let l = s.wrapping_sub(c);
        c = (l > s) as Limb;
        let q = l.wrapping_mul(MODLIMB_INVERSE_3);
        *limb = q;
        let (l, c1) = q.overflowing_add(q);
        c += c1 as Limb;
        let (_, c2) = l.overflowing_add(q);
        c += c2 as Limb;
    }
}

/// Interpolate the five evaluation points into `dst`.
///
/// See the module docs for the layout. `spt = s + t` is the length of the
/// `vinf` tail and must exceed `n`; `vinf0` is the true low limb of `vinf`.
pub fn toom_interp5(
    dst: &mut [Limb],
    v2: &mut [Limb],
    vm1: &mut [Limb],
    n: usize,
    spt: usize,
    vm1_neg: bool,
    vinf0: Limb,
) {
    let dnp = 2 * n + 1;
    debug_require!(dst.len() == 4 * n + spt);
    debug_require!(spt > n && spt <= 2 * n);
    debug_require!(v2.len() >= dnp && vm1.len() >= dnp);

    // v2 <- (v2 - vm1)/3
    if vm1_neg {
        add_n_assign(&mut v2[..dnp], &vm1[..dnp]);
    } else {
        sub_n_assign(&mut v2[..dnp], &vm1[..dnp]);
    }
    divexact_by3_assign(&mut v2[..dnp]);

    // vm1 <- (v1 - vm1)/2
    if vm1_neg {
        half_add_assign(&mut vm1[..dnp], &dst[2 * n..2 * n + dnp]);
    } else {
        half_rsub_assign(&mut vm1[..dnp], &dst[2 * n..2 * n + dnp]);
    }

    // v1 <- v1 - v0
    {
        let (lo, hi) = dst.split_at_mut(2 * n);
        let bo = sub_n_assign(&mut hi[..2 * n], &lo[..2 * n]);
        hi[2 * n] = hi[2 * n].wrapping_sub(bo);
    }

    // v2 <- (v2 - v1)/2
    half_sub_assign(&mut v2[..dnp], &dst[2 * n..2 * n + dnp]);

    // v1 <- v1 - vm1
    sub_n_assign(&mut dst[2 * n..2 * n + dnp], &vm1[..dnp]);

    // Accumulate vm1 at B^n; the carry lands just past v1.
    let cy = add_n_assign(&mut dst[n..n + dnp], &vm1[..dnp]);
    inc_1(&mut dst[3 * n + 1..], cy);

    // v1's top limb shares storage with vinf[0]; juggle both values.
    let saved = dst[4 * n];
    dst[4 * n] = vinf0;

    // v2 <- v2 - 2·vinf  (vm1's buffer is free now and holds the double)
    let cy = shl(&mut vm1[..spt], &dst[4 * n..4 * n + spt], 1);
    let cy = cy + sub_n_assign(&mut v2[..spt], &vm1[..spt]);
    dec_1(&mut v2[spt..dnp], cy);

    // vinf <- vinf + high half of v2; cannot overflow the result
    let cy = add_n_assign(&mut dst[4 * n..5 * n + 1], &v2[n..dnp]);
    inc_1(&mut dst[5 * n + 1..], cy);

    // v1 <- v1 - vinf (the low spt limbs), restoring the shared limb
    let (vinf0_cur, cy) = {
        let (lo, hi) = dst.split_at_mut(4 * n);
        let cy = sub_n_assign(&mut lo[2 * n..2 * n + spt], &hi[..spt]);
        (hi[0], cy)
    };
    dst[4 * n] = saved;
    dec_1(&mut dst[2 * n + spt..], cy);

    // vm1's slot (at B^n) still owes the low half of v2
    let cy = sub_n_assign(&mut dst[n..2 * n], &v2[..n]);
    dec_1(&mut dst[2 * n..], cy);

    // and v3's slot receives it
    let cy = add_n_assign(&mut dst[3 * n..4 * n], &v2[..n]);
    dst[4 * n] = dst[4 * n].wrapping_add(cy); // cannot carry further
    inc_1(&mut dst[4 * n..], vinf0_cur);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn divexact_by3_small() {
        let mut a = [9u64, 0];
        divexact_by3_assign(&mut a);
        assert_eq!(a, [3, 0]);
    }

    #[test]
    fn divexact_by3_cross_limb() {
        // 3 · (2^64 + 5) = 3·2^64 + 15 = limbs [15, 3]
        let mut a = [15u64, 3];
        divexact_by3_assign(&mut a);
        assert_eq!(a, [5, 1]);
    }

    #[test]
    fn divexact_by3_max() {
        // (2^128 - 1) is divisible by 3: result is 0x5555..55 per limb
        let mut a = [u64::MAX, u64::MAX];
        divexact_by3_assign(&mut a);
        assert_eq!(a, [0x5555_5555_5555_5555, 0x5555_5555_5555_5555]);
    }
}
