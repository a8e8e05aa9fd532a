//! Approximate reciprocals by Newton iteration
//!
//! For a normalized divisor `d` of `n` limbs the reciprocal is the
//! `n`-limb value `r` with `r + B^n = ⌊(B^{2n} - 1)/d⌋` (the leading limb
//! is always 1 and stays implicit). [`invappr`] returns `r̃` with
//! `r - 1 <= r̃ <= r`; division layers compensate for the possible `-1`.
//!
//! Small divisors invert directly: `(B^{2n} - 1 - d·B^n) div d` seeded
//! from the closed-form 1- and 2-limb inverses. Larger ones lift an
//! approximation of the top half of `d`, roughly doubling the precision
//! per step; the residual `r̃·d - B^{n+nr}` is computed either modulo
//! `B^{n+1}` (a plain multiply) or modulo `B^{mn} - 1` (a Mersenne
//! multiply once that ring fits below `n + nr`), and its sign decides a
//! final ±1 adjustment. At every step `|rem| < d` keeps the estimate
//! within one of the exact floor.

use crate::arena::scratch;
use crate::div::{div_2, div_basecase, div_divide, DIV_DIVIDE_THRESHOLD};
use crate::error::{debug_require, hard_assert};
use crate::kernels::{
    add_n_assign, add_nc, add_nc_assign, cmp, dec, dec_1, inc, not_n, shr_c_assign, sub_n_assign,
    sub_nc,
};
use crate::limb::{inv_1, inv_2_1, leading_zeros, Limb, LIMB_BITS};
use crate::mul::{fft_next_size, mul, mul_mersenne, mul_n};
use smallvec::SmallVec;
use std::cmp::Ordering;

/// Newton iteration takes over past this size.
pub const INV_NEWTON_THRESHOLD: usize = 21;
/// The lift switches to the Mersenne-ring residual past this size.
pub const INV_MODM_THRESHOLD: usize = 734;

/// Direct reciprocal: `dst = ⌊(B^{2n} - 1)/d⌋ - B^n`, exact.
///
/// `dst` and `d` are `n` limbs, `d` normalized, destination disjoint.
pub fn inv_basecase(dst: &mut [Limb], d: &[Limb]) {
    let na = d.len();
    debug_require!(na > 0);
    debug_require!(d[na - 1] >> 63 == 1);
    debug_assert_eq!(dst.len(), na);

    if na == 1 {
        dst[0] = inv_1(d[0]);
        return;
    }

    // B^{2n} - 1 - d·B^n : all-ones low half, complemented d above.
    let mut xp = scratch(2 * na);
    xp[..na].fill(Limb::MAX);
    {
        let (_, hi) = xp.split_at_mut(na);
        not_n(hi, d);
    }

    if na == 2 {
        div_2(dst, &mut xp, d);
    } else {
        let inv21 = inv_2_1(d[na - 1], d[na - 2]);
        if na < DIV_DIVIDE_THRESHOLD {
            div_basecase(dst, &mut xp, d, inv21);
        } else {
            div_divide(dst, &mut xp, d, inv21);
        }
    }
}

/// Newton lift: `dst = ⌊(B^{2n} - 1)/d⌋ - B^n + (0 | -1)`.
///
/// `dst` and `d` are `n` limbs with `n > 4`, `d` normalized, destination
/// disjoint.
pub fn invappr_newton(dst: &mut [Limb], d: &[Limb]) {
    let n0 = d.len();
    debug_require!(n0 > 4);
    debug_require!(d[n0 - 1] >> 63 == 1);
    debug_assert_eq!(dst.len(), n0);

    // Precision ladder down to the basecase.
    let mut sizes: SmallVec<[usize; LIMB_BITS as usize]> = SmallVec::new();
    let mut nr = n0;
    loop {
        sizes.push(nr);
        nr = (nr >> 1) + 1;
        if nr < INV_NEWTON_THRESHOLD {
            break;
        }
    }

    inv_basecase(&mut dst[n0 - nr..], &d[n0 - nr..]);

    let mut xp = scratch(3 * (n0 >> 1) + 3);
    for &na in sizes.iter().rev() {
        let dw = n0 - na; // current na-limb window of d
        let rr = n0 - nr; // current nr-limb approximation in dst

        // rem = r̃·d - B^{na+nr}, tracked modulo B^{na+1} or B^{mn} - 1.
        // -2·B^na < rem < 2·B^na.
        let mn = fft_next_size(na + 1);
        let plain = na < INV_MODM_THRESHOLD || mn >= na + nr;
        if plain {
            mul(&mut xp[..na + nr], &d[dw..], &dst[rr..]);
            add_n_assign(&mut xp[nr..na + 1], &d[dw..dw + na + 1 - nr]);
        } else {
            // nr < na < mn < na + nr
            mul_mersenne(&mut xp[..mn], mn, &d[dw..], &dst[rr..]);

            // xp += d·B^nr (mod B^mn - 1): the tail wraps to the bottom.
            let cy = add_n_assign(&mut xp[nr..mn], &d[dw..dw + mn - nr]);
            let xlen = na - (mn - nr);
            let cy = add_nc_assign(&mut xp[..xlen], &d[n0 - xlen..], cy);

            // xp -= B^{na+nr} (mod B^mn - 1), with a sentinel guarding the
            // borrow's reach.
            xp[mn] = 1;
            dec_1(&mut xp[na + nr - mn..mn + 1], 1 - cy);
            let low_borrow = 1 - xp[mn];
            dec_1(&mut xp[..mn], low_borrow);
        }

        // Normalize to -B^na < rem < 0, nudging r̃ so the truncated
        // residual keeps the estimate within one of the floor.
        if xp[na] < 2 {
            // rem >= 0
            let mut cy = xp[na];
            if cy != 0 {
                if sub_n_assign(&mut xp[..na], &d[dw..]) == 0 {
                    cy += 1;
                    sub_n_assign(&mut xp[..na], &d[dw..]);
                }
            }
            if cmp(&xp[..na], &d[dw..]) != Ordering::Less {
                sub_n_assign(&mut xp[..na], &d[dw..]);
                cy += 1;
            }
            // 0 < d - rem <= d; keep its top nr limbs.
            let bin = (cmp(&xp[..na - nr], &d[dw..dw + na - nr]) == Ordering::Greater) as Limb;
            {
                let (lo, hi) = xp.split_at_mut(2 * nr);
                sub_nc(&mut hi[..nr], &d[n0 - nr..], &lo[na - nr..na], bin);
            }
            cy += 1;
            dec_1(&mut dst[rr..], cy);
        } else {
            // rem < 0
            if plain {
                dec(&mut xp[..na + 1]);
            }
            if xp[na] != Limb::MAX {
                let cy = add_n_assign(&mut xp[..na], &d[dw..]);
                hard_assert!(xp[na] + cy == Limb::MAX);
                inc(&mut dst[rr..]);
            }
            // top nr limbs of -rem
            let (lo, hi) = xp.split_at_mut(2 * nr);
            not_n(&mut hi[..nr], &lo[na - nr..na]);
        }

        // dst[dw..rr] = high part of r̃ · trunc(-rem / B^{na-nr}), i.e. the
        // refined low limbs; the implicit 1 of r̃ contributes the operand
        // itself one position up.
        {
            let (lo, hi) = xp.split_at_mut(2 * nr);
            mul_n(lo, &hi[..nr], &dst[rr..rr + nr]);
        }
        let cy = {
            let (lo, hi) = xp.split_at_mut(2 * nr);
            add_n_assign(&mut lo[nr..3 * nr - na], &hi[..2 * nr - na])
        };
        let cy = add_nc(
            &mut dst[dw..rr],
            &xp[3 * nr - na..2 * nr],
            &xp[4 * nr - na..3 * nr],
            cy,
        );
        if cy != 0 {
            inc(&mut dst[rr..]);
        }

        nr = na;
    }
}

/// Approximate reciprocal front door: exact below the Newton threshold,
/// within one above it.
pub fn invappr(dst: &mut [Limb], d: &[Limb], na: usize) {
    debug_assert!(d.len() >= na && dst.len() >= na);
    if na < INV_NEWTON_THRESHOLD {
        inv_basecase(&mut dst[..na], &d[..na]);
    } else {
        invappr_newton(&mut dst[..na], &d[..na]);
    }
}

/// Reciprocal of an arbitrary canonical `d`, extended by `nf` fraction
/// limbs.
///
/// `dst` takes `na + nf + 1` limbs. The divisor is shifted into normalized
/// position internally and the result shifted back, folding in the
/// otherwise-implicit leading limb; an already-normalized divisor gets the
/// explicit top limb 1 instead.
pub fn inv(dst: &mut [Limb], d: &[Limb], nf: usize) {
    let na = d.len();
    debug_require!(na > 0 && d[na - 1] != 0);
    debug_assert_eq!(dst.len(), na + nf + 1);

    let nsh = leading_zeros(d[na - 1]);
    if nsh == 0 && nf == 0 {
        invappr(dst, d, na);
        dst[na] = 1;
        return;
    }
    let nf2 = nf + (nsh != 0) as usize;
    let mut d2 = scratch(na + nf2);
    if nsh != 0 {
        crate::kernels::shl(&mut d2[nf2..], d, nsh);
    } else {
        d2[nf2..].copy_from_slice(d);
    }
    invappr(dst, &d2, na + nf2);
    if nsh != 0 {
        shr_c_assign(&mut dst[..na + nf2], LIMB_BITS - nsh, 1 << nsh);
    } else {
        dst[na + nf2] = 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::normalized_len;

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

    // Exact floor((B^{2n}-1)/d) - B^n via division.
    fn exact_reciprocal(d: &[u64]) -> Vec<u64> {
        let n = d.len();
        let mut num = vec![u64::MAX; 2 * n];
        let mut q = vec![0u64; n];
        let qh = crate::div::div(&mut q, &mut num, d);
        assert_eq!(qh, 1); // quotient is B^n + r
        q
    }

    fn check_bound(d: &[u64]) {
        let n = d.len();
        let mut appr = vec![0u64; n];
        invappr(&mut appr, d, n);
        let exact = exact_reciprocal(d);
        // r - 1 <= r̃ <= r
        let mut low = exact.clone();
        let under = crate::kernels::sub_1_assign(&mut low, 1);
        let ok_exact = appr == exact;
        let ok_minus1 = under == 0 && appr == low;
        assert!(ok_exact || ok_minus1, "reciprocal out of bounds, n={n}");
    }

    #[test]
    fn basecase_all_ones() {
        // d = B^n - 1: reciprocal is exactly 1.
        for n in [1usize, 2, 3, 8, 16] {
            let d = vec![u64::MAX; n];
            let mut r = vec![0u64; n];
            inv_basecase(&mut r, &d);
            let mut want = vec![0u64; n];
            want[0] = 1;
            assert_eq!(r, want, "n={n}");
        }
    }

    #[test]
    fn basecase_power_of_two() {
        // d = B^n/2: (B^{2n}-1)/d = 2·B^n + (2·B^n - ...)/d; floor is
        // 2·B^n - ... easier checked against the exact divider.
        for n in [1usize, 2, 5, 12] {
            let mut d = vec![0u64; n];
            d[n - 1] = 1 << 63;
            let mut r = vec![0u64; n];
            inv_basecase(&mut r, &d);
            assert_eq!(r, exact_reciprocal(&d), "n={n}");
        }
    }

    #[test]
    fn newton_matches_bound() {
        for n in [21usize, 25, 33, 48, 70, 111] {
            let mut d = pattern(n, n as u64);
            d[n - 1] |= 1 << 63;
            check_bound(&d);
        }
    }

    #[test]
    fn newton_all_ones() {
        let n = 40;
        let d = vec![u64::MAX; n];
        let mut appr = vec![0u64; n];
        invappr(&mut appr, &d, n);
        // exact value is 1; the approximation may also return 0
        let v = normalized_len(&appr);
        assert!(v == 0 || (v == 1 && appr[0] == 1));
    }

    #[test]
    fn full_inverse_unnormalized() {
        // inv() of a shifted divisor agrees with invappr of the
        // normalized one, rotated back.
        let n = 10;
        let mut d = pattern(n, 77);
        d[n - 1] |= 1 << 63;
        let mut direct = vec![0u64; n + 1];
        inv(&mut direct, &d, 0);
        let mut appr = vec![0u64; n];
        invappr(&mut appr, &d, n);
        assert_eq!(&direct[..n], &appr[..]);
        assert_eq!(direct[n], 1);
    }
}
