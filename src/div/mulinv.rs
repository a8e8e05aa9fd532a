//! Division by multiplicative inverse
//!
//! Precompute an `ni`-limb approximate reciprocal of the top of the
//! divisor, then peel `ni`-limb quotient slabs off the numerator: each
//! slab is one multiplication by the reciprocal, and the running remainder
//! is corrected with one product of `d` by the slab — a full product for
//! moderate divisors, a Mersenne-ring product once `d·q` would itself
//! cross the schoolbook threshold. Any quotient overshoot is repaired by a
//! bounded loop. The Mersenne ring can be tight by one limb in pathological
//! configurations; the wrap test below compensates after the fact rather
//! than constraining `mn` up front.

use crate::arena::scratch;
use crate::div::DIV_MULINV_MODM_THRESHOLD;
use crate::error::{debug_require, hard_assert};
use crate::inv::invappr;
use crate::kernels::{add_1, add_n, cmp, inc, sub_1_assign, sub_n_assign, sub_nc_assign};
use crate::limb::Limb;
use crate::mul::{fft_next_size, mul, mul_mersenne, mul_n};
use std::cmp::Ordering;

/// Reciprocal length that balances precision against per-slab work for a
/// quotient of `nq` limbs and a divisor of `nb`.
pub fn inv_size(nq: usize, nb: usize) -> usize {
    if nq > nb {
        let b = (nq - 1) / nb + 1; // ceil(nq/nb) blocks
        (nq - 1) / b + 1 // ceil(nq/b)
    } else if 3 * nq > nb {
        (nq - 1) / 2 + 1
    } else {
        nq
    }
}

/// Precompute the reciprocal used by [`div_mulinv`]:
/// `dst = invappr((ni+1 most significant limbs of d) + 1) / B`.
///
/// `dst` is `ni` limbs; `d` must be normalized with `nb >= ni >= 1`. When
/// the increment overflows, the top of `d` is all ones and the reciprocal
/// is zero.
pub fn inv_prediv(dst: &mut [Limb], d: &[Limb], ni: usize) {
    let nb = d.len();
    debug_require!(nb >= ni && ni > 0);
    debug_require!(d[nb - 1] >> 63 == 1);
    debug_assert_eq!(dst.len(), ni);

    let mut tp = scratch(ni + 1);
    let cy = if nb == ni {
        tp[1..].copy_from_slice(&d[..ni]);
        tp[0] = 1;
        0
    } else {
        add_1(&mut tp, &d[nb - (ni + 1)..], 1)
    };
    if cy != 0 {
        dst.fill(0);
    } else {
        let mut appr = scratch(ni + 1);
        invappr(&mut appr, &tp, ni + 1);
        dst.copy_from_slice(&appr[1..]);
    }
}

/// Divide `a` by the normalized `d` using the precomputed reciprocal.
///
/// `q` receives `na - nb` limbs, the remainder replaces `a[..nb]`;
/// returns `qh`. Requires `na >= nb >= ni >= 1`, the top bit of `d` set,
/// and `inv == inv_prediv(d, ni)`.
pub fn div_mulinv(q: &mut [Limb], a: &mut [Limb], d: &[Limb], inv: &[Limb]) -> Limb {
    let na = a.len();
    let nb = d.len();
    let mut ni = inv.len();
    debug_require!(na >= nb && nb >= ni);
    debug_require!(ni > 0);
    debug_require!(d[nb - 1] >> 63 == 1);
    debug_assert_eq!(q.len(), na - nb);

    let nq = na - nb;
    let ntp = ni.min(nq) + nb;
    let mut tp = scratch(ntp + 1);
    let mut inv_off = 0;

    let qh = if cmp(&a[nq..], d) != Ordering::Less {
        sub_n_assign(&mut a[nq..], d);
        1
    } else {
        0
    };

    let mut pos = nq;
    while pos > 0 {
        if pos < ni {
            inv_off += ni - pos;
            ni = pos;
        }
        pos -= ni;

        // Quotient slab estimate: top ni limbs of a times the reciprocal,
        // plus the implicit-one contribution. The add provably cannot
        // carry out of the slab.
        mul_n(&mut tp[..2 * ni], &a[pos + nb..pos + nb + ni], &inv[inv_off..inv_off + ni]);
        let est_cy = add_n(
            &mut q[pos..pos + ni],
            &tp[ni..2 * ni],
            &a[pos + nb..pos + nb + ni],
        );
        hard_assert!(est_cy == 0);

        // Correction product x = d·slab, through the Mersenne ring when
        // the full product would be schoolbook-expensive.
        let mut use_mn = 0usize;
        if nb >= DIV_MULINV_MODM_THRESHOLD {
            let mn = fft_next_size(nb + 1);
            if mn < nb + ni {
                use_mn = mn;
            }
        }
        if use_mn == 0 {
            // nb + ni limbs; the high ni cancel against the consumed top.
            mul(&mut tp[..nb + ni], d, &q[pos..pos + ni]);
        } else {
            let mn = use_mn;
            let wn = nb + ni - mn;
            mul_mersenne(&mut tp[..mn], mn, d, &q[pos..pos + ni]);

            // tp -= ah·B^0 (mod B^mn - 1); a zero result is kept as
            // B^mn - 1 so the low-part comparison below still works.
            let cy = sub_nc_assign(&mut tp[..wn], &a[pos + mn..pos + mn + wn], 1);
            let cy = if cy != 0 {
                sub_1_assign(&mut tp[wn..mn], 1)
            } else {
                0
            };
            if cy == 0 {
                inc(&mut tp[..mn]);
            }

            // If the low part of a is far below tp, the ring wrapped by
            // one: undo it. (Either ah was one too big, or the zero
            // residue stood in for an exact B^mn - 1.)
            if cmp(&a[pos + nb..pos + mn], &tp[nb..mn]) == Ordering::Less {
                tp[mn] = 0;
                inc(&mut tp[..mn + 1]);
            }
        }

        // Subtract x from the window and repair any overshoot.
        let mut r = a[pos + nb].wrapping_sub(tp[nb]);
        let cy = sub_n_assign(&mut a[pos..pos + nb], &tp[..nb]);
        r = r.wrapping_sub(cy);
        while r != 0 || cmp(&a[pos..pos + nb], d) != Ordering::Less {
            inc(&mut q[pos..]);
            let cy = sub_n_assign(&mut a[pos..pos + nb], d);
            r = r.wrapping_sub(cy);
        }
    }
    qh
}
