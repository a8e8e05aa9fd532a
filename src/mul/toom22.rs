//! Toom-22 (Karatsuba) multiplication
//!
//! Evaluate in -1, 0, +inf:
//!
//! ```text
//!    <-s--><--n-->
//!    |-a1-|--a0--|
//!     |b1-|--b0--|
//!     <-t-><--n-->
//!
//! v0  =  a0    · b0       A(0)·B(0)
//! vm1 = (a0-a1)·(b0-b1)   A(-1)·B(-1)
//! vinf=     a1 ·    b1    A(inf)·B(inf)
//! ```

use crate::arena::scratch;
use crate::error::debug_require;
use crate::kernels::{
    add_n, add_n_assign, add_assign, cmp, dec, inc_1, is_zero, sub, sub_n, sub_n_assign,
};
use crate::limb::Limb;
use crate::mul::{mul, mul_n};
use std::cmp::Ordering;

/// `dst = a · b` for near-balanced operands.
///
/// Requires `4/5 <= nb/na <= 1` and `nb >= 5`; destination disjoint from
/// both sources, `dst.len() == na + nb`.
pub fn mul_toom22(dst: &mut [Limb], a: &[Limb], b: &[Limb]) {
    let na = a.len();
    let nb = b.len();
    debug_require!(nb >= 5);
    debug_require!(na >= nb);
    debug_require!(4 * na <= 5 * nb);
    debug_assert_eq!(dst.len(), na + nb);

    let s = na >> 1;
    let n = na - s;
    let t = nb - n;
    debug_assert!(s == n || s == n - 1);
    debug_assert!(t >= 1 && t <= s);

    let (a0, a1) = a.split_at(n);
    let (b0, b1) = b.split_at(n);

    let mut vm1 = scratch(2 * n);
    let mut vm1_neg = false;

    // asm1 = |a0 - a1| in dst[0..n], bsm1 = |b0 - b1| in dst[n..2n]
    {
        let (asm1, rest) = dst.split_at_mut(n);
        let bsm1 = &mut rest[..n];

        if s == n {
            if cmp(a0, a1) == Ordering::Less {
                sub_n(asm1, a1, a0);
                vm1_neg = true;
            } else {
                sub_n(asm1, a0, a1);
            }
        } else {
            // s == n-1
            if a0[s] == 0 && cmp(&a0[..s], a1) == Ordering::Less {
                sub_n(&mut asm1[..s], a1, &a0[..s]);
                asm1[s] = 0;
                vm1_neg = true;
            } else {
                let bo = sub_n(&mut asm1[..s], &a0[..s], a1);
                asm1[s] = a0[s].wrapping_sub(bo);
            }
        }

        if t == n {
            if cmp(b0, b1) == Ordering::Less {
                sub_n(bsm1, b1, b0);
                vm1_neg = !vm1_neg;
            } else {
                sub_n(bsm1, b0, b1);
            }
        } else if is_zero(&b0[t..]) && cmp(&b0[..t], b1) == Ordering::Less {
            sub_n(&mut bsm1[..t], b1, &b0[..t]);
            bsm1[t..].fill(0);
            vm1_neg = !vm1_neg;
        } else {
            sub(bsm1, b0, b1);
        }
    }

    // vm1 = asm1 · bsm1 (both still live in dst's low limbs)
    {
        let (asm1, rest) = dst.split_at(n);
        mul_n(&mut vm1, asm1, &rest[..n]);
    }

    // v0 = a0 · b0 overwrites the evaluations; vinf = a1 · b1 above it
    mul_n(&mut dst[..2 * n], a0, b0);
    mul(&mut dst[2 * n..], a1, b1);

    // Recombine:  dst[n..3n] += v0_hi + v0_lo + vinf_lo + vinf_hi - vm1
    let (mut cy, cy2) = {
        let (lo, hi) = dst.split_at_mut(2 * n);
        // vinf_lo += v0_hi
        let cy = add_n_assign(&mut hi[..n], &lo[n..]);
        // r1 = (v0_hi + vinf_lo) + v0_lo
        let cy2 = cy + {
            let (v0lo, r1) = lo.split_at_mut(n);
            add_n(r1, &hi[..n], v0lo)
        };
        // (v0_hi + vinf_lo) += vinf_hi
        let cy = cy + {
            let (h1, h2) = hi.split_at_mut(n);
            add_assign(h1, &h2[..s + t - n])
        };
        (cy as i64, cy2)
    };

    if vm1_neg {
        cy += add_n_assign(&mut dst[n..3 * n], &vm1[..2 * n]) as i64;
    } else {
        cy -= sub_n_assign(&mut dst[n..3 * n], &vm1[..2 * n]) as i64;
    }

    // Carries last; proved not to overflow when s + t > n.
    inc_1(&mut dst[2 * n..], cy2);
    if cy < 0 {
        dec(&mut dst[3 * n..]);
    } else {
        inc_1(&mut dst[3 * n..], cy as Limb);
    }
}
