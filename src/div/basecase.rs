//! Schoolbook division
//!
//! One 3/2 quotient step per quotient limb, followed by a full-length
//! submul fixup. The divisor's 2-limb reciprocal (`inv_2_1`) turns each
//! step into a multiplication plus at most two conditional corrections.

use crate::error::debug_require;
use crate::kernels::{add_n_assign, cmp, sub_n_assign, submul_1};
use crate::limb::{div_3_2, Limb};
use std::cmp::Ordering;

/// Divide `a` by the normalized `d`, schoolbook.
///
/// `q` receives `na - nb` quotient limbs; the remainder replaces
/// `a[..nb]` (higher limbs of `a` become scratch). Returns `qh`, the
/// quotient limb above `q` (0 or 1). Requires `na >= nb >= 3`, the top bit
/// of `d` set, and `inv21 == inv_2_1(d[nb-1], d[nb-2])`.
pub fn div_basecase(q: &mut [Limb], a: &mut [Limb], d: &[Limb], inv21: Limb) -> Limb {
    let na = a.len();
    let nb = d.len();
    debug_require!(na >= nb);
    debug_require!(nb >= 3);
    debug_require!(d[nb - 1] >> 63 == 1);
    debug_assert_eq!(q.len(), na - nb);

    let nq = na - nb;
    let qh = if cmp(&a[na - nb..], d) != Ordering::Less {
        sub_n_assign(&mut a[na - nb..], d);
        1
    } else {
        0
    };

    let dn = nb - 2;
    let d1 = d[nb - 1];
    let d0 = d[nb - 2];

    for i in (0..nq).rev() {
        let n2 = a[i + dn + 2];
        let n1 = a[i + dn + 1];
        let n0 = a[i + dn];
        let qi;
        if n2 == d1 && n1 == d0 {
            // Quotient saturates; the subtraction consumes the top window.
            qi = Limb::MAX;
            submul_1(&mut a[i..i + nb], d, qi);
        } else {
            let (mut qe, r1, r0) = div_3_2(n2, n1, n0, d1, d0, inv21);
            a[i + dn + 1] = r1;
            a[i + dn] = r0;
            let cy = submul_1(&mut a[i..i + dn], &d[..dn], qe);
            let cy1 = (a[i + dn] < cy) as Limb;
            a[i + dn] = a[i + dn].wrapping_sub(cy);
            let cy2 = a[i + dn + 1] < cy1;
            a[i + dn + 1] = a[i + dn + 1].wrapping_sub(cy1);
            if cy2 {
                add_n_assign(&mut a[i..i + nb], d);
                qe -= 1;
            }
            qi = qe;
        }
        q[i] = qi;
    }
    qh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::{add_assign, normalized_len};
    use crate::limb::inv_2_1;
    use crate::mul::mul;

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

    // Build a = q·d + r, divide, and expect the parts back.
    fn roundtrip(qv: &[u64], d: &[u64], r: &[u64]) {
        assert!(crate::kernels::cmp(&r[..d.len()], d) == Ordering::Less);
        let mut a = if qv.len() >= d.len() {
            let mut t = vec![0u64; qv.len() + d.len()];
            mul(&mut t, qv, d);
            t
        } else {
            let mut t = vec![0u64; qv.len() + d.len()];
            mul(&mut t, d, qv);
            t
        };
        add_assign(&mut a, &r[..d.len()]);
        let na = a.len();
        let nb = d.len();
        let inv21 = inv_2_1(d[nb - 1], d[nb - 2]);
        let mut q = vec![0u64; na - nb];
        let qh = div_basecase(&mut q, &mut a, d, inv21);
        // reassemble the full quotient including qh
        let mut full_q = q.clone();
        full_q.push(qh);
        let qn = normalized_len(&full_q);
        let want_qn = normalized_len(qv);
        assert_eq!(&full_q[..qn], &qv[..want_qn]);
        assert_eq!(&a[..nb], &r[..nb]);
    }

    #[test]
    fn exact_and_offset_division() {
        let mut d = pattern(4, 3);
        d[3] |= 1 << 63;
        let qv = pattern(5, 7);
        roundtrip(&qv, &d, &[0, 0, 0, 0]);
        roundtrip(&qv, &d, &[5, 0, 0, 0]);
        let mut r = d.clone();
        r[3] -= 1; // just below d
        roundtrip(&qv, &d, &r);
    }

    #[test]
    fn saturated_quotient_limb() {
        // All-ones dividend against a divisor whose top window recurs.
        let mut d = vec![u64::MAX; 3];
        d[2] |= 1 << 63;
        let mut a = vec![u64::MAX; 7];
        let inv21 = inv_2_1(d[2], d[1]);
        let mut q = vec![0u64; 4];
        let qh = div_basecase(&mut q, &mut a, &d, inv21);
        // verify a = (qh·B^4 + q)·d + r with r < d
        let mut full_q = q.clone();
        full_q.push(qh);
        let qn = normalized_len(&full_q);
        let mut back = vec![0u64; qn + 3];
        mul(&mut back, &full_q[..qn], &d);
        add_assign(&mut back, &a[..3]);
        assert_eq!(&back[..7], &vec![u64::MAX; 7][..]);
        assert_eq!(normalized_len(&back[7..]), 0);
        assert!(crate::kernels::cmp(&a[..3], &d) == Ordering::Less);
    }

    #[test]
    fn equal_lengths_give_flag_only() {
        let mut d = pattern(5, 11);
        d[4] |= 1 << 63;
        // a = d + small  ->  qh = 1, r = small
        let mut a = d.clone();
        add_assign(&mut a, &[42]);
        let inv21 = inv_2_1(d[4], d[3]);
        let mut q = vec![0u64; 0];
        let qh = div_basecase(&mut q, &mut a, &d, inv21);
        assert_eq!(qh, 1);
        assert_eq!(a, [42, 0, 0, 0, 0]);
    }
}
