//! Schönhage–Strassen multiplication via Fermat and Mersenne rings
//!
//! The full product is assembled from two modular products computed with
//! the same FFT skeleton:
//!
//! - `mul_mersenne`: `a·b mod B^rn - 1` (cyclic convolution, unweighted)
//! - `mul_fermat`:   `a·b mod B^rn + 1` (negacyclic convolution; each input
//!   slice is pre-rotated by `i·n/K` so the plain cyclic FFT applies)
//!
//! and combined by CRT: `(F + M)/2` yields the low half, a subtraction the
//! high half, with one conditional decrement absorbing the wrap.
//!
//! Coefficients live in the inner ring `Z/(2^n + 1)` with `n = 64·lenw`
//! bits, stored in `lenw + 1` limbs and kept **fully reduced** in
//! `[0, 2^n]` (top limb set only for the value `2^n` itself). Butterflies
//! are shift-add-subtract sequences; every twiddle is a power of two in the
//! ring, so no general multiplication happens inside the transform.
//! Pointwise products recurse into the whole skeleton once coefficients
//! are large enough, and fall back to the ordinary multiply dispatcher
//! below that.
//!
//! A coefficient that exceeds its ring means the transform length `k` was
//! chosen too small for the operand shape; that is a bug in the parameter
//! table, not a runtime condition, and is guarded by debug assertions.

use crate::arena::scratch;
use crate::error::{debug_require, hard_assert};
use crate::kernels::{
    add, add_1_assign, add_assign, add_n_assign, cmp, dec, dec_1, half_add_nc_assign, inc,
    is_zero, shl_assign, shr, sub, sub_1_assign, sub_n, sub_n_assign,
};
use crate::limb::{Limb, LIMB_BITS};
use crate::mul::{mul_n, sqr, MUL_FFT_MODF_THRESHOLD};
use std::cmp::Ordering;

/// Threshold table: smallest operand (in limbs) at which each transform
/// log-size `k` wins. Rows are `(rn_floor, k)`; lookups scan until the next
/// row's floor exceeds `rn`. The sentinel row never matches a real length.
#[rustfmt::skip]
const FFT_TABLE: &[(usize, usize)] = &[
    (0, 6),
    (1597, 7),
    (1655, 6),
    (1917, 7),
    (3447, 8),
    (3565, 7),
    (3831, 8),
    (7661, 9),
    (8145, 8),
    (8685, 9),
    (14289, 10),
    (16289, 9),
    (20433, 10),
    (24481, 9),
    (26577, 10),
    (28593, 11),
    (32545, 10),
    (57249, 11),
    (65313, 10),
    (73633, 11),
    (98081, 12),
    (130625, 11),
    (196385, 12),
    (261697, 11),
    (294689, 12),
    (392769, 13),
    (523265, 12),
    (654913, 11),
    (917281, 13),
    (1047553, 11),
    (1600001, 12),
    (1834561, 14),
    (2095105, 12),
    ((3 << 21) + 1, 13),
    ((3 << 23) + 1, 14),
    ((3 << 25) + 1, 15),
    ((3 << 27) + 1, 16),
    ((3 << 29) + 1, 17),
    ((3 << 31) + 1, 18),
    ((3 << 33) + 1, 19),
    ((3 << 35) + 1, 20),
    ((3 << 37) + 1, 21),
    ((3 << 39) + 1, 22),
    ((3 << 41) + 1, 23),
    ((3 << 43) + 1, 24),
    ((3 << 45) + 1, 25),
    ((3 << 47) + 1, 26),
    ((3 << 49) + 1, 27),
    ((3 << 51) + 1, 28),
    (usize::MAX, 127),
];

/// Best FFT log-size for a modular product of `rn` limbs.
fn fft_best_k(rn: usize) -> usize {
    let mut i = 0;
    while rn >= FFT_TABLE[i + 1].0 {
        i += 1;
    }
    FFT_TABLE[i].1
}

/// Smallest workable Fermat/Mersenne product size at or above `n` limbs.
///
/// The returned size satisfies `fft_best_k(next) == fft_best_k(n)` and the
/// divisibility the transform needs.
pub fn fft_next_size(n: usize) -> usize {
    let k = fft_best_k(n);
    debug_assert!(k >= LIMB_BITS.trailing_zeros() as usize);
    let k = k - 6;
    (((n - 1) >> k) + 1) << k
}

// ---------------------------------------------------------------------------
// Inner coefficient ring Z/(2^n + 1), n = 64·l bits
// ---------------------------------------------------------------------------

/// Arithmetic over the inner Fermat ring. Coefficients are `l + 1` limbs,
/// fully reduced: value in `[0, 2^n]`, top limb nonzero only for `2^n`.
#[derive(Clone, Copy)]
struct Ring {
    l: usize,
}

impl Ring {
    #[inline]
    fn nlen(&self) -> usize {
        self.l + 1
    }

    #[inline]
    fn bits(&self) -> usize {
        self.l * 64
    }

    /// Fold an arbitrary top limb back into the low part:
    /// `low + top·2^n  ->  low - top (mod 2^n + 1)`, fully reduced.
    fn reduce_top(&self, x: &mut [Limb]) {
        let l = self.l;
        let th = x[l];
        x[l] = 0;
        if sub_1_assign(&mut x[..l], th) != 0 {
            let cy = add_1_assign(&mut x[..l], 1);
            x[l] = cy;
        }
    }

    /// `a = (a + b) mod 2^n + 1`.
    fn add_mod_assign(&self, a: &mut [Limb], b: &[Limb]) {
        let cy = add_n_assign(a, b);
        debug_assert_eq!(cy, 0); // top limbs are tiny, the sum fits
        self.reduce_top(a);
    }

    /// `r = (a - b) mod 2^n + 1` with `r` disjoint from both.
    fn sub_mod(&self, r: &mut [Limb], a: &[Limb], b: &[Limb]) {
        if cmp(a, b) != Ordering::Less {
            sub_n(r, a, b);
        } else {
            sub_n(r, b, a);
            self.negate_mod(r);
        }
    }

    /// `x = -x mod 2^n + 1` (zero stays zero).
    fn negate_mod(&self, x: &mut [Limb]) {
        let l = self.l;
        if is_zero(x) {
            return;
        }
        if x[l] != 0 {
            // x == 2^n, and -2^n = 1
            x[l] = 0;
            x[0] = 1;
            return;
        }
        for limb in x[..l].iter_mut() {
            *limb = !*limb;
        }
        let cy = add_1_assign(&mut x[..l], 2);
        x[l] = cy;
    }

    /// `x = x · 2^s mod 2^n + 1` for `0 <= s < 2n`.
    ///
    /// `tmp` needs `2l + 2` limbs. A shift by `n` is a negation, so the
    /// general case reduces to `s < n` followed by at most one negation,
    /// and the shifted value folds once.
    fn shl_mod(&self, x: &mut [Limb], s: usize, tmp: &mut [Limb]) {
        let l = self.l;
        let n_bits = self.bits();
        debug_assert!(s < 2 * n_bits);
        debug_assert!(tmp.len() >= 2 * l + 2);
        if s == 0 {
            return;
        }
        let (s, negate) = if s >= n_bits {
            (s - n_bits, true)
        } else {
            (s, false)
        };
        if s > 0 {
            let q = s / 64;
            let r = (s % 64) as u32;
            let used = q + l + 2;
            tmp[..q].fill(0);
            tmp[q..q + l + 1].copy_from_slice(x);
            tmp[q + l + 1] = 0;
            if r > 0 {
                let out = shl_assign(&mut tmp[q..used], r);
                debug_assert_eq!(out, 0);
            }
            // Fold: value = low(l limbs) + H·2^n, H < 2^s <= 2^(n-1),
            // so H occupies at most l limbs of the shifted image.
            debug_assert!(used <= 2 * l + 2);
            debug_assert!(is_zero(&tmp[2 * l..used.max(2 * l)]));
            x[l] = 0;
            x[..l].copy_from_slice(&tmp[..l]);
            let h_end = used.min(2 * l);
            let bo = {
                let (_, hi) = tmp.split_at(l);
                sub_n_assign(&mut x[..h_end - l], &hi[..h_end - l])
            };
            let bo = if h_end - l < l && bo != 0 {
                sub_1_assign(&mut x[h_end - l..l], 1)
            } else {
                bo
            };
            if bo != 0 {
                let cy = add_1_assign(&mut x[..l], 1);
                x[l] = cy;
            }
        }
        if negate {
            self.negate_mod(x);
        }
    }

    /// Reduce a double-width product `t` (`2l + 2` limbs) into `dst`
    /// (`l + 1` limbs): `t0 - t1 + t2 (mod 2^n + 1)`.
    fn reduce_double(&self, dst: &mut [Limb], t: &[Limb]) {
        let l = self.l;
        debug_assert!(t[2 * l + 1] == 0 && t[2 * l] <= 1);
        let bo = sub_n(&mut dst[..l], &t[..l], &t[l..2 * l]);
        dst[l] = 0;
        let cy = add_1_assign(dst, bo + t[2 * l]);
        debug_assert_eq!(cy, 0);
    }
}

// ---------------------------------------------------------------------------
// Transform machinery
// ---------------------------------------------------------------------------

/// Two distinct coefficients of a flat coefficient buffer.
fn pair_mut(flat: &mut [Limb], nlen: usize, i: usize, j: usize) -> (&mut [Limb], &mut [Limb]) {
    debug_assert!(i < j);
    let (lo, hi) = flat.split_at_mut(j * nlen);
    (&mut lo[i * nlen..(i + 1) * nlen], &mut hi[..nlen])
}

/// Forward butterfly: `(a, b) <- (a + b, (a - b)·2^w)`.
fn fwd_bfy(ring: Ring, flat: &mut [Limb], ia: usize, ib: usize, w: usize, t1: &mut [Limb], t2: &mut [Limb]) {
    let (a, b) = pair_mut(flat, ring.nlen(), ia, ib);
    ring.sub_mod(t1, a, b);
    ring.add_mod_assign(a, b);
    ring.shl_mod(t1, w, t2);
    b.copy_from_slice(&t1[..ring.nlen()]);
}

/// Inverse butterfly: `(a, b) <- (a + b/2^w, a - b/2^w)`.
fn inv_bfy(ring: Ring, flat: &mut [Limb], ia: usize, ib: usize, w: usize, t1: &mut [Limb], t2: &mut [Limb]) {
    let (a, b) = pair_mut(flat, ring.nlen(), ia, ib);
    if w > 0 {
        ring.shl_mod(b, 2 * ring.bits() - w, t2);
    }
    ring.sub_mod(t1, a, b);
    ring.add_mod_assign(a, b);
    b.copy_from_slice(&t1[..ring.nlen()]);
}

/// Decimation-in-frequency forward transform over `2^k` coefficients
/// starting at `base`; `w` is the twiddle step in bits at this level.
fn fft_fwd(ring: Ring, flat: &mut [Limb], base: usize, k: usize, w: usize, t1: &mut [Limb], t2: &mut [Limb]) {
    if k == 0 {
        return;
    }
    let half = 1usize << (k - 1);
    for i in 0..half {
        fwd_bfy(ring, flat, base + i, base + i + half, i * w, t1, t2);
    }
    fft_fwd(ring, flat, base, k - 1, 2 * w, t1, t2);
    fft_fwd(ring, flat, base + half, k - 1, 2 * w, t1, t2);
}

/// Inverse transform; the exact mirror of [`fft_fwd`], leaving every
/// coefficient multiplied by `2^k`.
fn fft_inv(ring: Ring, flat: &mut [Limb], base: usize, k: usize, w: usize, t1: &mut [Limb], t2: &mut [Limb]) {
    if k == 0 {
        return;
    }
    let half = 1usize << (k - 1);
    fft_inv(ring, flat, base, k - 1, 2 * w, t1, t2);
    fft_inv(ring, flat, base + half, k - 1, 2 * w, t1, t2);
    for i in 0..half {
        inv_bfy(ring, flat, base + i, base + i + half, i * w, t1, t2);
    }
}

/// Extract one coefficient: `lenw + 1` limbs from `bits` bits of `src`
/// starting at `bitoffset`.
fn extract_coef(dst: &mut [Limb], src: &[Limb], bitoffset: usize, bits: usize, lenw: usize) {
    debug_assert!(bits > 0 && bitoffset + bits <= src.len() * 64);
    let shr_bits = (bitoffset % 64) as u32;
    let offset = bitoffset / 64;
    let lena = (bitoffset + bits - 1) / 64 - offset + 1;
    let endp = (bits - 1) / 64;

    if shr_bits > 0 {
        shr(&mut dst[..lena], &src[offset..offset + lena], shr_bits);
    } else {
        dst[..lena].copy_from_slice(&src[offset..offset + lena]);
    }
    let rem = (bits % 64) as u32;
    if rem > 0 {
        dst[endp] &= Limb::MAX >> (64 - rem);
    }
    dst[endp + 1..lenw + 1].fill(0);
}

/// Transform parameters shared by the Fermat and Mersenne drivers.
struct Params {
    k: usize,
    big_k: usize,
    m_bits: usize,
    ring: Ring,
}

impl Params {
    /// Fermat shape: coefficients get `2M + k + 2` bits, rounded up to a
    /// multiple of 64 and of `K` (the pre-rotations need `n/K` integral).
    fn fermat(rn: usize) -> Params {
        let k = fft_best_k(rn);
        let big_k = 1usize << k;
        let n_bits = rn * 64;
        debug_require!(n_bits % big_k == 0);
        let m_bits = n_bits >> k;
        let mut n = 2 * m_bits + k + 2;
        n = (n + 63) & !63usize;
        n = (((n - 1) >> k) + 1) << k;
        Params {
            k,
            big_k,
            m_bits,
            ring: Ring { l: n / 64 },
        }
    }

    /// Mersenne shape: two bits narrower, aligned to `K/2` (no rotations,
    /// but the twiddle step `2n/K` must be integral).
    fn mersenne(rn: usize) -> Params {
        let k = fft_best_k(rn);
        let big_k = 1usize << k;
        let n_bits = rn * 64;
        debug_require!(n_bits % big_k == 0);
        let m_bits = n_bits >> k;
        let mut n = 2 * m_bits + k;
        n = (n + 63) & !63usize;
        n = (((n - 1) >> (k - 1)) + 1) << (k - 1);
        Params {
            k,
            big_k,
            m_bits,
            ring: Ring { l: n / 64 },
        }
    }

    /// Twiddle step of the top transform level, in bits.
    fn w0(&self) -> usize {
        2 * self.ring.bits() >> self.k
    }

    /// Cut `src` into `K` weighted slices (see module docs); `fermat`
    /// selects the extra bit on the last slice and the pre-rotations.
    fn decompose(
        &self,
        flat: &mut [Limb],
        src: &[Limb],
        fermat: bool,
        t2: &mut [Limb],
    ) {
        let nlen = self.ring.nlen();
        let mut rest = src.len() * 64;
        for i in 0..self.big_k {
            let c = &mut flat[i * nlen..(i + 1) * nlen];
            if rest > 0 {
                let cap = if fermat && i == self.big_k - 1 {
                    self.m_bits + 1
                } else {
                    self.m_bits
                };
                let bits = rest.min(cap);
                extract_coef(c, src, i * self.m_bits, bits, self.ring.l);
                rest -= bits;
                if fermat && i > 0 {
                    let rot = i * self.ring.bits() >> self.k;
                    self.ring.shl_mod(c, rot, t2);
                }
            } else {
                c.fill(0);
            }
        }
    }

    /// Pointwise products `ca[i] <- ca[i]·cb[i] mod 2^n + 1` (squares when
    /// `cb` is absent). Recurses into the full skeleton for coefficients
    /// past the inner threshold, provided the recursive shape still
    /// satisfies the transform's divisibility.
    fn pointwise(&self, ca: &mut [Limb], cb: Option<&[Limb]>) {
        let l = self.ring.l;
        let nlen = self.ring.nlen();
        let deep = l >= MUL_FFT_MODF_THRESHOLD && (l * 64) % (1usize << fft_best_k(l)) == 0;
        let mut prod = scratch(2 * nlen);
        for i in 0..self.big_k {
            let c = &mut ca[i * nlen..(i + 1) * nlen];
            if deep {
                match cb {
                    Some(cb) => mul_fermat(&mut prod[..nlen], l, c, &cb[i * nlen..(i + 1) * nlen]),
                    None => {
                        let tmp = c.to_vec();
                        mul_fermat(&mut prod[..nlen], l, &tmp, &tmp);
                    }
                }
                c.copy_from_slice(&prod[..nlen]);
            } else {
                match cb {
                    Some(cb) => mul_n(&mut prod, c, &cb[i * nlen..(i + 1) * nlen]),
                    None => sqr(&mut prod, c),
                }
                self.ring.reduce_double(c, &prod);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Modular products
// ---------------------------------------------------------------------------

/// Signed value of a fully reduced inner-ring coefficient: residues above
/// `2^(n-1)` represent small negatives of the negacyclic convolution.
/// Returns true (and replaces the value by its magnitude) when negative.
fn coef_signum(ring: Ring, c: &mut [Limb]) -> bool {
    let l = ring.l;
    let negative = c[l] != 0 || c[l - 1] >> 63 != 0;
    if negative {
        ring.negate_mod(c);
    }
    negative
}

/// A multiplier's forward transform in one ring, reusable while the
/// target size stays the same.
pub(crate) struct BTransform {
    pub(crate) rn: usize,
    coefs: Vec<Limb>,
}

/// Forward-transform `b` for a Fermat product of `rn` limbs.
pub(crate) fn fermat_transform(rn: usize, b: &[Limb]) -> BTransform {
    let p = Params::fermat(rn);
    let ring = p.ring;
    let mut t1 = scratch(ring.nlen());
    let mut t2 = scratch(2 * ring.l + 2);
    let mut cb = vec![0 as Limb; p.big_k * ring.nlen()];
    p.decompose(&mut cb, b, true, &mut t2);
    fft_fwd(ring, &mut cb, 0, p.k, p.w0(), &mut t1, &mut t2);
    BTransform { rn, coefs: cb }
}

/// Forward-transform `b` for a Mersenne product of `rn` limbs.
pub(crate) fn mersenne_transform(rn: usize, b: &[Limb]) -> BTransform {
    let p = Params::mersenne(rn);
    let ring = p.ring;
    let mut t1 = scratch(ring.nlen());
    let mut t2 = scratch(2 * ring.l + 2);
    let mut cb = vec![0 as Limb; p.big_k * ring.nlen()];
    p.decompose(&mut cb, b, false, &mut t2);
    fft_fwd(ring, &mut cb, 0, p.k, p.w0(), &mut t1, &mut t2);
    BTransform { rn, coefs: cb }
}

/// `dst = a · b mod B^rn + 1`, `dst` is `rn + 1` limbs, fully reduced.
///
/// Inputs may be up to `rn + 1` limbs with value below `2·B^rn`. Passing
/// the same slice twice squares it with a single forward transform.
pub fn mul_fermat(dst: &mut [Limb], rn: usize, a: &[Limb], b: &[Limb]) {
    let sqr_mode = std::ptr::eq(a.as_ptr(), b.as_ptr()) && a.len() == b.len();
    if sqr_mode {
        fermat_core(dst, rn, a, None);
    } else {
        let bt = fermat_transform(rn, b);
        fermat_core(dst, rn, a, Some(bt.coefs.as_slice()));
    }
}

/// Fermat product against an already-transformed multiplier (`None`
/// squares `a`).
pub(crate) fn fermat_core(dst: &mut [Limb], rn: usize, a: &[Limb], cb: Option<&[Limb]>) {
    debug_assert_eq!(dst.len(), rn + 1);
    let p = Params::fermat(rn);
    let ring = p.ring;
    let nlen = ring.nlen();

    let mut t1 = scratch(nlen);
    let mut t2 = scratch(2 * ring.l + 2);
    let mut ca = scratch(p.big_k * nlen);

    p.decompose(&mut ca, a, true, &mut t2);
    fft_fwd(ring, &mut ca, 0, p.k, p.w0(), &mut t1, &mut t2);
    p.pointwise(&mut ca, cb);
    fft_inv(ring, &mut ca, 0, p.k, p.w0(), &mut t1, &mut t2);

    // Un-rotate, divide by K, split signs, and accumulate at bit offsets
    // i·M into two non-negative piles; spill past B^rn wraps negatively.
    let mut neg_acc = scratch(rn);
    let mut shifted = scratch(nlen + 1);
    dst.fill(0);
    let mut pos_carry: Limb = 0;
    let mut neg_carry: Limb = 0;
    for i in 0..p.big_k {
        let c = &mut ca[i * nlen..(i + 1) * nlen];
        let unrot = (i * ring.bits() >> p.k) + p.k;
        ring.shl_mod(c, 2 * ring.bits() - unrot, &mut t2);
        let negative = coef_signum(ring, c);

        let q = i * p.m_bits / 64;
        let r = (i * p.m_bits % 64) as u32;
        shifted[..nlen].copy_from_slice(c);
        shifted[nlen] = 0;
        if r > 0 {
            shl_assign(&mut shifted[..nlen + 1], r);
        }
        let (acc, acc_carry, other, other_carry) = if negative {
            (&mut neg_acc[..], &mut neg_carry, &mut dst[..rn], &mut pos_carry)
        } else {
            (&mut dst[..rn], &mut pos_carry, &mut neg_acc[..], &mut neg_carry)
        };
        if q + nlen + 1 <= rn {
            *acc_carry += add_assign(&mut acc[q..], &shifted[..nlen + 1]);
        } else {
            let fit = rn - q;
            *acc_carry += add_assign(&mut acc[q..], &shifted[..fit]);
            // The wrapped part changes sign in the Fermat ring.
            *other_carry += add_assign(other, &shifted[fit..nlen + 1]);
        }
    }
    // A carry out of either pile is itself a wrapped (negated) unit.
    while pos_carry > 0 || neg_carry > 0 {
        let pc = pos_carry;
        let nc = neg_carry;
        pos_carry = 0;
        neg_carry = 0;
        if pc > 0 {
            neg_carry += add_1_assign(&mut neg_acc[..], pc);
        }
        if nc > 0 {
            pos_carry += add_1_assign(&mut dst[..rn], nc);
        }
    }

    // dst = pos - neg (mod B^rn + 1), fully reduced.
    dst[rn] = 0;
    let bo = {
        let (lo, _) = dst.split_at_mut(rn);
        sub_n_assign(lo, &neg_acc)
    };
    if bo != 0 {
        let cy = add_1_assign(&mut dst[..rn], 1);
        dst[rn] = cy;
    }
}

/// `dst = a · b mod B^rn - 1`, `dst` is `rn` limbs, canonical (all-ones
/// folds to zero).
///
/// Inputs must be at most `rn` limbs. Passing the same slice twice squares
/// with a single forward transform.
pub fn mul_mersenne(dst: &mut [Limb], rn: usize, a: &[Limb], b: &[Limb]) {
    let sqr_mode = std::ptr::eq(a.as_ptr(), b.as_ptr()) && a.len() == b.len();
    if sqr_mode {
        mersenne_core(dst, rn, a, None);
    } else {
        let bt = mersenne_transform(rn, b);
        mersenne_core(dst, rn, a, Some(bt.coefs.as_slice()));
    }
}

/// Mersenne product against an already-transformed multiplier (`None`
/// squares `a`).
pub(crate) fn mersenne_core(dst: &mut [Limb], rn: usize, a: &[Limb], cb: Option<&[Limb]>) {
    debug_assert_eq!(dst.len(), rn);
    debug_assert!(a.len() <= rn);
    let p = Params::mersenne(rn);
    let ring = p.ring;
    let nlen = ring.nlen();

    let mut t1 = scratch(nlen);
    let mut t2 = scratch(2 * ring.l + 2);
    let mut ca = scratch(p.big_k * nlen);

    p.decompose(&mut ca, a, false, &mut t2);
    fft_fwd(ring, &mut ca, 0, p.k, p.w0(), &mut t1, &mut t2);
    p.pointwise(&mut ca, cb);
    fft_inv(ring, &mut ca, 0, p.k, p.w0(), &mut t1, &mut t2);

    // Divide by K and accumulate at bit offsets i·M; spill past B^rn wraps
    // around positively, as does any carry out of the accumulator.
    let mut shifted = scratch(nlen + 1);
    dst.fill(0);
    let mut wrapped: Limb = 0;
    for i in 0..p.big_k {
        let c = &mut ca[i * nlen..(i + 1) * nlen];
        ring.shl_mod(c, 2 * ring.bits() - p.k, &mut t2);
        // Cyclic coefficients are non-negative and bounded by 2^(2M+k).
        debug_assert_eq!(c[ring.l], 0);

        let q = i * p.m_bits / 64;
        let r = (i * p.m_bits % 64) as u32;
        shifted[..nlen].copy_from_slice(c);
        shifted[nlen] = 0;
        if r > 0 {
            shl_assign(&mut shifted[..nlen + 1], r);
        }
        if q + nlen + 1 <= rn {
            wrapped += add_assign(&mut dst[q..], &shifted[..nlen + 1]);
        } else {
            let fit = rn - q;
            wrapped += add_assign(&mut dst[q..], &shifted[..fit]);
            wrapped += add_assign(dst, &shifted[fit..nlen + 1]);
        }
    }
    // Fold the wrap count back in; the +1/-1 pair also canonicalizes an
    // all-ones residue to zero.
    if add_1_assign(dst, 1 + wrapped) == 0 {
        dec(dst);
    }
}

/// Borrow of `a - b - bin` without storing the difference.
fn sub_borrow_only(a: &[Limb], b: &[Limb], bin: Limb) -> Limb {
    debug_assert_eq!(a.len(), b.len());
    let mut bo = bin;
    for i in 0..a.len() {
        let (d, b1) = a[i].overflowing_sub(b[i]);
        let (_, b2) = d.overflowing_sub(bo);
        bo = (b1 | b2) as Limb;
    }
    bo
}

/// Required modular product size for a full product of shape `(na, nb)`.
pub(crate) fn fft_half_size(na: usize, nb: usize) -> usize {
    fft_next_size((na + nb + 1) >> 1)
}

/// `dst = a · b` through the two modular products and CRT.
///
/// `dst.len() == na + nb`, `na >= nb >= 1`, destination disjoint from both
/// sources. Used above the FFT threshold; any size with
/// `na + nb > fft_next_size((na + nb + 1)/2)` is legal.
pub fn mul_fft(dst: &mut [Limb], a: &[Limb], b: &[Limb]) {
    mul_fft_inner(dst, a, b, None)
}

/// Full product against cached multiplier transforms (both rings, sized
/// for this operand shape).
pub(crate) fn mul_fft_planned(
    dst: &mut [Limb],
    a: &[Limb],
    b: &[Limb],
    fermat: &BTransform,
    mersenne: &BTransform,
) {
    mul_fft_inner(dst, a, b, Some((fermat, mersenne)))
}

fn mul_fft_inner(
    dst: &mut [Limb],
    a: &[Limb],
    b: &[Limb],
    slots: Option<(&BTransform, &BTransform)>,
) {
    let na = a.len();
    let nb = b.len();
    debug_require!(na >= nb && nb > 0);
    debug_assert_eq!(dst.len(), na + nb);
    let hn = fft_half_size(na, nb);
    hard_assert!(na + nb > hn);

    log::trace!("mul_fft: na={na} nb={nb} hn={hn}");

    let mut tp = scratch(hn + 1);

    // a mod B^hn - 1
    let mut am = scratch(hn);
    let nam = if na > hn {
        if add(&mut am, &a[..hn], &a[hn..]) != 0 {
            inc(&mut am);
        }
        hn
    } else {
        am[..na].copy_from_slice(a);
        na
    };
    match slots {
        Some((_, mer)) => {
            debug_assert_eq!(mer.rn, hn);
            mersenne_core(&mut dst[..hn], hn, &am[..nam], Some(mer.coefs.as_slice()));
        }
        None => mul_mersenne(&mut dst[..hn], hn, &am[..nam], b),
    }

    // a mod B^hn + 1
    let mut ap = scratch(hn + 1);
    let nap = if na > hn {
        ap[hn] = 0;
        if sub(&mut ap[..hn], &a[..hn], &a[hn..]) != 0 {
            inc(&mut ap[..hn + 1]);
        }
        hn + 1
    } else {
        ap[..na].copy_from_slice(a);
        na
    };
    match slots {
        Some((fer, _)) => {
            debug_assert_eq!(fer.rn, hn);
            fermat_core(&mut tp, hn, &ap[..nap], Some(fer.coefs.as_slice()));
        }
        None => mul_fermat(&mut tp, hn, &ap[..nap], b),
    }

    // CRT: low half is (M + F)/2 computed mod B^hn - 1.
    let cy = half_add_nc_assign(&mut dst[..hn], &tp[..hn], tp[hn]);
    let cy = cy << 63;
    let (v, of) = dst[hn - 1].overflowing_add(cy);
    dst[hn - 1] = v;
    if of {
        inc(&mut dst[..hn]);
    }

    // High half is low - F, with the borrow folded back down.
    if na + nb == 2 * hn {
        let cy = {
            let (lo, hi) = dst.split_at_mut(hn);
            tp[hn] + sub_n(hi, lo, &tp[..hn])
        };
        // A borrow here implies the low half is nonzero, so this cannot
        // underflow past the result.
        dec_1(dst, cy);
    } else {
        let r = na + nb - hn;
        let cy = {
            let (lo, hi) = dst.split_at_mut(hn);
            sub_n(hi, &lo[..r], &tp[..r])
        };
        let cy = tp[hn] + sub_borrow_only(&dst[r..hn], &tp[r..hn], cy);
        sub_1_assign(dst, cy);
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

    // Reference: a·b mod B^rn - 1 via schoolbook and folding.
    fn naive_mersenne(a: &[u64], b: &[u64], rn: usize) -> Vec<u64> {
        let mut prod = vec![0u64; a.len() + b.len()];
        mul_basecase(&mut prod, a, b);
        let mut acc = vec![0u64; rn];
        let mut wrapped = 0u64;
        for chunk in prod.chunks(rn) {
            wrapped += crate::kernels::add_assign(&mut acc, chunk);
        }
        if crate::kernels::add_1_assign(&mut acc, 1 + wrapped) == 0 {
            crate::kernels::dec(&mut acc);
        }
        acc
    }

    // Reference: a·b mod B^rn + 1, fully reduced into rn+1 limbs.
    fn naive_fermat(a: &[u64], b: &[u64], rn: usize) -> Vec<u64> {
        let mut prod = vec![0u64; a.len() + b.len()];
        mul_basecase(&mut prod, a, b);
        // alternate add/subtract rn-limb chunks
        let mut pos = vec![0u64; rn];
        let mut neg = vec![0u64; rn];
        for (ci, chunk) in prod.chunks(rn).enumerate() {
            let (acc, other) = if ci % 2 == 0 {
                (&mut pos, &mut neg)
            } else {
                (&mut neg, &mut pos)
            };
            let cy = crate::kernels::add_assign(&mut acc[..], chunk);
            if cy != 0 {
                crate::kernels::add_1_assign(&mut other[..], cy);
            }
        }
        let mut out = vec![0u64; rn + 1];
        out[..rn].copy_from_slice(&pos);
        let bo = crate::kernels::sub_n_assign(&mut out[..rn], &neg);
        if bo != 0 {
            let cy = crate::kernels::add_1_assign(&mut out[..rn], 1);
            out[rn] = cy;
        }
        out
    }

    #[test]
    fn next_size_is_monotone_and_idempotent() {
        for &n in &[1usize, 50, 477, 500, 1000, 1596, 1597, 1700, 3000, 5000] {
            let s = fft_next_size(n);
            assert!(s >= n);
            assert_eq!(fft_next_size(s), s);
        }
    }

    #[test]
    fn mersenne_small() {
        let rn = 64;
        let a = pattern(64, 3);
        let b = pattern(64, 5);
        let mut dst = vec![0u64; rn];
        mul_mersenne(&mut dst, rn, &a, &b);
        assert_eq!(dst, naive_mersenne(&a, &b, rn));
    }

    #[test]
    fn mersenne_short_inputs() {
        let rn = 64;
        let a = pattern(40, 7);
        let b = pattern(10, 11);
        let mut dst = vec![0u64; rn];
        mul_mersenne(&mut dst, rn, &a, &b);
        assert_eq!(dst, naive_mersenne(&a, &b, rn));
    }

    #[test]
    fn fermat_small() {
        let rn = 64;
        let a = pattern(64, 13);
        let b = pattern(64, 17);
        let mut dst = vec![0u64; rn + 1];
        mul_fermat(&mut dst, rn, &a, &b);
        assert_eq!(dst, naive_fermat(&a, &b, rn));
    }

    #[test]
    fn fermat_square() {
        let rn = 64;
        let a = pattern(64, 19);
        let mut dst = vec![0u64; rn + 1];
        mul_fermat(&mut dst, rn, &a, &a);
        assert_eq!(dst, naive_fermat(&a, &a, rn));
    }

    #[test]
    fn fermat_wide_input() {
        // rn+1-limb input below 2·B^rn, as the CRT path produces.
        let rn = 64;
        let mut a = pattern(65, 23);
        a[64] = 1;
        let b = pattern(64, 29);
        let mut dst = vec![0u64; rn + 1];
        mul_fermat(&mut dst, rn, &a, &b);
        assert_eq!(dst, naive_fermat(&a, &b, rn));
    }

    #[test]
    fn full_product_small_shape() {
        // Exercises the CRT plumbing on a deliberately small FFT size.
        let a = pattern(70, 31);
        let b = pattern(60, 37);
        let mut got = vec![0u64; 130];
        mul_fft(&mut got, &a, &b);
        let mut want = vec![0u64; 130];
        mul_basecase(&mut want, &a, &b);
        assert_eq!(got, want);
    }

    #[test]
    fn full_product_odd_total() {
        let a = pattern(77, 41);
        let b = pattern(50, 43);
        let mut got = vec![0u64; 127];
        mul_fft(&mut got, &a, &b);
        let mut want = vec![0u64; 127];
        mul_basecase(&mut want, &a, &b);
        assert_eq!(got, want);
    }

    #[test]
    fn ring_shift_roundtrip() {
        let ring = Ring { l: 4 };
        let mut tmp = vec![0u64; 10];
        let mut x = vec![0u64; 5];
        x[..4].copy_from_slice(&pattern(4, 47));
        let orig = x.clone();
        // shifting by s then by 2n - s multiplies by 2^(2n) = 1
        for s in [1usize, 63, 64, 100, 255, 256, 300] {
            ring.shl_mod(&mut x, s, &mut tmp);
            ring.shl_mod(&mut x, 2 * ring.bits() - s, &mut tmp);
            assert_eq!(x, orig, "s = {s}");
        }
    }

    #[test]
    fn ring_negate_involution() {
        let ring = Ring { l: 2 };
        for v in [vec![0u64, 0, 0], vec![1, 0, 0], vec![0, 0, 1], vec![5, 7, 0]] {
            let mut x = v.clone();
            ring.negate_mod(&mut x);
            ring.negate_mod(&mut x);
            assert_eq!(x, v);
        }
    }
}
