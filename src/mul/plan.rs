//! Multiplier reuse plan
//!
//! Repeated multiplications by one fixed multiplier (base conversion,
//! exponentiation ladders, division by a fixed divisor) redo work that
//! only depends on the multiplier: its forward FFT transforms, or its
//! Toom-42 evaluation. [`MulPlan`] owns that state with an explicit
//! lifetime, keyed by the operand shape it was built for and refreshed
//! when the shape changes. Being caller-owned, it is as thread-safe as
//! any other value the caller moves around; nothing is process-global.

use crate::limb::Limb;
use crate::mul::fft::{
    fermat_transform, fft_half_size, mersenne_transform, mul_fft_planned, BTransform,
};
use crate::mul::toom42::{mul_toom42_planned, toom42_eval_b, toom42_n, Toom42Eval};
use crate::mul::{mul, MUL_FFT_THRESHOLD};

/// Cached per-multiplier state for repeated `a · b` with fixed `b`.
pub struct MulPlan {
    b: Vec<Limb>,
    fermat: Option<BTransform>,
    mersenne: Option<BTransform>,
    toom42: Option<Toom42Eval>,
}

impl MulPlan {
    /// Capture the multiplier. `b` must be canonical and nonempty.
    pub fn new(b: &[Limb]) -> Self {
        assert!(!b.is_empty() && b[b.len() - 1] != 0, "multiplier must be canonical");
        MulPlan {
            b: b.to_vec(),
            fermat: None,
            mersenne: None,
            toom42: None,
        }
    }

    /// The captured multiplier.
    pub fn multiplier(&self) -> &[Limb] {
        &self.b
    }

    /// Drop every cached transform, keeping the multiplier.
    pub fn clear(&mut self) {
        self.fermat = None;
        self.mersenne = None;
        self.toom42 = None;
    }

    /// `dst = a · b`. Requires `a.len() >= b.len()` and
    /// `dst.len() == a.len() + b.len()`; destination disjoint from `a`.
    ///
    /// Reuses cached state when the dispatch regime allows it, otherwise
    /// falls through to the plain dispatcher.
    pub fn mul(&mut self, dst: &mut [Limb], a: &[Limb]) {
        let na = a.len();
        let nb = self.b.len();
        assert!(na >= nb);
        debug_assert_eq!(dst.len(), na + nb);

        let fft_regime =
            (na + nb) >> 1 >= MUL_FFT_THRESHOLD && 2 * nb >= MUL_FFT_THRESHOLD && na < 8 * nb;
        if fft_regime {
            let hn = fft_half_size(na, nb);
            let stale = self.fermat.as_ref().map(|t| t.rn) != Some(hn);
            if stale {
                log::debug!("mul plan: transforming multiplier for hn={hn}");
                self.fermat = Some(fermat_transform(hn, &self.b));
                self.mersenne = Some(mersenne_transform(hn, &self.b));
            }
            let fer = self.fermat.as_ref().expect("freshly populated");
            let mer = self.mersenne.as_ref().expect("freshly populated");
            mul_fft_planned(dst, a, &self.b, fer, mer);
            return;
        }

        let toom42_regime = nb >= 20
            && na < 3 * nb
            && (na + nb) >> 1 < MUL_FFT_THRESHOLD
            && 4 * na >= 5 * nb
            && 5 * na >= 9 * nb;
        if toom42_regime {
            let n = toom42_n(na, nb);
            let stale = self.toom42.as_ref().map(|e| e.n) != Some(n);
            if stale {
                self.toom42 = Some(Toom42Eval::evaluate(&self.b, n));
            }
            let eval = self.toom42.as_ref().expect("freshly populated");
            mul_toom42_planned(dst, a, &self.b, eval);
            return;
        }

        mul(dst, a, &self.b);
    }
}

impl Toom42Eval {
    /// Evaluate the two-way side of `b` split at `n` limbs.
    pub(crate) fn evaluate(b: &[Limb], n: usize) -> Toom42Eval {
        let t = b.len() - n;
        debug_assert!(t >= 1 && t <= n);
        let mut bp1 = vec![0 as Limb; n + 1];
        let mut bm1 = vec![0 as Limb; n];
        let neg = toom42_eval_b(&mut bp1, &mut bm1, &b[..n], &b[n..]);
        Toom42Eval { n, bp1, bm1, neg }
    }
}
