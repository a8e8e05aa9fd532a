//! End-to-end scenarios exercising several layers at once

use mpkern::kernels::{mul_1, normalized_len, shl, shr};
use mpkern::mul::{mul, sqr, MulPlan};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// 10^100 by repeated squaring equals 10^100 by repeated mul_1.
#[test]
fn pow_ten_to_one_hundred() {
    // iterative: multiply 1 by 10, one hundred times
    let mut slow = vec![1u64];
    for _ in 0..100 {
        let src = slow.clone();
        let cy = mul_1(&mut slow, &src, 10);
        if cy != 0 {
            slow.push(cy);
        }
    }

    // square-and-multiply over the bits of 100 (0b1100100)
    let mut acc = vec![1u64];
    let base = vec![10u64];
    for bit in (0..7).rev() {
        let mut s = vec![0u64; 2 * acc.len()];
        sqr(&mut s, &acc);
        s.truncate(normalized_len(&s).max(1));
        acc = s;
        if (100 >> bit) & 1 == 1 {
            let mut p = vec![0u64; acc.len() + 1];
            mul(&mut p, &acc, &base);
            p.truncate(normalized_len(&p).max(1));
            acc = p;
        }
    }

    assert_eq!(acc, slow);
    // 10^100 needs 333 bits, i.e. 6 limbs
    assert_eq!(slow.len(), 6);
}

/// shl_k(shr_k(a, k), k) == a with the low k bits cleared, 0 < k < 64.
#[test]
fn shift_roundtrip_masks_low_bits() {
    let mut rng = StdRng::seed_from_u64(0x5f);
    let a: Vec<u64> = (0..12).map(|_| rng.random()).collect();
    for k in 1..64u32 {
        let mut down = vec![0u64; 12];
        shr(&mut down, &a, k);
        let mut back = vec![0u64; 12];
        let cy = shl(&mut back, &down, k);
        assert_eq!(cy, 0, "k={k}");
        assert_eq!(back[0], a[0] & !((1u64 << k) - 1), "k={k}");
        assert_eq!(&back[1..], &a[1..], "k={k}");
    }
}

/// Repeated products against a fixed multiplier through a plan agree with
/// the plain dispatcher (pow-by-squaring-shaped workload).
#[test]
fn plan_reuse_matches_direct() {
    let mut rng = StdRng::seed_from_u64(0x9a);
    let mut b: Vec<u64> = (0..40).map(|_| rng.random()).collect();
    *b.last_mut().unwrap() |= 1;
    let mut plan = MulPlan::new(&b);
    for _ in 0..3 {
        for na in [80usize, 90, 100] {
            let a: Vec<u64> = (0..na).map(|_| rng.random()).collect();
            let mut via_plan = vec![0u64; na + 40];
            plan.mul(&mut via_plan, &a);
            let mut direct = vec![0u64; na + 40];
            mul(&mut direct, &a, &b);
            assert_eq!(via_plan, direct, "na={na}");
        }
    }
}
