//! Scoped temporary memory for kernel scratch space
//!
//! Every multi-limb algorithm above the primitive kernels needs transient
//! working storage whose lifetime is exactly one call. Two paths serve
//! those requests:
//!
//! - **Stack path**: small blocks come from a per-thread pool of recycled
//!   buffers. Dropping the [`ScratchBuf`] guard returns the block, so scope
//!   exit rewinds the pool the way a stack top would. The pool's footprint
//!   is capped; blocks that would push it past the cap are simply freed.
//! - **Heap path**: blocks above [`STACK_BLOCK_LIMIT`] limbs bypass the pool
//!   entirely, so long-running computations do not pin large regions.
//!
//! Allocation failure raises the memory-alloc abort kind with the requested
//! size; there is no fallible allocation surface. Buffers are handed out
//! zeroed.
//!
//! The pool is thread-local, which is what makes the kernels re-entrant
//! per thread without any locking.

use crate::error::{raise, AbortKind};
use crate::limb::Limb;
use std::cell::RefCell;
use std::ops::{Deref, DerefMut};

/// Largest request served by the recycled stack path, in limbs.
///
/// Matches the classic alloca comfort zone (just under 32 KiB).
pub const STACK_BLOCK_LIMIT: usize = 0x7f00 / 8;

/// Default cap on the per-thread pool footprint, in limbs (8 MiB).
const DEFAULT_POOL_CAP: usize = 1 << 20;

#[cfg(feature = "alloc-count")]
static LIVE_ALLOCS: std::sync::atomic::AtomicIsize = std::sync::atomic::AtomicIsize::new(0);

/// Live allocation balance (takes minus returns-to-heap). Only meaningful
/// for leak hunting; compiled in with the `alloc-count` feature.
#[cfg(feature = "alloc-count")]
pub fn alloc_count() -> isize {
    LIVE_ALLOCS.load(std::sync::atomic::Ordering::Relaxed)
}

struct Pool {
    free: Vec<Vec<Limb>>,
    pooled: usize,
    cap: usize,
}

impl Pool {
    const fn new() -> Self {
        Pool {
            free: Vec::new(),
            pooled: 0,
            cap: DEFAULT_POOL_CAP,
        }
    }
}

thread_local! {
    static POOL: RefCell<Pool> = const { RefCell::new(Pool::new()) };
}

/// Set this thread's pool footprint cap in limbs. Returns the previous cap.
///
/// A cap of zero disables recycling entirely (every request becomes a heap
/// allocation released on drop).
pub fn set_pool_cap(limbs: usize) -> usize {
    POOL.with(|p| {
        let mut pool = p.borrow_mut();
        let old = pool.cap;
        pool.cap = limbs;
        while pool.pooled > pool.cap {
            let buf = pool.free.pop().expect("pooled count tracks free list");
            pool.pooled -= buf.capacity();
        }
        log::debug!("scratch pool cap: {} -> {} limbs", old, limbs);
        old
    })
}

fn alloc_limbs(n: usize) -> Vec<Limb> {
    let mut v: Vec<Limb> = Vec::new();
    if v.try_reserve_exact(n).is_err() {
        raise(
            AbortKind::MemoryAllocFailure,
            format!("scratch allocation failed ({} limbs, {} bytes)", n, n * 8),
            file!(),
            line!(),
        );
    }
    v.resize(n, 0);
    v
}

/// Scratch block guard. Derefs to `[u64]`; releases its storage on drop.
pub struct ScratchBuf {
    buf: Vec<Limb>,
    recyclable: bool,
}

impl Deref for ScratchBuf {
    type Target = [Limb];
    fn deref(&self) -> &[Limb] {
        &self.buf
    }
}

impl DerefMut for ScratchBuf {
    fn deref_mut(&mut self) -> &mut [Limb] {
        &mut self.buf
    }
}

impl Drop for ScratchBuf {
    fn drop(&mut self) {
        #[cfg(feature = "alloc-count")]
        LIVE_ALLOCS.fetch_sub(1, std::sync::atomic::Ordering::Relaxed);
        if !self.recyclable {
            return;
        }
        let buf = std::mem::take(&mut self.buf);
        POOL.with(|p| {
            let mut pool = p.borrow_mut();
            if pool.pooled + buf.capacity() <= pool.cap {
                pool.pooled += buf.capacity();
                pool.free.push(buf);
            }
        });
    }
}

/// Acquire `n` limbs of zeroed scratch.
pub fn scratch(n: usize) -> ScratchBuf {
    #[cfg(feature = "alloc-count")]
    LIVE_ALLOCS.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    if n > STACK_BLOCK_LIMIT {
        return ScratchBuf {
            buf: alloc_limbs(n),
            recyclable: false,
        };
    }
    let reused = POOL.with(|p| {
        let mut pool = p.borrow_mut();
        // Last-in-first-out keeps the hot block hot.
        let pos = pool.free.iter().rposition(|b| b.capacity() >= n)?;
        let buf = pool.free.swap_remove(pos);
        pool.pooled -= buf.capacity();
        Some(buf)
    });
    let mut buf = match reused {
        Some(b) => b,
        None => alloc_limbs(n),
    };
    buf.clear();
    buf.resize(n, 0);
    ScratchBuf {
        buf,
        recyclable: true,
    }
}
