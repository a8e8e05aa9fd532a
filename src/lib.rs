//! mpkern - arbitrary-precision unsigned integer arithmetic kernels
//!
//! Representation-first: an integer is a little-endian slice of 64-bit
//! limbs with an explicit length and a normalization contract (top limb
//! nonzero unless stated otherwise). Every operation takes destination and
//! source slices and never allocates the destination; transient working
//! memory comes from a per-thread scoped pool (see [`arena`]).
//!
//! ## Multiplication
//!
//! [`mul`] cascades schoolbook -> Toom-22/32/33/42 -> Schönhage-Strassen
//! by operand shape; [`sqr`] mirrors it with dedicated squaring variants.
//! Repeated products against one fixed multiplier can reuse its forward
//! transforms through [`MulPlan`].
//!
//! ## Division and reciprocals
//!
//! [`div_rem`] handles any canonical divisor by normalizing it; the
//! in-place entry points in [`div`](crate::div) require the divisor's top
//! bit set and choose between schoolbook, recursive divide-and-conquer,
//! and division by multiplicative inverse. [`invappr`] produces the
//! Newton-iterated approximate reciprocal those paths build on.
//!
//! Everything is single-threaded and synchronous; re-entrancy comes from
//! the caller-owned buffers and the thread-local scratch pool, not from
//! locks. Unrecoverable failures abort through a process-global hook (see
//! [`error`]).

pub mod arena;
pub mod div;
pub mod error;
pub mod inv;
pub mod kernels;
pub mod limb;
pub mod mul;

pub use div::{div_rem, Normalized};
pub use error::{set_abort_hook, AbortHook, AbortInfo, AbortKind};
pub use inv::invappr;
pub use limb::Limb;
pub use mul::{mul, mul_n, sqr, MulPlan};
