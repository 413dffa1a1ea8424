//! Row-parallel iteration for batch operations.
//!
//! Spectra in a batch share nothing but the frequency axis, so every batch
//! operation maps rows independently. With the `parallel` feature the maps run
//! on rayon's pool; without it (or on targets where threads are unavailable)
//! the very same call sites iterate sequentially. Indexed rayon iterators
//! collect in input order, so output order never depends on scheduling.
//!
//! ```ignore
//! use crate::iter_maybe_parallel;
//!
//! let estimates: Vec<_> = iter_maybe_parallel!(0..batch.len())
//!     .map(|i| estimate(&batch.spectrum(i)))
//!     .collect();
//! ```

/// Iterate a range or owned collection, in parallel when the `parallel`
/// feature is enabled.
#[macro_export]
macro_rules! iter_maybe_parallel {
    ($expr:expr) => {{
        #[cfg(feature = "parallel")]
        {
            use rayon::iter::IntoParallelIterator;

            IntoParallelIterator::into_par_iter($expr)
        }
        #[cfg(not(feature = "parallel"))]
        {
            IntoIterator::into_iter($expr)
        }
    }};
}

pub use iter_maybe_parallel;
