//! Element-loop helpers shared by the serial and the rayon build.
//!
//! The macros expand to `par_*` iterators with the `parallel` feature and to
//! the matching std iterators otherwise. Both expose `zip`, `enumerate`,
//! `for_each` and `try_for_each` with the same signatures, so loop bodies are
//! written once. Call sites need `rayon::prelude::*` in scope when the
//! feature is on.

#[cfg(feature = "parallel")]
macro_rules! elements_mut {
    ($slice:expr) => {
        ($slice).par_iter_mut()
    };
}

#[cfg(not(feature = "parallel"))]
macro_rules! elements_mut {
    ($slice:expr) => {
        ($slice).iter_mut()
    };
}

#[cfg(feature = "parallel")]
macro_rules! elements_ref {
    ($slice:expr) => {
        ($slice).par_iter()
    };
}

#[cfg(not(feature = "parallel"))]
macro_rules! elements_ref {
    ($slice:expr) => {
        ($slice).iter()
    };
}

#[cfg(feature = "parallel")]
macro_rules! element_chunks_mut {
    ($slice:expr, $len:expr) => {
        ($slice).par_chunks_mut($len)
    };
}

#[cfg(not(feature = "parallel"))]
macro_rules! element_chunks_mut {
    ($slice:expr, $len:expr) => {
        ($slice).chunks_mut($len)
    };
}

#[cfg(feature = "parallel")]
macro_rules! element_chunks {
    ($slice:expr, $len:expr) => {
        ($slice).par_chunks($len)
    };
}

#[cfg(not(feature = "parallel"))]
macro_rules! element_chunks {
    ($slice:expr, $len:expr) => {
        ($slice).chunks($len)
    };
}

pub(crate) use element_chunks;
pub(crate) use element_chunks_mut;
pub(crate) use elements_mut;
pub(crate) use elements_ref;
