//! Search-as-you-type support.
//!
//! Matching and the suggestion cursor live in `doux_core::search`; this
//! module only holds the server-side debouncer that decides which typed
//! query actually gets answered.

mod debounce;

pub use debounce::{Debouncer, Settled};
