//! Variant evolution: copy errors and recombination.
//!
//! Both operators are pure functions of their inputs plus a random source.
//! They never alter the parent variants.

pub mod mutation;
pub mod recombination;

pub use mutation::{mutate_by_copy_error, successor_name};
pub use recombination::mutate_by_recombination;
