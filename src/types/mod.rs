// Shared domain types — used by the api, store, and state layers alike.
// None of those layers depend on each other for types; all import from here.

pub mod notification;
pub mod preferences;
pub mod stats;

pub use notification::*;
pub use preferences::*;
pub use stats::*;
