//! Integration-style tests that exercise the public API end to end, rather
//! than a single module in isolation. Per-module unit tests already cover
//! each piece's own internals.

mod boundaries;
mod concurrency;
mod round_trip;
