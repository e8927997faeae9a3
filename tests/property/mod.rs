//! Property-based tests

mod frame_proptest;
mod hub_proptest;
