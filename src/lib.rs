//! # SCL Graph Infrastructure
//!
//! Intrusive directed graphs backed by slab pools, with recyclable markers and
//! numerations, for the intermediate representations of a small compiler.

#![deny(missing_docs)]
#![no_std]
#![forbid(unsafe_code)]

#[allow(unused_imports)]
#[macro_use]
extern crate alloc;
#[cfg(any(feature = "std", test))]
#[macro_use]
extern crate std;

#[cfg(feature = "std")]
use std::collections::HashSet;

#[cfg(not(feature = "std"))]
use hashbrown::HashSet;

pub mod core;
