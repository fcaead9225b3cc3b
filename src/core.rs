//! Core Components of the SCL Graph Library
//!
//! This module provides the storage, list and tagging primitives and the
//! directed graph built on top of them.

pub mod graph;
pub mod marker;
pub mod multi_list;
pub mod numeration;
pub mod storage;
pub mod utils;
