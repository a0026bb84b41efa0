//! Side outputs written next to each document.

pub mod csv;
