//! Row structs for the regulation tables.

pub mod regulation;
