pub mod classical;
pub mod parsing;
pub mod symbols;
