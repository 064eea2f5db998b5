pub mod copy;
pub mod stats;
