pub mod master;
pub mod mean;

pub use master::{build_dark_master, build_flat_master};
