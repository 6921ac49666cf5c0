pub mod polyfit;

pub use polyfit::{detrend, polyfit, Polynomial};
