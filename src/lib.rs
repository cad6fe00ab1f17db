pub mod capture;
pub mod config;
pub mod controls;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod segmentation;

pub use error::{Result, SegError};
