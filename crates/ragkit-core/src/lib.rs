#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod chunking;
pub mod config;
pub mod error;
pub mod plan;
pub mod storage;
pub mod traits;
pub mod types;

pub use error::{Error, ErrorKind, Result};
pub use plan::{delay, perform, Plan};
