// File I/O operations

pub mod csv;
pub mod error;
pub mod export;
pub mod fingerprint;
pub mod load;

pub use error::IoError;
pub use load::{load_input, resolve_path};
