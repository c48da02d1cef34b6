pub mod candidate;
pub mod cluster;
pub mod file;

pub use candidate::*;
pub use cluster::*;
pub use file::*;
