pub mod analysis;
pub mod annotate;
pub mod error;
pub mod features;
pub mod io;
pub mod preprocess;
pub mod retrieval;
pub mod split;
