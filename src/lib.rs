pub mod arguments;
pub mod config;
pub mod error;
pub mod pom;
pub mod propagator;
pub mod report;
pub mod rewriter;
