pub mod options;

pub use options::QtDeployCli;
