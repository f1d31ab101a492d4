//! Sample-source adapters for LapTrace

pub mod demo;
pub mod replay;

pub use demo::DemoCircuit;
pub use replay::ReplaySource;
