// Demo module: two simulated runners paired and raced in-process.
pub mod runner;
pub mod standalone;
