pub mod bench_runner;
pub mod disk;
pub mod engine;

pub use bench_runner::{ctrl_c, BenchmarkRunner};
pub use disk::{check_capacity, DiskUsage};
pub use engine::{BandwidthScale, Engine, FioEngine};
