pub mod printer;
pub mod workload;
