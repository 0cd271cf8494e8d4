//! Backend admission control: bounded concurrency, cooldown gate, retry

pub mod admission;
pub mod retry;
