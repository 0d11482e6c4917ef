//! CV upload wizard: file checks, the step machine, and its async driver.

pub mod controller;
pub mod file;
pub mod machine;
