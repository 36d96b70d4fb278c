pub mod counter;
pub mod employee;
