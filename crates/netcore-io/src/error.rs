use thiserror::Error;

#[derive(Error, Debug)]
pub enum FdRegistryError {
    #[error("fd table full ({0} slots)")]
    TableFull(usize),
    #[error("fd {0} out of range for a table of {1} slots")]
    OutOfRange(i32, usize),
}
