pub mod hash;
pub mod init_data;

pub use init_data::{validate, InitDataError, InitDataValidator};
