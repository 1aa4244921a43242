pub mod init;
pub mod merge;
pub mod validate;
