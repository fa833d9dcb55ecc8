pub mod chain;
pub mod session;
pub mod storage;
