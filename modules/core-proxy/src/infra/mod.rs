pub mod forwarder;
pub mod session;
pub mod storage;
