//! Core, platform independent networking code.

pub mod link;
pub mod link_cache;
pub mod net;
pub mod repr;
pub mod route;
pub mod stack;
pub mod storage;
pub(crate) mod sync;
