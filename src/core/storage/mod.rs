//! Buffers and queues for packets.

pub mod list;
pub mod packet;
pub mod pool;
pub mod prependable;

pub use self::list::{
    Entry,
    Iter as ListIter,
    Linked,
    List,
};
pub use self::packet::{
    Packet,
    PacketList,
};
pub use self::pool::{
    Handle,
    Pool,
};
pub use self::prependable::Prependable;
