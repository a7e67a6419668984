use crate::core::storage::{
    Entry,
    Linked,
    List,
};

/// A packet buffer which can be queued on a PacketList.
#[derive(Clone, Debug, Default)]
pub struct Packet {
    view: Vec<u8>,
    entry: Entry,
}

/// Queue of packet buffers, e.g. frames waiting on reassembly or a retransmit.
pub type PacketList = List<Packet>;

impl From<Vec<u8>> for Packet {
    fn from(view: Vec<u8>) -> Packet {
        Packet {
            view,
            entry: Entry::default(),
        }
    }
}

impl Packet {
    pub fn view(&self) -> &[u8] {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut Vec<u8> {
        &mut self.view
    }

    /// Consumes the packet and returns the underlying buffer.
    pub fn into_view(self) -> Vec<u8> {
        self.view
    }
}

impl Linked for Packet {
    fn entry(&self) -> &Entry {
        &self.entry
    }

    fn entry_mut(&mut self) -> &mut Entry {
        &mut self.entry
    }
}
