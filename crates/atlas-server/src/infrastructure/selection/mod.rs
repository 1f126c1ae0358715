pub mod memory;
pub mod nats;

pub use memory::MemorySelectionCache;
pub use nats::NatsSelectionCache;
