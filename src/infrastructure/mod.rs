//! Store implementations and the event publisher
pub mod events;
pub mod memory;
pub mod postgres;

pub use events::EventPublisher;
pub use memory::InMemoryStore;
pub use postgres::PgStore;
