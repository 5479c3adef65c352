mod repository;

pub use repository::InMemoryTransactionStore;
