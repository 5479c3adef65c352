mod repository;

pub use repository::InMemoryPriceSource;
