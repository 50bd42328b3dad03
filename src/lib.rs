// Customer Base - Core Library
// Purchase-history ingestion: parse, normalize, validate, persist

pub mod db;
pub mod entity;
pub mod error;
pub mod ids;
pub mod normalize;
pub mod parser;
pub mod service;

// Re-export commonly used types
pub use db::{
    setup_database, CustomerRepository, MemoryRepository, SqliteRepository, INSERT_CHUNK_SIZE,
    PAGE_SIZE,
};
pub use entity::{Customer, Identity};
pub use error::{CustomerError, FieldViolation};
pub use ids::{is_valid_cnpj, is_valid_cpf};
pub use normalize::{sanitize, NULL_SENTINEL};
pub use parser::{
    coerce_date, coerce_decimal, coerce_nullable, min_line_width, parse_batch, parse_batch_all,
    parse_single, BatchParser, CustomerFields, NewCustomer,
};
pub use service::CustomerService;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
