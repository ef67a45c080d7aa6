pub mod executor;
pub mod parser;

pub use executor::GraphqlTransport;
