pub mod client;
pub mod error;
pub mod model;

pub use client::TickerClient;
pub use error::RemoteDataError;
pub use model::RawTick;
