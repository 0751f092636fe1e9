pub mod item;
pub mod quote;
pub mod quote_line;

pub use quote::QuoteStatus;
