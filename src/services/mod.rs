pub mod items;
pub mod quotes;

pub use items::ItemService;
pub use quotes::QuoteService;
