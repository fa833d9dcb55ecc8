pub mod paper;
pub mod traits;

pub use paper::PaperBuyHandler;
pub use traits::{BuyError, BuyHandler, BuyIntent, BuyReceipt};
