pub mod balance;
pub mod card;
pub mod like;

pub use balance::BalanceRecord;
pub use card::{Card, CardRecord};
pub use like::{Like, LikeRecord};
