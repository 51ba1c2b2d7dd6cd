pub mod cards;
pub mod health;
pub mod likes;
pub mod stats;
pub mod users;
pub mod validation;

pub use cards::{create_card, get_card};
pub use health::health_check;
pub use likes::create_like;
pub use stats::{dashboard_stats, get_rankings};
pub use users::register_user;
