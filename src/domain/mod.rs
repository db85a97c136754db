pub mod available_count;
pub mod checkin;
pub mod cursor;
pub mod listing;
