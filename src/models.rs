pub mod blocks;
pub mod mining;
pub mod rewards;
pub mod users;
