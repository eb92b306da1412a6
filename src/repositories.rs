pub mod blocks;
pub mod mining;
pub mod rewards;
pub mod settings;
pub mod users;
