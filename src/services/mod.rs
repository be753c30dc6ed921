pub mod news;
pub mod refresh;
pub mod scheduler;
