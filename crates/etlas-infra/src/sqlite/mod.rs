pub mod pool;
pub mod procedures;
pub mod store;
