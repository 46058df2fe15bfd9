pub mod health;
pub mod master;
pub mod proxy;
pub mod streams;
