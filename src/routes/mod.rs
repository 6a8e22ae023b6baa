pub mod cache;
pub mod devices;
pub mod health;
pub mod playlist;
pub mod television;
