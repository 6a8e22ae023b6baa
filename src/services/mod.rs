pub mod cache;
pub mod magio;
