pub mod assignments;
pub mod classes;
pub mod core;
pub mod profiles;
pub mod sessions;
pub mod stats;
