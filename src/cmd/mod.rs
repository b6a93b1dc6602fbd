pub mod browse;
pub mod links;
pub mod load;
pub mod mirrors;
pub mod output;
