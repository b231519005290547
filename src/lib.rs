pub mod aggregate;
pub mod analytics;
pub mod models;
pub mod normalize;
pub mod report;
pub mod risk;
pub mod store;
pub mod trend;
