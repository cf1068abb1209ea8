pub mod demand;
pub mod reporting;
pub mod store;

pub use demand::{generate_seasonal_demand, DemandParams, DemandRecord, DemandSeries};
pub use store::ResultStore;
