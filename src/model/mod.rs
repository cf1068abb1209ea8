pub mod state;

pub use state::{InventoryState, PeriodRecord};
