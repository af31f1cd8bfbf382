mod registry;
mod state;

pub use registry::SlotRegistry;
pub use state::{Slot, SlotState};
