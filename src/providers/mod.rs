//! Provider presets: plain configuration values, no provider-specific logic.

mod planning_center;

pub use planning_center::planning_center;
