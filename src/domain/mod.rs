pub mod features;
pub mod reading;

pub use features::*;
pub use reading::*;
