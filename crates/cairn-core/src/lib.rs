mod model;
mod wire;

pub use model::*;
pub use wire::*;
