pub mod cgroups;
pub mod codec;
pub mod container;
pub mod engine;
pub mod error;
pub mod gate;
pub mod host;
pub mod state;
pub mod types;

pub use container::Container;
pub use error::{LibcorralError, Result};
pub use state::State;
