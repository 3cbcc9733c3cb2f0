pub mod traits;
pub mod types;

pub mod amqp_frame;
pub mod emitter;
pub mod pool;

#[cfg(test)]
mod amqp_frame_tests;
#[cfg(test)]
mod emitter_tests;

pub use amqp_frame::*;
pub use emitter::*;
pub use pool::*;
pub use traits::*;
pub use types::*;
