//! Status synchronization core.
//!
//! Everything here is synchronous and free of I/O: the reducer turns a snapshot into a
//! view, the edge detector remembers whether the job was active, and the sequencer decides
//! which poll outcome is current. The controller wires them to the network.

mod edge;
mod reduce;
mod sequence;

pub(crate) use edge::EdgeDetector;
pub use reduce::{reduce, ControlView};
pub(crate) use sequence::PollSequencer;
