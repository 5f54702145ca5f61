//! Cassette format for recording and replaying backend exchanges.

pub mod format;
pub mod recorder;
pub mod replayer;
