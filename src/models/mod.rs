pub mod episode;
pub mod roster;
pub mod transcribe;

pub use episode::*;
pub use roster::*;
pub use transcribe::*;
