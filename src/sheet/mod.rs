// Sheet loading - the song source for playback

pub mod metadata;
pub mod storage;

pub use metadata::*;
pub use storage::*;
