pub mod handle;
pub mod port;
pub mod stream;

pub use handle::SessionHandle;
pub use port::SessionClient;
pub use stream::{BoxMediaStream, MediaStream, StreamGuard};
