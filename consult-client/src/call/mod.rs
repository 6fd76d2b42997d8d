mod handle;
mod session;
mod state;

pub use handle::*;
pub use session::*;
pub use state::*;
