pub use consult_core::model::{PeerId, RoomKey};

pub mod model {
    pub use consult_core::CoreError;
    pub use consult_core::model::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use consult_relay::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use consult_client::*;
}
