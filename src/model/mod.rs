pub use genesis_core::BrainLogic;
pub mod advisory {
    pub use genesis_core::advisory::*;
}
pub mod board {
    pub use genesis_core::board::*;
}
pub mod brain {
    pub use genesis_core::brain::*;
}
pub mod capability {
    pub use genesis_core::capability::*;
}
pub mod config {
    pub use genesis_core::config::*;
}
pub mod data_source {
    pub use genesis_core::data_source::*;
}
pub mod environment {
    pub use genesis_core::environment::*;
}
pub mod history {
    pub use genesis_core::history::*;
}
pub mod interaction {
    pub use genesis_core::interaction::*;
}
pub mod lifecycle {
    pub use genesis_core::lifecycle::*;
}
pub mod rng {
    pub use genesis_core::rng::*;
}
pub mod self_modify {
    pub use genesis_core::self_modify::*;
}
pub mod snapshot {
    pub use genesis_core::snapshot::*;
}
pub mod systems {
    pub use genesis_core::systems::*;
}

pub mod state {
    pub use genesis_data::*;
}
pub mod world;
