pub mod adaptation;
pub mod biological;
pub mod care;
pub mod foraging;
pub mod guidance;
pub mod interaction;
pub mod perception;
pub mod social;

/// Per-organism RNG stream ids. Each pass draws from its own stream so that
/// adding draws to one pass never shifts another.
pub mod stream {
    pub const DECIDE: u64 = 1;
    pub const REPRODUCE: u64 = 4;
    pub const ADAPT: u64 = 5;
    pub const ADVICE: u64 = 6;
    pub const SELF_MODIFY: u64 = 7;
    pub const SOCIAL: u64 = 8;
}
