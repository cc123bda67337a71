pub mod delivery;
pub mod dispatcher;
pub mod normalizer;
pub mod pacing;
pub mod payload;
pub mod store;
