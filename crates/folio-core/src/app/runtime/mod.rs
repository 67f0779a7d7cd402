pub mod debounce;
pub mod lineage;

pub use debounce::DebounceGate;
pub use lineage::Lineage;
