// Contracts Module - Public ABIs Only (read-only views)

pub mod rns;
pub mod staked_rif;

// Public exports
pub use rns::{RnsNameResolver, RnsRegistry};
pub use staked_rif::StakedRif;
