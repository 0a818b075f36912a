//! Domain types shared across resolution, staking analytics and the response DTOs.

pub mod api;
pub mod conversions;
pub mod identity;
pub mod staking;

pub use api::{ApiResponse, IdentityResponse, StakingAnalytics};
pub use identity::{AddressIdentity, IdentitySource, NameMatch};
pub use staking::{HoldingInterval, PriceQuote, TransactionEvent};
