pub mod call;
pub mod compliance;
pub mod error;
pub mod hospitals;
pub mod incidents;
pub mod proposal;
pub mod protocols;
pub mod rules;
pub mod seed;
pub mod store;
pub mod supervisor;
pub mod units;

pub use error::{DispatchError, Result};
pub use store::CadState;
