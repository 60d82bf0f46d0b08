mod api_response;
pub use api_response::*;

mod relay;
pub use relay::*;

mod relay_policy;
pub use relay_policy::*;

mod token_fee;
pub use token_fee::*;

mod transaction;
pub use transaction::*;

mod transfer;
pub use transfer::*;
