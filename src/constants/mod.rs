mod logging;
pub use logging::*;

mod relay;
pub use relay::*;

mod solana;
pub use solana::*;

mod server;
pub use server::*;
