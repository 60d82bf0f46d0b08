mod hashing;
pub use hashing::*;

mod time;
pub use time::*;

mod redis;
pub use redis::*;
