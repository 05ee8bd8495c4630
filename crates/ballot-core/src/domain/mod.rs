//! 투표 서비스 도메인 모델.

pub mod account;
pub mod candidate;
pub mod role;
pub mod store;

pub use account::*;
pub use candidate::*;
pub use role::*;
pub use store::*;
