//! 예측 업데이트를 위한 도메인 모델.

mod forecast;
mod provider;
mod record;

pub use forecast::*;
pub use provider::*;
pub use record::*;
