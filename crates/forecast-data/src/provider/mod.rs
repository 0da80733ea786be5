//! 외부 데이터 및 예측 제공자.

pub mod investing;
pub mod openai;
