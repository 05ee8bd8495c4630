//! # Ballot Core
//!
//! 투표 서비스의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 서비스 전반에서 사용되는 기본 타입을 제공합니다:
//! - 유권자/관리자 계정과 주민 식별번호(national ID)
//! - 후보자 명부 및 득표 집계
//! - 에러 분류 체계
//! - 저장소 계약(trait)과 인메모리 구현
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod memory;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use memory::MemoryStore;
