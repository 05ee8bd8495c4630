//! 인증 및 권한 부여.
//!
//! # 구성 요소
//!
//! - [`SessionIssuer`]: JWT 세션 토큰 발급/검증
//! - [`JwtAuth`], [`AdminAuth`], [`VoterAuth`]: Axum 접근 제어 추출기
//! - 비밀번호 해싱 (Argon2id)

mod jwt;
mod middleware;
mod password;

pub use jwt::{Claims, IssuedToken, JwtError, SessionIssuer};
pub use middleware::{
    require_permission, require_role, AdminAuth, AuthContext, JwtAuth, JwtAuthError, VoterAuth,
};
pub use password::{
    hash_password, hash_password_blocking, verify_password, verify_password_blocking,
    PasswordError,
};
