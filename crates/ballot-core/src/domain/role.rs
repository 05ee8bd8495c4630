//! 역할 기반 접근 제어 (RBAC).
//!
//! 계정 역할 및 권한 정의.

use serde::{Deserialize, Serialize};

/// 계정 역할.
///
/// 시스템 전체에 관리자 계정은 최대 하나만 존재할 수 있습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// 유권자 - 본인 계정 조회 및 1회 투표
    #[default]
    Voter,
    /// 관리자 - 후보자 명부 관리 및 집계 조회 (투표 불가)
    Admin,
}

impl Role {
    /// 역할이 특정 권한을 가지는지 확인.
    pub fn has_permission(&self, permission: Permission) -> bool {
        match self {
            Role::Admin => matches!(
                permission,
                Permission::ViewAccount
                    | Permission::ChangePassword
                    | Permission::ManageCandidates
                    | Permission::ViewRosterDetails
            ),
            Role::Voter => matches!(
                permission,
                Permission::ViewAccount | Permission::ChangePassword | Permission::CastVote
            ),
        }
    }

    /// 저장소 표현 문자열.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Voter => "voter",
            Role::Admin => "admin",
        }
    }

    /// 문자열에서 역할 파싱.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "voter" => Some(Role::Voter),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 시스템 권한.
///
/// 각 작업에 필요한 권한을 정의합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    /// 본인 계정 조회
    ViewAccount,
    /// 본인 비밀번호 변경
    ChangePassword,
    /// 투표
    CastVote,
    /// 후보자 생성/수정/삭제
    ManageCandidates,
    /// 득표수를 포함한 명부 상세 조회
    ViewRosterDetails,
}

impl Permission {
    /// 권한에 대한 설명 반환.
    pub fn description(&self) -> &'static str {
        match self {
            Permission::ViewAccount => "계정 조회",
            Permission::ChangePassword => "비밀번호 변경",
            Permission::CastVote => "투표",
            Permission::ManageCandidates => "후보자 관리",
            Permission::ViewRosterDetails => "명부 상세 조회",
        }
    }
}
