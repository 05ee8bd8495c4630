//! Account Repository
//!
//! 계정 테이블 연산을 담당합니다.

use ballot_core::{Account, NationalId, Role, StoreError};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

// ================================================================================================
// Types
// ================================================================================================

/// 계정 레코드
#[derive(Debug, Clone, FromRow)]
pub struct AccountRow {
    pub id: Uuid,
    pub national_id: i64,
    pub name: String,
    pub age: i32,
    pub address: String,
    #[sqlx(default)]
    pub email: Option<String>,
    #[sqlx(default)]
    pub mobile: Option<String>,
    pub password_hash: String,
    pub role: String,
    pub has_voted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = StoreError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let national_id = NationalId::from_i64(row.national_id)
            .map_err(|e| StoreError::Corrupt(format!("account {}: {}", row.id, e)))?;
        let role = Role::parse(&row.role)
            .ok_or_else(|| StoreError::Corrupt(format!("account {}: role '{}'", row.id, row.role)))?;

        Ok(Account {
            id: row.id,
            national_id,
            name: row.name,
            age: row.age,
            address: row.address,
            email: row.email,
            mobile: row.mobile,
            password_hash: row.password_hash,
            role,
            has_voted: row.has_voted,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const ACCOUNT_COLUMNS: &str = "id, national_id, name, age, address, email, mobile, \
     password_hash, role, has_voted, created_at, updated_at";

// ================================================================================================
// Repository
// ================================================================================================

/// Account Repository
pub struct AccountRepository;

impl AccountRepository {
    /// 계정 삽입.
    ///
    /// 식별번호 유일성과 관리자 유일성은 각각 `accounts_national_id_key` 제약과
    /// `accounts_single_admin` 부분 인덱스가 삽입과 함께 검사합니다.
    pub async fn insert(pool: &PgPool, account: &Account) -> Result<AccountRow, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO accounts (
                id, national_id, name, age, address, email, mobile,
                password_hash, role, has_voted, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {ACCOUNT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, AccountRow>(&query)
            .bind(account.id)
            .bind(account.national_id.as_i64())
            .bind(&account.name)
            .bind(account.age)
            .bind(&account.address)
            .bind(&account.email)
            .bind(&account.mobile)
            .bind(&account.password_hash)
            .bind(account.role.as_str())
            .bind(account.has_voted)
            .bind(account.created_at)
            .bind(account.updated_at)
            .fetch_one(pool)
            .await
    }

    /// ID로 조회
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<AccountRow>, sqlx::Error> {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1");

        sqlx::query_as::<_, AccountRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// 식별번호로 조회
    pub async fn find_by_national_id(
        pool: &PgPool,
        national_id: NationalId,
    ) -> Result<Option<AccountRow>, sqlx::Error> {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE national_id = $1");

        sqlx::query_as::<_, AccountRow>(&query)
            .bind(national_id.as_i64())
            .fetch_optional(pool)
            .await
    }

    /// 비밀번호 해시 교체
    pub async fn update_password_hash(
        pool: &PgPool,
        id: Uuid,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET password_hash = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(national_id: i64, role: &str) -> AccountRow {
        AccountRow {
            id: Uuid::new_v4(),
            national_id,
            name: "Lee".to_string(),
            age: 33,
            address: "Incheon".to_string(),
            email: None,
            mobile: Some("010-0000-0000".to_string()),
            password_hash: "$argon2id$x".to_string(),
            role: role.to_string(),
            has_voted: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_into_account() {
        let account = Account::try_from(row(123456789012, "admin")).unwrap();

        assert_eq!(account.national_id.as_i64(), 123456789012);
        assert_eq!(account.role, Role::Admin);
        assert!(account.has_voted);
    }

    #[test]
    fn test_corrupt_rows_are_rejected() {
        assert!(matches!(
            Account::try_from(row(42, "voter")),
            Err(StoreError::Corrupt(_))
        ));
        assert!(matches!(
            Account::try_from(row(123456789012, "superuser")),
            Err(StoreError::Corrupt(_))
        ));
    }
}
