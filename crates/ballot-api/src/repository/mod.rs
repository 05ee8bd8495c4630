//! Repository pattern for database operations.
//!
//! 데이터베이스 접근 로직을 서비스 계층에서 분리하여 관리합니다.
//! 모든 Repository는 static methods 패턴을 사용하며,
//! [`PgElectionStore`]가 이를 저장소 trait으로 노출합니다.

pub mod accounts;
pub mod ballots;
pub mod candidates;
pub mod store;

pub use accounts::{AccountRepository, AccountRow};
pub use ballots::BallotRepository;
pub use candidates::{CandidateRepository, CandidateRow, TallyRow};
pub use store::{map_db_error, PgElectionStore};
