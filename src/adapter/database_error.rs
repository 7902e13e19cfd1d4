/// データベースエラー型
/// データベース操作で発生するエラーを表現する
#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseError {
    /// データベース接続エラー
    ConnectionError(String),
    /// SQLクエリエラー
    QueryError(String),
    /// 一時的なエラー（ロック待ちタイムアウト・デッドロック）
    TransientError(String),
    /// マイグレーションエラー
    MigrationError(String),
}

impl std::fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseError::ConnectionError(msg) => write!(f, "Database connection error: {}", msg),
            DatabaseError::QueryError(msg) => write!(f, "Database query error: {}", msg),
            DatabaseError::TransientError(msg) => {
                write!(f, "Transient database error: {}", msg)
            }
            DatabaseError::MigrationError(msg) => write!(f, "Migration error: {}", msg),
        }
    }
}

impl std::error::Error for DatabaseError {}

// MySQLのロック待ちタイムアウト(1205)とデッドロック(1213)のエラー番号
const ER_LOCK_WAIT_TIMEOUT: u16 = 1205;
const ER_LOCK_DEADLOCK: u16 = 1213;

impl DatabaseError {
    /// sqlxのエラーをDatabaseErrorに分類する
    /// ロック競合は一時的なエラーとして扱い、呼び出し側の再試行を許す
    pub fn from_sqlx(err: sqlx::Error, context: &str) -> Self {
        match &err {
            sqlx::Error::Database(db_err) => {
                let number = db_err
                    .try_downcast_ref::<sqlx::mysql::MySqlDatabaseError>()
                    .map(|mysql_err| mysql_err.number());
                match number {
                    Some(ER_LOCK_WAIT_TIMEOUT) | Some(ER_LOCK_DEADLOCK) => {
                        DatabaseError::TransientError(format!("{}: {}", context, err))
                    }
                    _ => DatabaseError::QueryError(format!("{}: {}", context, err)),
                }
            }
            sqlx::Error::PoolTimedOut => {
                DatabaseError::TransientError(format!("{}: {}", context, err))
            }
            sqlx::Error::Io(_) => DatabaseError::ConnectionError(format!("{}: {}", context, err)),
            _ => DatabaseError::QueryError(format!("{}: {}", context, err)),
        }
    }
}

/// DatabaseErrorからRepositoryErrorへの変換
impl From<DatabaseError> for crate::domain::port::RepositoryError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::ConnectionError(msg) => {
                crate::domain::port::RepositoryError::ConnectionFailed(msg)
            }
            DatabaseError::QueryError(msg) => {
                crate::domain::port::RepositoryError::OperationFailed(msg)
            }
            DatabaseError::TransientError(msg) => {
                crate::domain::port::RepositoryError::Transient(msg)
            }
            DatabaseError::MigrationError(msg) => {
                crate::domain::port::RepositoryError::OperationFailed(msg)
            }
        }
    }
}
