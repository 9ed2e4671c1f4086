//! 계정 저장소
//!
//! 계정 로드/저장 인터페이스와 메모리 / JSON 파일 구현 제공.
//! 엔진은 저장소를 직접 호출하지 않으며, 호스팅 계층이 연산 단위로
//! read-modify-write를 수행한다

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::EngineError;
use crate::models::account::Account;

/// 계정 저장소 인터페이스
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// 사용자 ID로 계정 로드
    async fn load(&self, user_id: &str) -> Result<Option<Account>, EngineError>;

    /// 계정 저장 (이미 존재하면 교체)
    async fn save(&mut self, account: &Account) -> Result<(), EngineError>;

    /// 모든 계정 로드
    async fn load_all(&self) -> Result<Vec<Account>, EngineError>;
}

/// 메모리 기반 계정 저장소 구현
pub struct InMemoryAccountStore {
    accounts: HashMap<String, Account>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        InMemoryAccountStore {
            accounts: HashMap::new(),
        }
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn load(&self, user_id: &str) -> Result<Option<Account>, EngineError> {
        Ok(self.accounts.get(user_id).cloned())
    }

    async fn save(&mut self, account: &Account) -> Result<(), EngineError> {
        self.accounts
            .insert(account.user_id.clone(), account.clone());
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<Account>, EngineError> {
        Ok(self.accounts.values().cloned().collect())
    }
}

/// JSON 파일 기반 계정 저장소 구현
///
/// 파일 전체를 하나의 문서로 다루며, 저장 시 read-modify-write로 교체한다
pub struct JsonFileAccountStore {
    path: PathBuf,
}

impl JsonFileAccountStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileAccountStore { path: path.into() }
    }

    fn read_document(&self) -> Result<Vec<Account>, EngineError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }
        let accounts: Vec<Account> = serde_json::from_str(&contents)?;
        Ok(accounts)
    }

    fn write_document(&self, accounts: &[Account]) -> Result<(), EngineError> {
        let json = serde_json::to_string_pretty(accounts)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

#[async_trait]
impl AccountStore for JsonFileAccountStore {
    async fn load(&self, user_id: &str) -> Result<Option<Account>, EngineError> {
        let accounts = self.read_document()?;
        Ok(accounts.into_iter().find(|a| a.user_id == user_id))
    }

    async fn save(&mut self, account: &Account) -> Result<(), EngineError> {
        let mut accounts = self.read_document()?;
        match accounts.iter_mut().find(|a| a.user_id == account.user_id) {
            Some(existing) => *existing = account.clone(),
            None => accounts.push(account.clone()),
        }
        self.write_document(&accounts)
    }

    async fn load_all(&self) -> Result<Vec<Account>, EngineError> {
        self.read_document()
    }
}
