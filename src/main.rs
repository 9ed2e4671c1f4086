/**
* filename : main
* author : HAMA
* date: 2026. 8. 30.
* description:
**/

use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{interval, Duration};

use papertrade::config::Config;
use papertrade::engine::lifecycle::{OpenRequest, PositionLifecycle};
use papertrade::models::account::Account;
use papertrade::models::position::Direction;
use papertrade::price::binance::BinancePriceSource;
use papertrade::price::mocks::MockPriceSource;
use papertrade::price::traits::PriceSource;
use papertrade::storage::{AccountStore, JsonFileAccountStore};
use papertrade::utils::logging;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // 로깅 초기화
    logging::init()?;
    log::info!("모의 트레이딩 엔진 모니터 시작...");

    // 설정 로드
    let config = Config::load()?;
    log::info!("설정 로드 완료");

    // 시세 소스 생성. 모의 소스는 스캔마다 tick()으로 가격을 움직여야 하므로
    // 구체 타입 핸들을 따로 유지한다
    let mock_source = if config.price_source.use_mock {
        log::info!("모의 시세 소스 사용");
        Some(Arc::new(MockPriceSource::new()))
    } else {
        None
    };
    let source: Arc<dyn PriceSource> = match &mock_source {
        Some(mock) => mock.clone(),
        None => {
            let timeout_ms = config.price_source.timeout_ms.unwrap_or(5000);
            log::info!("Binance 시세 소스 사용: {}", config.price_source.base_url);
            Arc::new(BinancePriceSource::new(
                config.price_source.base_url.clone(),
                timeout_ms,
            )?)
        }
    };

    // 계정 저장소 생성
    let store: Arc<RwLock<dyn AccountStore>> = Arc::new(RwLock::new(JsonFileAccountStore::new(
        config.storage.db_path.clone(),
    )));

    // 생명주기 관리자 생성
    let lifecycle = PositionLifecycle::new(config.engine.clone());

    // 모의 시세 모드에서 계정이 하나도 없으면 데모 계정 생성
    if config.price_source.use_mock {
        let empty = { store.read().await.load_all().await?.is_empty() };
        if empty {
            seed_demo_account(&lifecycle, &source, &store).await?;
        }
    }

    // 주기적 스캔 루프: 계정별로 미체결 포지션 재평가
    let mut scan_timer = interval(Duration::from_millis(config.engine.refresh_interval_ms));

    loop {
        scan_timer.tick().await;

        // 모의 시세를 랜덤 워크로 갱신
        if let Some(mock) = &mock_source {
            mock.tick().await;
        }

        let accounts = match store.read().await.load_all().await {
            Ok(accounts) => accounts,
            Err(e) => {
                logging::log_error("계정 로드", &e);
                continue;
            }
        };

        for mut account in accounts {
            if account.open_count() == 0 {
                continue;
            }

            match lifecycle.refresh_account(&mut account, source.as_ref()).await {
                Ok(closed) => {
                    if closed.is_empty() {
                        continue;
                    }
                    let mut store = store.write().await;
                    if let Err(e) = store.save(&account).await {
                        logging::log_error("계정 저장", &e);
                    }
                }
                Err(e) => logging::log_error("계정 갱신", &e),
            }
        }
    }
}

/// 데모 계정 생성: 입금 후 BTC 롱 포지션 하나 개설
async fn seed_demo_account(
    lifecycle: &PositionLifecycle,
    source: &Arc<dyn PriceSource>,
    store: &Arc<RwLock<dyn AccountStore>>,
) -> Result<(), anyhow::Error> {
    let mut account = Account::new("demo");
    account.deposit(1000.0)?;

    let current_price = source.get_price("BTC").await?;
    let request = OpenRequest {
        symbol: "BTC".to_string(),
        direction: Direction::Long,
        margin: 100.0,
        leverage: 10,
        take_profit: Some(current_price * 1.05),
        stop_loss: Some(current_price * 0.97),
    };
    lifecycle.open(&mut account, request, current_price)?;
    log::info!("데모 계정 생성 완료: 잔고 {}", account.balance);

    store.write().await.save(&account).await?;
    Ok(())
}
