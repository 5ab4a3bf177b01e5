use fund_indicators::config::ReferenceAssets;
use fund_indicators::datasource::mock::{MockLedger, MockOperation};
use fund_indicators::domain::{Orderbook, OrderbookLevel, PriceProvenance, PriceSource};
use fund_indicators::pricing::PricingError;
use fund_indicators::{AssetInfo, DataSourceError, Decimal, PriceCache, PriceDiscoveryService};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn fund() -> AssetInfo {
    AssetInfo::credit("FUND", "GISSUER").unwrap()
}

fn brl() -> AssetInfo {
    AssetInfo::credit("BRL", "GANCHOR").unwrap()
}

fn level(price: &str) -> OrderbookLevel {
    OrderbookLevel {
        price: dec(price),
        amount: dec("1000"),
    }
}

fn make_test_service(ledger: Arc<MockLedger>) -> PriceDiscoveryService {
    PriceDiscoveryService::new(
        ledger,
        Arc::new(PriceCache::new()),
        ReferenceAssets {
            primary: brl(),
            secondary: AssetInfo::native(),
        },
        20,
    )
}

#[tokio::test]
async fn test_spot_race_keeps_higher_price() {
    let ledger = Arc::new(
        MockLedger::new()
            .with_path_rate(&fund(), &brl(), dec("8.5"), vec![AssetInfo::native()])
            .with_orderbook(
                &fund(),
                &brl(),
                Orderbook {
                    bids: vec![level("8.7")],
                    asks: vec![level("9.1")],
                },
            )
            .with_latency(Duration::from_millis(5)),
    );
    let service = make_test_service(ledger);

    let price = service
        .get_price(&fund(), &brl(), Decimal::one(), &CancellationToken::new())
        .await
        .unwrap();

    // The book contributes its ask, which beats the path.
    assert_eq!(price.price, dec("9.1"));
    match &price.provenance {
        PriceProvenance::Best(best) => {
            assert_eq!(best.chosen, PriceSource::Orderbook);
            assert_eq!(best.path_price, dec("8.5"));
            assert_eq!(best.orderbook_price, dec("9.1"));
        }
        other => panic!("expected Best provenance, got {:?}", other),
    }
}

async fn spot_race(path_rate: &str, book: Orderbook) -> (Decimal, PriceSource) {
    let ledger = Arc::new(
        MockLedger::new()
            .with_path_rate(&fund(), &brl(), dec(path_rate), vec![])
            .with_orderbook(&fund(), &brl(), book),
    );
    let price = make_test_service(ledger)
        .get_price(&fund(), &brl(), Decimal::one(), &CancellationToken::new())
        .await
        .unwrap();
    match price.provenance {
        PriceProvenance::Best(best) => (price.price, best.chosen),
        other => panic!("expected Best provenance, got {:?}", other),
    }
}

#[tokio::test]
async fn test_spot_race_path_beats_lower_book_bid() {
    let (price, chosen) = spot_race(
        "0.5",
        Orderbook {
            bids: vec![level("0.4")],
            asks: vec![],
        },
    )
    .await;
    assert_eq!(price, dec("0.5"));
    assert_eq!(chosen, PriceSource::Path);
}

#[tokio::test]
async fn test_spot_race_tie_goes_to_path() {
    let (price, chosen) = spot_race(
        "0.5",
        Orderbook {
            bids: vec![],
            asks: vec![level("0.5")],
        },
    )
    .await;
    assert_eq!(price, dec("0.5"));
    assert_eq!(chosen, PriceSource::Path);
}

#[tokio::test]
async fn test_amm_cheaper_than_book_ask() {
    let ledger = Arc::new(
        MockLedger::new()
            .with_orderbook(
                &fund(),
                &brl(),
                Orderbook {
                    bids: vec![],
                    asks: vec![level("9")],
                },
            )
            // Spot 4000 / 500 = 8
            .with_pool("deep", vec![(fund(), dec("500")), (brl(), dec("4000"))])
            // Zero reserve yields no price instead of failing.
            .with_pool("empty", vec![(fund(), dec("0")), (brl(), dec("10"))]),
    );
    let service = make_test_service(ledger);

    let price = service
        .get_price(&fund(), &brl(), Decimal::one(), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(price.price, dec("8"));
    assert!(matches!(price.provenance, PriceProvenance::LiquidityPool(_)));
}

#[tokio::test]
async fn test_repeated_query_served_from_cache() {
    let ledger = Arc::new(MockLedger::new().with_path_rate(&fund(), &brl(), dec("8.5"), vec![]));
    let service = make_test_service(ledger.clone());
    let cancel = CancellationToken::new();

    let first = service
        .get_price(&fund(), &brl(), dec("250"), &cancel)
        .await
        .unwrap();
    let second = service
        .get_price(&fund(), &brl(), dec("250"), &cancel)
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(ledger.call_count(MockOperation::StrictSendPaths), 1);
    assert_eq!(ledger.call_count(MockOperation::Orderbook), 0);
}

#[tokio::test]
async fn test_all_sources_failing_reports_transport_error() {
    let ledger = Arc::new(
        MockLedger::new()
            .with_failure(MockOperation::StrictSendPaths, DataSourceError::RateLimited)
            .with_failure(MockOperation::StrictReceivePaths, DataSourceError::RateLimited)
            .with_failure(MockOperation::Orderbook, DataSourceError::RateLimited)
            .with_failure(MockOperation::LiquidityPools, DataSourceError::RateLimited),
    );
    let service = make_test_service(ledger);

    let err = service
        .get_price(&fund(), &brl(), Decimal::one(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err, PricingError::DataSource(DataSourceError::RateLimited));
}

#[tokio::test]
async fn test_unknown_asset_has_no_price() {
    let service = make_test_service(Arc::new(MockLedger::new()));
    let err = service
        .get_price(&fund(), &brl(), Decimal::one(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, PricingError::NoPrice { .. }));

    let err = service
        .get_bid_price(&fund(), &brl(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, PricingError::NoPrice { .. }));
}

#[tokio::test]
async fn test_token_prices_derive_secondary_through_cross_rate() {
    let ledger = Arc::new(
        MockLedger::new()
            .with_path_rate(&fund(), &brl(), dec("3"), vec![])
            .with_path_rate(&brl(), &AssetInfo::native(), dec("4"), vec![]),
    );
    let service = make_test_service(ledger);

    let prices = service
        .get_token_prices(&fund(), dec("0.33333333"), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(prices.price_primary, dec("3"));
    assert_eq!(prices.price_secondary, dec("12"));
    // 0.99999999 and 3.99999996 at seven fractional digits.
    assert_eq!(prices.value_primary, dec("1"));
    assert_eq!(prices.value_secondary, dec("4"));
    assert!(matches!(
        prices.provenance_secondary,
        PriceProvenance::CrossRate(_)
    ));
}

#[tokio::test]
async fn test_cancelled_spot_race() {
    let ledger = Arc::new(
        MockLedger::new()
            .with_path_rate(&fund(), &brl(), dec("8.5"), vec![])
            .with_latency(Duration::from_secs(30)),
    );
    let service = make_test_service(ledger);
    let cancel = CancellationToken::new();

    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        canceller.cancel();
    });

    let err = service
        .get_price(&fund(), &brl(), Decimal::one(), &cancel)
        .await
        .unwrap_err();
    assert_eq!(err, PricingError::Cancelled);
}
