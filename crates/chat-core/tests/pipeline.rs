//! End-to-end turns through the assistant with the mock gateway

use std::sync::Arc;

use chat_core::{Assistant, Holding, Intent, MessageBody, Session};
use market_data::{GatewayOperation, MockMarketData};
use rust_decimal_macros::dec;

fn assistant(gateway: &Arc<MockMarketData>) -> Assistant {
    Assistant::with_defaults(gateway.clone())
}

#[tokio::test]
async fn i_have_two_eth_on_empty_portfolio() {
    let gateway = Arc::new(MockMarketData::new());
    let mut session = Session::new();

    let message = assistant(&gateway).respond(&mut session, "I have 2 ETH").await;

    let MessageBody::Portfolio { holdings, total_value } = message.body else {
        panic!("expected portfolio message");
    };
    assert_eq!(holdings.len(), 1);
    assert_eq!(holdings[0].coin_id, "ethereum");
    assert_eq!(holdings[0].symbol, "eth");
    assert_eq!(holdings[0].amount, dec!(2));
    assert_eq!(holdings[0].value, Some(dec!(6900)));
    assert_eq!(total_value, dec!(6900));
    assert_eq!(session.holdings, holdings);
}

#[tokio::test]
async fn price_of_bitcoin() {
    let gateway = Arc::new(MockMarketData::new());

    let reply = assistant(&gateway).process("what's the price of bitcoin", &[]).await;

    let MessageBody::Price { coin_id, coin_name, price, .. } = reply.message.body else {
        panic!("expected price message");
    };
    assert_eq!(coin_id, "bitcoin");
    assert_eq!(coin_name, "Bitcoin");
    assert_eq!(price, dec!(97500));
    assert!(reply.updated_holdings.is_none());
}

#[tokio::test]
async fn repeated_add_keeps_single_entry() {
    let gateway = Arc::new(MockMarketData::new());
    let assistant = assistant(&gateway);
    let mut session = Session::new();

    assistant.respond(&mut session, "add 1 doge").await;
    assistant.respond(&mut session, "add 3 doge").await;

    assert_eq!(session.holdings.len(), 1);
    assert_eq!(session.holdings[0].coin_id, "dogecoin");
    assert_eq!(session.holdings[0].amount, dec!(3));
    assert_eq!(session.message_count(), 4);
}

#[tokio::test]
async fn chart_snapshot_failure_leaves_holdings() {
    let gateway = Arc::new(MockMarketData::new().failing(GatewayOperation::Snapshot));
    let mut session = Session::new();
    session.holdings = vec![Holding::new("bitcoin", "btc", dec!(1)).priced_at(dec!(97500))];
    let before = session.holdings.clone();

    let message = assistant(&gateway).respond(&mut session, "show me an eth chart").await;

    assert!(message.is_error());
    assert!(message.content().is_some_and(|c| c.contains("chart")));
    assert_eq!(session.holdings, before);
}

#[tokio::test]
async fn unrecognised_text_makes_no_calls() {
    let gateway = Arc::new(MockMarketData::new());
    let assistant = assistant(&gateway);

    assert_eq!(assistant.classify("good morning"), Intent::Help);
    let reply = assistant.process("good morning", &[]).await;

    assert_eq!(reply.message.body.kind(), "text");
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn portfolio_value_with_unchanged_prices() {
    let gateway = Arc::new(MockMarketData::new());
    let assistant = assistant(&gateway);
    let mut session = Session::new();

    assistant.respond(&mut session, "I have 2 ETH").await;
    assistant.respond(&mut session, "bought 0.5 btc").await;
    let before = chat_core::portfolio::total_value(&session.holdings).unwrap();

    let message = assistant.respond(&mut session, "portfolio value").await;

    let MessageBody::Portfolio { total_value, .. } = message.body else {
        panic!("expected portfolio message");
    };
    assert_eq!(total_value, before);
    assert_eq!(total_value, dec!(6900) + dec!(48750));
    assert_eq!(gateway.call_count(GatewayOperation::BatchPrices), 1);
}

#[tokio::test]
async fn trending_then_price_conversation() {
    let gateway = Arc::new(MockMarketData::new());
    let assistant = assistant(&gateway);
    let mut session = Session::new();

    let trending = assistant.respond(&mut session, "What's trending?").await;
    let price = assistant.respond(&mut session, "how much is cardano").await;

    assert_eq!(trending.body.kind(), "trending");
    assert_eq!(price.body.kind(), "price");
    assert_eq!(session.title(), "What's trending?");
}

#[tokio::test]
async fn oversized_amount_is_reported_not_panicking() {
    let gateway = Arc::new(MockMarketData::new());
    let assistant = assistant(&gateway);

    let reply = assistant
        .process("I have 79228162514264337593543950335 btc", &[])
        .await;
    assert!(reply.message.is_error());
    assert!(reply.updated_holdings.is_none());

    let mut session = Session::new();
    assistant.respond(&mut session, "I have 2 ETH").await;
    let before = session.holdings.clone();
    let message = assistant
        .respond(&mut session, "I have 79228162514264337593543950335 btc")
        .await;

    assert!(message.is_error());
    assert_eq!(session.holdings, before);
}
