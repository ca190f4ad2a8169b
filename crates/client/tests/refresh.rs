mod common;

use std::time::Duration;

use client::DashboardRefresher;

use common::MockApi;

#[tokio::test]
async fn refresher_reloads_until_stopped() {
    let mock = MockApi::start().await;
    let session = mock.signed_in();

    let mut refresher = DashboardRefresher::start(session.clone(), Duration::from_millis(40));
    let mut updates = refresher.updates();
    assert!(refresher.is_running());

    for _ in 0..2 {
        tokio::time::timeout(Duration::from_secs(2), updates.changed())
            .await
            .expect("refresh did not happen in time")
            .unwrap();
    }
    let dashboard = updates.borrow().clone().unwrap();
    assert_eq!(dashboard.net_income, 350.0);
    assert_eq!(dashboard.spending_by_category[0].category_name, "Groceries");

    refresher.stop();
    assert!(!refresher.is_running());
    // Let a request that was already on the wire land before counting.
    tokio::time::sleep(Duration::from_millis(20)).await;
    let seen = mock.state.hits("dashboard");
    assert!(seen >= 2);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(mock.state.hits("dashboard"), seen);
}

#[tokio::test]
async fn dropping_the_handle_stops_refreshing() {
    let mock = MockApi::start().await;
    let refresher = DashboardRefresher::start(mock.signed_in(), Duration::from_millis(30));
    drop(refresher);

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(mock.state.hits("dashboard"), 0);
}

#[tokio::test]
async fn failed_refresh_keeps_running() {
    let mock = MockApi::start().await;
    // No token: every refresh is rejected.
    let session = mock.session();
    let refresher = DashboardRefresher::start(session, Duration::from_millis(30));

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(refresher.is_running());
    assert!(mock.state.hits("dashboard") >= 2);
    assert!(refresher.updates().borrow().is_none());
}
