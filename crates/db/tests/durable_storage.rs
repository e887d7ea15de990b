use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;

use cutquote_core::domain::catalog::MeasurementMode;
use cutquote_core::domain::customer::CustomerId;
use cutquote_core::domain::order::{LineItem, Order, OrderId, OrderStatus};
use cutquote_db::migrations;
use cutquote_db::repositories::SqlOrderRepository;
use cutquote_db::{connect_with_settings, DemoDataset, OrderRepository};

fn database_url(dir: &tempfile::TempDir) -> String {
    format!("sqlite://{}?mode=rwc", dir.path().join("cutquote.db").display())
}

fn window_order(sequence: u32) -> Order {
    let day = NaiveDate::from_ymd_opt(2026, 3, 14).expect("date");
    let created_at = Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).single().expect("timestamp");
    let line = |name: &str| LineItem {
        piece_name: name.to_string(),
        quantity: 3,
        height_mm: 1000,
        width_mm: 600,
        area_m2: Decimal::new(200, 2),
        unit_price: Decimal::new(18_000, 2),
        total: Decimal::new(36_000, 2),
    };

    Order {
        id: OrderId::new(day, sequence),
        name: "kitchen".to_string(),
        customer_id: CustomerId("C-001".to_string()),
        project_description: "Sliding window, 2 leaves".to_string(),
        material_description: "Clear 8mm Tempered".to_string(),
        measurement_mode: MeasurementMode::Final,
        opening_height_mm: 1000,
        opening_width_mm: 1200,
        units: 3,
        lines: vec![line("Fixed leaf"), line("Sliding leaf")],
        total: Decimal::new(72_000, 2),
        status: OrderStatus::Quote,
        created_at,
        authorized_at: None,
    }
}

#[tokio::test]
async fn orders_and_seed_data_survive_a_reconnect() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = database_url(&dir);

    {
        let pool = connect_with_settings(&url, 2, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        DemoDataset::load(&pool).await.expect("seed");
        SqlOrderRepository::new(pool.clone())
            .append(vec![window_order(1), window_order(2)])
            .await
            .expect("append");
        pool.close().await;
    }

    let pool = connect_with_settings(&url, 2, 30).await.expect("reconnect");
    migrations::run_pending(&pool).await.expect("migrations are idempotent");

    let verification = DemoDataset::verify(&pool).await.expect("verify");
    assert!(verification.all_present, "{:?}", verification.checks);

    let orders = SqlOrderRepository::new(pool.clone()).list_all().await.expect("list");
    assert_eq!(orders, vec![window_order(1), window_order(2)]);
    assert_eq!(orders[0].id.0, "260314_0001");
    assert_eq!(orders[1].total, Decimal::new(72_000, 2));
}

#[tokio::test]
async fn authorization_is_durable() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = database_url(&dir);
    let authorized_at = Utc.with_ymd_and_hms(2026, 3, 14, 10, 0, 0).single().expect("timestamp");

    {
        let pool = connect_with_settings(&url, 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        let repo = SqlOrderRepository::new(pool.clone());
        repo.append(vec![window_order(1)]).await.expect("append");
        let updated = repo
            .update_status("kitchen", OrderStatus::Authorized, Some(authorized_at))
            .await
            .expect("authorize");
        assert_eq!(updated, 1);
        pool.close().await;
    }

    let pool = connect_with_settings(&url, 1, 30).await.expect("reconnect");
    let orders = SqlOrderRepository::new(pool).list_by_name("kitchen").await.expect("list");
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].status, OrderStatus::Authorized);
    assert_eq!(orders[0].authorized_at, Some(authorized_at));
}
