use super::*;
use crate::error::ServiceError;
use peruse_store::NewItem;

async fn setup() -> ItemService {
    let db = Database::open_in_memory().unwrap();
    db.initialize().await.unwrap();
    ItemService::new(db)
}

fn umbrella() -> NewItem {
    NewItem {
        name: "Umbrella".into(),
        price: 20.0,
        purchase_date: "2024-01-01T00:00:00.000Z".into(),
        color: None,
        group_id: None,
    }
}

#[tokio::test]
async fn create_get_round_trip() {
    let service = setup().await;

    let item = service.create_item(umbrella()).await.unwrap();
    let fetched = service.get_item(item.id).await.unwrap().unwrap();
    assert_eq!(fetched.name, "Umbrella");
    assert_eq!(fetched.price, 20.0);
    assert_eq!(fetched.color, peruse_store::DEFAULT_COLOR);
}

#[tokio::test]
async fn umbrella_scenario_end_to_end() {
    let service = setup().await;

    let item = service.create_item(umbrella()).await.unwrap();

    let report = service.item_with_usage(item.id).await.unwrap();
    assert_eq!(report.usage_count, 0);
    assert_eq!(report.price_per_use, 20.0);

    service.increment_usage(item.id).await.unwrap();
    let report = service.item_with_usage(item.id).await.unwrap();
    assert_eq!(report.usage_count, 1);
    assert_eq!(report.price_per_use, 20.0);

    service.increment_usage(item.id).await.unwrap();
    let report = service.item_with_usage(item.id).await.unwrap();
    assert_eq!(report.usage_count, 2);
    assert_eq!(report.price_per_use, 10.0);
}

#[tokio::test]
async fn create_rejects_bad_input_without_writing() {
    let service = setup().await;

    let cases = vec![
        NewItem {
            name: "".into(),
            ..umbrella()
        },
        NewItem {
            name: "x".repeat(51),
            ..umbrella()
        },
        NewItem {
            price: 0.0,
            ..umbrella()
        },
        NewItem {
            price: -5.0,
            ..umbrella()
        },
        NewItem {
            purchase_date: "".into(),
            ..umbrella()
        },
        NewItem {
            color: Some("red".into()),
            ..umbrella()
        },
    ];

    for input in cases {
        let result = service.create_item(input.clone()).await;
        assert!(
            matches!(result, Err(ServiceError::Validation { .. })),
            "expected rejection for {input:?}"
        );
    }

    // Nothing was written.
    assert!(service.items().await.unwrap().is_empty());
}

#[tokio::test]
async fn create_with_empty_color_falls_back_to_default() {
    let service = setup().await;

    let item = service
        .create_item(NewItem {
            color: Some("".into()),
            ..umbrella()
        })
        .await
        .unwrap();
    assert_eq!(item.color, peruse_store::DEFAULT_COLOR);
}

#[tokio::test]
async fn update_validates_supplied_fields_only() {
    let service = setup().await;
    let item = service.create_item(umbrella()).await.unwrap();

    // Price-only patch is fine and leaves everything else alone.
    service
        .update_item(
            item.id,
            peruse_store::ItemPatch {
                price: Some(30.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let fetched = service.get_item(item.id).await.unwrap().unwrap();
    assert_eq!(fetched.price, 30.0);
    assert_eq!(fetched.name, "Umbrella");

    // Bad values in a patch are rejected, symmetrically with create.
    let bad_price = service
        .update_item(
            item.id,
            peruse_store::ItemPatch {
                price: Some(0.0),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(bad_price, Err(ServiceError::Validation { .. })));

    let bad_color = service
        .update_item(
            item.id,
            peruse_store::ItemPatch {
                color: Some("blue".into()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(bad_color, Err(ServiceError::Validation { .. })));

    // Failed updates left the row untouched.
    let fetched = service.get_item(item.id).await.unwrap().unwrap();
    assert_eq!(fetched.price, 30.0);
    assert_eq!(fetched.color, peruse_store::DEFAULT_COLOR);
}

#[tokio::test]
async fn increment_usage_for_missing_item_is_not_found() {
    let service = setup().await;

    let result = service.increment_usage(404).await;
    assert!(matches!(
        result,
        Err(ServiceError::Store(StoreError::NotFound {
            entity: "item",
            id: 404,
        }))
    ));
}

#[tokio::test]
async fn backdated_usage_keeps_insertion_time() {
    let service = setup().await;
    let item = service.create_item(umbrella()).await.unwrap();

    let usage = service
        .add_usage(item.id, Some("2023-11-05T00:00:00.000Z"))
        .await
        .unwrap();
    assert_eq!(usage.usage_date, "2023-11-05T00:00:00.000Z");
    assert!(usage.created_at > usage.usage_date);

    let history = service.usage_history(item.id).await.unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn delete_item_clears_usage_history() {
    let service = setup().await;
    let item = service.create_item(umbrella()).await.unwrap();
    service.increment_usage(item.id).await.unwrap();

    service.delete_item(item.id).await.unwrap();
    assert!(service.get_item(item.id).await.unwrap().is_none());
    assert!(service.usage_history(item.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_usage_record_removes_exactly_one() {
    let service = setup().await;
    let item = service.create_item(umbrella()).await.unwrap();
    let first = service.increment_usage(item.id).await.unwrap();
    service.increment_usage(item.id).await.unwrap();

    service.delete_usage_record(first.id).await.unwrap();
    assert_eq!(service.usage_history(item.id).await.unwrap().len(), 1);
}

#[test]
fn currency_formatting() {
    assert_eq!(format_currency(20.0), "$20.00");
    assert_eq!(format_currency(10.0), "$10.00");
    assert_eq!(format_currency(6.666666), "$6.67");
    assert_eq!(format_currency(0.5), "$0.50");
}
