use chrono::{Duration, NaiveDate};
use sales_forecast::artifact::load_model;
use sales_forecast::predictor::to_json;
use sales_forecast::{
    CsvStore, ForecastConfig, ForecastError, Predictor, PredictorOptions, ProductId, SalesStore,
    Trainer,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

// Product 1 sells 10 every Monday, product 2 sells 5 every Friday, for 8 weeks.
// Monday sales are split across a morning sale, an evening sale and an order.
// Product 3 is in the catalog but never sells.
fn write_weekly_shop(dir: &Path) {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(); // Monday

    let mut sales = String::from("sale_id,sale_date\n");
    let mut sale_items = String::from("sale_id,product_id,quantity\n");
    let mut orders = String::from("order_id,date\n");
    let mut order_items = String::from("order_id,product_id,quantity\n");

    for week in 0..8 {
        let monday = start + Duration::weeks(week);
        let friday = monday + Duration::days(4);
        let base = week as u64 * 10;

        sales.push_str(&format!("{},{} 08:30:00\n", base + 1, monday));
        sales.push_str(&format!("{},{} 19:05:00\n", base + 2, monday));
        sales.push_str(&format!("{},{} 12:00:00\n", base + 3, friday));
        sale_items.push_str(&format!("{},1,4\n{},1,3\n{},2,5\n", base + 1, base + 2, base + 3));

        orders.push_str(&format!("{},{}\n", base + 1, monday));
        order_items.push_str(&format!("{},1,3\n", base + 1));
    }

    fs::write(
        dir.join("product.csv"),
        "product_id,product_name\n1,Chicken kottu\n2,Fish bun\n3,Seasonal special\n",
    )
    .unwrap();
    fs::write(dir.join("sales.csv"), sales).unwrap();
    fs::write(dir.join("sale_items.csv"), sale_items).unwrap();
    fs::write(dir.join("orders.csv"), orders).unwrap();
    fs::write(dir.join("order_product.csv"), order_items).unwrap();
}

fn config_for(dir: &TempDir) -> ForecastConfig {
    let mut config = ForecastConfig::default();
    config.store.data_dir = dir.path().join("data");
    config.model.path = dir.path().join("models").join("sales_model.json");
    config.training.summary_path = Some(dir.path().join("daily_sales_summary.csv"));
    config
}

fn setup() -> (TempDir, ForecastConfig) {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("data")).unwrap();
    write_weekly_shop(&dir.path().join("data"));
    let config = config_for(&dir);
    (dir, config)
}

fn quantity_for(predictions: &[sales_forecast::PredictionRecord], id: ProductId) -> i64 {
    predictions
        .iter()
        .find(|p| p.product_id == id)
        .map(|p| p.predicted_quantity)
        .unwrap()
}

#[test]
fn test_full_train_and_predict_workflow() {
    let (_dir, config) = setup();
    let store = CsvStore::open(&config.store.data_dir).unwrap();

    // 1. Train
    let report = Trainer::new(&store, config.pipeline().unwrap(), config.trainer_options())
        .run()
        .unwrap();
    assert_eq!(report.daily_records, 16);
    // Product 1 spans Jan 1..Feb 23, product 2 Jan 5..Feb 23, zero-filled
    assert_eq!(report.training_rows, 54 + 50);
    assert_eq!(report.products, 2);
    assert!(config.model.path.exists());

    // 2. Audit summary has the merged Monday totals
    let summary = fs::read_to_string(config.training.summary_path.as_ref().unwrap()).unwrap();
    assert!(summary.contains("2024-01-01,1,Chicken kottu,10"));
    assert!(summary.contains("2024-01-05,2,Fish bun,5"));

    // 3. Predict a Monday and a Friday outside the training range
    let predictor =
        Predictor::load(&store, &config.model.path, config.predictor_options()).unwrap();

    let monday = predictor.predict_str("2024-03-04").unwrap();
    assert!(quantity_for(&monday, 1) > quantity_for(&monday, 2));
    assert!(quantity_for(&monday, 1) >= 5);

    let friday = predictor.predict_str("2024-03-08").unwrap();
    assert!(quantity_for(&friday, 2) > quantity_for(&friday, 1));
    assert!(quantity_for(&friday, 2) >= 3);
}

#[test]
fn test_output_covers_every_store_product_once() {
    let (_dir, config) = setup();
    let store = CsvStore::open(&config.store.data_dir).unwrap();
    Trainer::new(&store, config.pipeline().unwrap(), config.trainer_options())
        .run()
        .unwrap();

    let predictor =
        Predictor::load(&store, &config.model.path, config.predictor_options()).unwrap();
    let mut ids: Vec<ProductId> = predictor
        .predict_str("2024-02-12")
        .unwrap()
        .into_iter()
        .map(|p| p.product_id)
        .collect();
    ids.sort();

    let mut expected = store.product_ids().unwrap();
    expected.sort();
    assert_eq!(ids, expected);
}

#[test]
fn test_product_added_after_training_is_predicted() {
    let (_dir, config) = setup();
    let store = CsvStore::open(&config.store.data_dir).unwrap();
    Trainer::new(&store, config.pipeline().unwrap(), config.trainer_options())
        .run()
        .unwrap();

    // Product 3 exists in the catalog but never sold, so it is outside the vocabulary
    let model = load_model(&config.model.path).unwrap();
    assert!(!model.encoder().contains(3));

    let predictor = Predictor::new(&store, model, PredictorOptions::default());
    let predictions = predictor.predict_str("2024-03-04").unwrap();
    let special = quantity_for(&predictions, 3);
    assert!((0..=10).contains(&special));
}

#[test]
fn test_reloaded_model_predicts_identically() {
    let (_dir, config) = setup();
    let store = CsvStore::open(&config.store.data_dir).unwrap();
    let trainer = Trainer::new(&store, config.pipeline().unwrap(), config.trainer_options());

    let (in_memory, _) = trainer.fit().unwrap();
    trainer.run().unwrap();
    let reloaded = load_model(&config.model.path).unwrap();

    let options = PredictorOptions::default();
    let date = NaiveDate::from_ymd_opt(2024, 5, 17).unwrap();
    let before = Predictor::new(&store, in_memory, options)
        .predict_date(date)
        .unwrap();
    let after = Predictor::new(&store, reloaded, options)
        .predict_date(date)
        .unwrap();

    assert_eq!(to_json(&before).unwrap(), to_json(&after).unwrap());
}

#[test]
fn test_predict_before_training_is_model_not_found() {
    let (_dir, config) = setup();
    let store = CsvStore::open(&config.store.data_dir).unwrap();

    let err = Predictor::load(&store, &config.model.path, config.predictor_options()).unwrap_err();
    assert!(matches!(err, ForecastError::ModelNotFound(_)));
    assert!(err.to_string().contains("train"));
}

#[test]
fn test_retraining_overwrites_the_artifact() {
    let (_dir, config) = setup();
    let store = CsvStore::open(&config.store.data_dir).unwrap();
    let trainer = Trainer::new(&store, config.pipeline().unwrap(), config.trainer_options());

    trainer.run().unwrap();
    let first = fs::read(&config.model.path).unwrap();
    trainer.run().unwrap();
    let second = fs::read(&config.model.path).unwrap();

    // Fixed seed: same data, same artifact
    assert_eq!(first, second);
}
