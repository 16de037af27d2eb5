mod common;

use approx::assert_relative_eq;
use common::date;
use forecast_reconcile::data::DEFAULT_CATEGORY;
use forecast_reconcile::{DataLoader, ReconcileError};
use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::NamedTempFile;

fn csv_file(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file.flush().unwrap();
    file
}

#[test]
fn test_histories_from_csv() {
    let file = csv_file(&[
        "entity_id,date,quantity,category",
        "sku-2,2024-01-02,4,Drinks",
        "sku-1,2024-01-01,3,Snacks",
        "sku-1,2024-01-03,5,Snacks",
        "sku-1,2024-01-01,2,Snacks",
        "sku-3,2024-01-01,1,",
    ]);

    let histories = DataLoader::histories_from_csv(file.path()).unwrap();
    assert_eq!(histories.len(), 3);

    let sku1 = &histories["sku-1"];
    assert_eq!(sku1.category, "Snacks");
    assert_eq!(sku1.series.values(), vec![5.0, 5.0]);
    assert_eq!(sku1.series.first_date(), Some(date(2024, 1, 1)));

    assert_eq!(histories["sku-3"].category, DEFAULT_CATEGORY);
}

#[test]
fn test_histories_without_category_column() {
    let file = csv_file(&["entity_id,date,quantity", "a,2024-03-01,1.5", "a,2024-03-02,2.5"]);
    let histories = DataLoader::histories_from_csv(file.path()).unwrap();
    assert_eq!(histories["a"].category, DEFAULT_CATEGORY);
    assert_eq!(histories["a"].series.len(), 2);
}

#[test]
fn test_negative_history_is_rejected() {
    let file = csv_file(&["entity_id,date,quantity", "a,2024-03-01,-1"]);
    assert!(matches!(
        DataLoader::histories_from_csv(file.path()),
        Err(ReconcileError::DataError(_))
    ));
}

#[test]
fn test_daily_forecasts_from_csv() {
    let file = csv_file(&[
        "entity_id,date,predicted_quantity,lower_bound,upper_bound",
        "a,2024-04-02,10,8,12",
        "a,2024-04-01,-3,-5,2",
        "a,2024-04-03,10,,",
    ]);

    let forecasts = DataLoader::daily_forecasts_from_csv(file.path()).unwrap();
    let a = &forecasts["a"];
    assert_eq!(a.len(), 3);
    assert_eq!(a.points[0].date, date(2024, 4, 1));
    assert_eq!(a.points[0].predicted_quantity, 0.0);
    assert_eq!(a.points[0].lower_bound, 0.0);
    assert_relative_eq!(a.points[2].lower_bound, 8.0);
    assert_relative_eq!(a.points[2].upper_bound, 12.0);
}

#[test]
fn test_bucketed_forecasts_from_csv() {
    let file = csv_file(&[
        "entity_id,bucket,predicted_quantity,lower_bound,upper_bound",
        "a,1-30,300,250,350",
        "a,31-60,330,,",
        "a,61-90,360,300,420",
    ]);

    let buckets = DataLoader::bucketed_forecasts_from_csv(file.path()).unwrap();
    let a = &buckets["a"];
    assert_relative_eq!(a.total(), 990.0);
    assert_eq!(a.buckets[1].label, "31-60");
    assert_relative_eq!(a.buckets[1].lower_bound, 264.0);
}

#[test]
fn test_wrong_bucket_count_is_rejected() {
    let file = csv_file(&[
        "entity_id,bucket,predicted_quantity,lower_bound,upper_bound",
        "a,1-30,300,250,350",
        "a,31-60,330,300,360",
    ]);
    assert!(DataLoader::bucketed_forecasts_from_csv(file.path()).is_err());
}

#[test]
fn test_accuracy_from_csv() {
    let file = csv_file(&[
        "entity_id,model,mape,mae",
        "a,seasonal,,",
        "a,regression,18.5,2.1",
        "b,Regression,40,",
    ]);

    let accuracy = DataLoader::accuracy_from_csv(file.path()).unwrap();
    assert_eq!(accuracy["a"].seasonal.mape, None);
    assert_eq!(accuracy["a"].regression.mape, Some(18.5));
    assert_eq!(accuracy["a"].regression.mae, Some(2.1));
    assert_eq!(accuracy["b"].regression.mape, Some(40.0));
    assert_eq!(accuracy["b"].seasonal.mape, None);
}

#[test]
fn test_unknown_model_is_rejected() {
    let file = csv_file(&["entity_id,model,mape,mae", "a,prophet,10,1"]);
    assert!(DataLoader::accuracy_from_csv(file.path()).is_err());
}

#[test]
fn test_missing_file() {
    assert!(DataLoader::histories_from_csv("/definitely/not/here.csv").is_err());
}
