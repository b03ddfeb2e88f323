//! End-to-end train and test runs over CSV files.

use std::fs;
use std::path::Path;

use bigmart_sales::io::read_table;
use bigmart_sales::pipeline::{self, run_feature_engineering, run_prediction, run_training};
use bigmart_sales::types::columns::ITEM_OUTLET_SALES;
use bigmart_sales::{Error, FeatureTransformer, LinearModel, Mode, Settings, Value};

const HEADER: &str = "Item_Identifier,Item_Weight,Item_Fat_Content,Item_Type,Item_MRP,\
Outlet_Identifier,Outlet_Establishment_Year,Outlet_Size,Outlet_Location_Type,Outlet_Type";

const ITEMS: [(&str, f64, &str, &str, f64); 6] = [
    ("FDA15", 9.3, "Low Fat", "Dairy", 249.81),
    ("DRC01", 5.92, "Regular", "Soft Drinks", 48.27),
    ("FDN15", 17.5, "low fat", "Meat", 141.62),
    ("FDX07", 19.2, "reg", "Fruits and Vegetables", 182.10),
    ("NCD19", 8.93, "LF", "Household", 53.86),
    ("FDP36", 10.395, "Regular", "Baking Goods", 51.40),
];

const OUTLETS: [(&str, i64, &str, &str, &str); 3] = [
    ("OUT049", 1999, "Medium", "Tier 1", "Supermarket Type1"),
    ("OUT010", 1998, "", "Tier 3", "Grocery Store"),
    ("OUT027", 1985, "Medium", "Tier 3", "Supermarket Type3"),
];

/// Every item in every listed outlet. Some weights are left out in the
/// second and third outlet; the first always has them.
fn raw_csv(outlets: &[usize], with_sales: bool) -> String {
    let mut out = String::from(HEADER);
    if with_sales {
        out.push_str(",Item_Outlet_Sales");
    }
    out.push('\n');
    for &j in outlets {
        let (outlet, year, size, tier, outlet_type) = OUTLETS[j];
        for (i, (item, weight, fat, item_type, mrp)) in ITEMS.iter().enumerate() {
            let weight = if j > 0 && (i + j) % 3 == 0 {
                String::new()
            } else {
                weight.to_string()
            };
            let mrp = mrp + j as f64;
            out.push_str(&format!(
                "{item},{weight},{fat},{item_type},{mrp},{outlet},{year},{size},{tier},{outlet_type}"
            ));
            if with_sales {
                out.push_str(&format!(",{}", 12.0 * mrp + 300.0 * j as f64 + i as f64));
            }
            out.push('\n');
        }
    }
    out
}

fn settings_in(root: &Path) -> Settings {
    let settings = Settings::default().rooted_at(root);
    fs::create_dir_all(settings.train_input.parent().unwrap()).unwrap();
    fs::write(&settings.train_input, raw_csv(&[0, 1, 2], true)).unwrap();
    fs::write(&settings.test_input, raw_csv(&[0, 2], false)).unwrap();
    settings
}

#[test]
fn train_then_test() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_in(dir.path());

    pipeline::run(Mode::Train, &settings).unwrap();
    let model = LinearModel::load(&settings.model_path).unwrap();
    assert!(model
        .feature_names()
        .iter()
        .any(|name| name == "Outlet_Type_Grocery Store"));

    pipeline::run(Mode::Test, &settings).unwrap();

    // The test file has no grocery store, its indicator still exists.
    let prepared = read_table(&settings.test_prepared).unwrap();
    let indicator = prepared.column("Outlet_Type_Grocery Store").unwrap();
    assert!(indicator.values.iter().all(|v| *v == Value::Int(0)));

    let predictions = read_table(&settings.predictions).unwrap();
    let mut expected: Vec<&str> = model.feature_names().iter().map(String::as_str).collect();
    expected.push(ITEM_OUTLET_SALES);
    assert_eq!(predictions.column_names(), expected);
    assert_eq!(predictions.n_rows(), 2 * ITEMS.len());
    for value in &predictions.column(ITEM_OUTLET_SALES).unwrap().values {
        let sales = value.as_f64().unwrap();
        assert!(sales.is_finite());
    }
}

#[test]
fn stages_exchange_files() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_in(dir.path());

    run_feature_engineering(
        &settings.train_input,
        &settings.train_prepared,
        &FeatureTransformer::new(),
    )
    .unwrap();
    let prepared = read_table(&settings.train_prepared).unwrap();
    assert_eq!(prepared.column_names().last(), Some(&ITEM_OUTLET_SALES));
    assert!(!prepared.has_column("Item_Identifier"));

    let model = run_training(&settings.train_prepared, &settings.model_path).unwrap();
    assert_eq!(LinearModel::load(&settings.model_path).unwrap(), model);

    // Predicting the training table itself.
    run_prediction(&settings.train_prepared, &settings.model_path, &settings.predictions).unwrap();
    let predictions = read_table(&settings.predictions).unwrap();
    assert_eq!(predictions.n_rows(), prepared.n_rows());
}

#[test]
fn unseen_outlet_type_fails_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_in(dir.path());
    pipeline::run(Mode::Train, &settings).unwrap();

    let test = raw_csv(&[0], false).replace("Supermarket Type1", "Supermarket Type2");
    fs::write(&settings.test_input, test).unwrap();

    let err = pipeline::run(Mode::Test, &settings).unwrap_err();
    match err {
        Error::Value { column, row, value } => {
            assert_eq!(column, "Outlet_Type");
            assert_eq!(row, 1);
            assert_eq!(value, "Supermarket Type2");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!settings.test_prepared.exists());
    assert!(!settings.predictions.exists());
}

#[test]
fn ragged_input_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_in(dir.path());
    let mut csv = raw_csv(&[0], true);
    csv.push_str("FDZ01,1.0\n");
    fs::write(&settings.train_input, csv).unwrap();

    let err = pipeline::run(Mode::Train, &settings).unwrap_err();
    assert!(matches!(err, Error::Parse { .. }), "unexpected error: {err}");
    assert!(!settings.train_prepared.exists());
}

#[test]
fn training_without_target_is_a_schema_error() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_in(dir.path());
    let prepared = dir.path().join("prepared.csv");
    fs::write(&prepared, "Item_Weight,Item_MRP\n1.5,2\n2.5,3\n").unwrap();

    let err = run_training(&prepared, &settings.model_path).unwrap_err();
    assert!(matches!(err, Error::Schema(_)));
    assert!(!settings.model_path.exists());
}
