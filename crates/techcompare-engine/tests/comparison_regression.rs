use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Deserialize;
use techcompare_engine::{
    shared_catalog, ComparisonOrchestrator, PersistentCatalogStore, UserConstraints,
};

#[derive(Debug, Deserialize)]
struct Case {
    name: String,
    catalog: serde_json::Value,
    request: Vec<String>,
    constraints: UserConstraints,
    expected: Expected,
}

#[derive(Debug, Deserialize)]
struct Expected {
    overall: BTreeMap<String, f64>,
    ranking: Vec<String>,
}

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("data")
        .join("fixtures")
        .join("comparison_cases.json")
}

#[tokio::test]
async fn fixture_cases_pass() {
    let fixture = fixture_path();
    let content = fs::read_to_string(&fixture)
        .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", fixture.display()));
    let cases: Vec<Case> = serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", fixture.display()));
    assert!(!cases.is_empty());

    for (index, case) in cases.into_iter().enumerate() {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let db = std::env::temp_dir().join(format!("techcompare-regression-{ts}-{index}.json"));
        fs::write(&db, serde_json::to_vec_pretty(&case.catalog).expect("encode catalog"))
            .expect("write catalog");

        let store = PersistentCatalogStore::open(&db).expect("open catalog");
        let orchestrator = ComparisonOrchestrator::new(shared_catalog(store));
        let result = orchestrator
            .generate_comparison_by_names(&case.request, case.constraints.clone())
            .await
            .unwrap_or_else(|e| panic!("case {} failed: {e}", case.name));

        for score in &result.technology_scores {
            let expected = case
                .expected
                .overall
                .get(&score.technology.name)
                .unwrap_or_else(|| {
                    panic!(
                        "case {}: no expectation for {}",
                        case.name, score.technology.name
                    )
                });
            assert!(
                (score.overall_score - expected).abs() < 0.01,
                "case {}: {} scored {} (expected {expected})",
                case.name,
                score.technology.name,
                score.overall_score
            );
        }
        assert_eq!(result.ranking(), case.expected.ranking, "case {} ranking", case.name);
        assert_eq!(result.constraints, case.constraints, "case {} constraints", case.name);
        assert!(result.summary.is_none());

        let _ = fs::remove_file(db);
    }
}
