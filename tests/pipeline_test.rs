// End-to-end: free text → pipeline → simulated registry → summary → export

use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use valid_guard::{
    classify, extract_records, render_csv, summarize, write_csv, ExportLayout, Filter, MatchKind,
    Pipeline, RecordStore, RegistryConfig, RegistryStatus, SimulatedRegistry,
};

const UPLOAD: &str = "\
Lista de clientes - 2024
MARIA SUELY 06819885253 08/07/1957
JOSE CARLOS   52998224725 15/03/1980
PEDRO ALVES 12345678900 01/01/1990
";

fn always_regular() -> RegistryConfig {
    RegistryConfig::builder()
        .delay_ms(200, 800)
        .thresholds(1.0, 1.0)
        .seed(7)
        .build()
}

fn pipeline(config: RegistryConfig) -> Pipeline {
    Pipeline::new(RecordStore::new(), Arc::new(SimulatedRegistry::new(config)))
}

#[test]
fn test_extraction_of_upload() {
    let candidates = extract_records(UPLOAD);

    let names: Vec<&str> = candidates.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["MARIA SUELY", "JOSE CARLOS", "PEDRO ALVES"]);
    assert!(candidates.iter().all(|c| c.match_kind == MatchKind::Strict));
    assert_eq!(
        candidates.iter().filter(|c| c.is_valid).count(),
        2,
        "only PEDRO ALVES carries a bad checksum"
    );
}

#[tokio::test(start_paused = true)]
async fn test_upload_resolves_every_check() {
    let pipeline = pipeline(always_regular());

    let submission = pipeline.process_text(UPLOAD).unwrap();
    assert_eq!(submission.record_ids().len(), 3);
    assert_eq!(submission.wait().await, 2);

    let snapshot = pipeline.store().snapshot();
    assert_eq!(pipeline.store().pending_count(), 0);

    let statuses: Vec<RegistryStatus> = snapshot.iter().map(|r| r.registry_status).collect();
    assert_eq!(
        statuses,
        vec![
            RegistryStatus::Regular,
            RegistryStatus::Regular,
            RegistryStatus::Error
        ]
    );

    let stats = summarize(&snapshot);
    assert_eq!(stats.total, 3);
    assert_eq!(stats.valid_count, 2);
    assert_eq!(stats.invalid_count, 1);
    assert_eq!(stats.regular_count, 2);
    assert_eq!(stats.valid_rate, "66.7%");
}

#[tokio::test(start_paused = true)]
async fn test_store_is_pending_until_latency_elapses() {
    let config = RegistryConfig::builder()
        .delay_ms(500, 500)
        .thresholds(1.0, 1.0)
        .build();
    let pipeline = pipeline(config);

    pipeline.process_text(UPLOAD).unwrap().detach();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(pipeline.store().pending_count(), 2);
    assert!(classify(&pipeline.store().snapshot(), Filter::Regular).is_empty());

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(pipeline.store().pending_count(), 0);
    assert_eq!(classify(&pipeline.store().snapshot(), Filter::Regular).len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_seeded_registry_only_yields_terminal_statuses() {
    let config = RegistryConfig::builder().seed(42).build();
    let pipeline = pipeline(config);

    let numbers = vec!["06819885253".to_string(); 25];
    pipeline.submit_id_numbers(numbers).unwrap().wait().await;

    for record in pipeline.store().snapshot() {
        assert!(
            matches!(
                record.registry_status,
                RegistryStatus::Regular | RegistryStatus::Suspended | RegistryStatus::Cancelled
            ),
            "unexpected status {:?}",
            record.registry_status
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_id_list_with_duplicates_and_noise() {
    let pipeline = pipeline(always_regular());

    let text = "cpfs: 068.198.852-53, 06819885253; 52998224725 e 000.000.000-00 \
                tel 1234 de novo 52998224725 nº06819885253";
    let submission = pipeline.process_id_list(text).unwrap();
    assert_eq!(submission.record_ids().len(), 4);
    submission.wait().await;

    // Punctuated and bare spellings are distinct entries, repeats are not
    let valid = classify(&pipeline.store().snapshot(), Filter::Valid);
    let formatted: Vec<&str> = valid.iter().map(|d| d.formatted_id_number.as_str()).collect();
    assert_eq!(
        formatted,
        vec!["068.198.852-53", "068.198.852-53", "529.982.247-25"]
    );
    assert_eq!(classify(&pipeline.store().snapshot(), Filter::Invalid).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_filtered_export_to_file() {
    let pipeline = pipeline(always_regular());
    pipeline.process_text(UPLOAD).unwrap().wait().await;

    let invalid = classify(&pipeline.store().snapshot(), Filter::Invalid);
    assert_eq!(
        render_csv(&invalid, ExportLayout::PersonRecord),
        "Original,Formatado,Valido,Regiao\n12345678900,12345678900,NAO,\"-\""
    );

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(ExportLayout::Registry.file_name());
    let regular = classify(&pipeline.store().snapshot(), Filter::Regular);
    write_csv(&path, &regular, ExportLayout::Registry).unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "CPF,Valido,Regiao,Status_Receita");
    assert!(lines[1..].iter().all(|l| l.ends_with(",REGULAR")));
}
