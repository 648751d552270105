//! The pipeline with payload collaborators, files and reports.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use mapstudio_foundation::{DiagnosticKind, ErrorKind, GameVariant, Result};
use mapstudio_pipeline::{
    ExportReport, ImportReport, PayloadSink, PayloadSource, Pipeline, PipelineConfig,
    dump_json_to_file, load_from_file, load_json_from_file, save_to_file,
};
use mapstudio_resolve::{ExportOptions, PlaceholderCache};
use mapstudio_schema::{ModelSubtype, PartSubtype, SubtypeRegistry};
use mapstudio_storage::{Model, PayloadHandle};

use crate::support::{init_tracing, minimal_map, name, record};

/// Mesh bytes keyed by model name.
#[derive(Default)]
struct MeshLibrary(HashMap<String, Vec<u8>>);

impl PayloadSource for MeshLibrary {
    fn load(&self, name: &str, _subtype: ModelSubtype) -> Result<Option<PayloadHandle>> {
        Ok(self.0.get(name).cloned().map(PayloadHandle::new))
    }
}

/// Records every write.
#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<(String, usize)>>>);

impl PayloadSink for Recorder {
    fn write(&self, model: &Model, path: &str) -> Result<()> {
        let size = model
            .payload
            .as_ref()
            .and_then(|p| p.downcast_ref::<Vec<u8>>())
            .map_or(0, Vec::len);
        self.0.lock().unwrap().push((path.to_string(), size));
        Ok(())
    }
}

fn two_models(variant: GameVariant) -> mapstudio_codec::FlatContainer {
    let mut container = minimal_map(variant);
    container.push(record(variant, ModelSubtype::MapPiece, "m_lost", &[]));
    container.push(record(
        variant,
        PartSubtype::MapPiece,
        "PieceB",
        &[("model", name("m_lost"))],
    ));
    container
}

fn temp_file(file: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("mapstudio_integration_{file}"))
}

#[test]
fn payloads_load_and_dirty_models_write_back() {
    init_tracing();
    let library = MeshLibrary(HashMap::from([("m_test".to_string(), vec![0u8; 12])]));
    let recorder = Recorder::default();
    let pipeline = Pipeline::new(PipelineConfig::default().with_payload_workers(2))
        .with_payload_source(library)
        .with_payload_sink(recorder.clone());

    let mut imported = pipeline
        .import_container(&two_models(GameVariant::DarkSouls1), &mut PlaceholderCache::new())
        .unwrap();
    assert_eq!(imported.payloads.loaded, 1);
    assert_eq!(imported.payloads.missing, 1);
    assert_eq!(imported.diagnostics.count_of(DiagnosticKind::MissingPayload), 1);

    let models = imported.store.models_mut();
    let test = models.find("m_test").unwrap();
    let lost = models.find("m_lost").unwrap();
    assert!(!models.get(test).unwrap().is_placeholder);
    assert!(models.get(lost).unwrap().is_placeholder);
    models.mark_dirty(test).unwrap();
    models.mark_dirty(lost).unwrap();

    let exported = pipeline
        .export(&imported.store, &ExportOptions::all())
        .unwrap();
    let expected = r"N:\FRPG\data\Model\map\m10_00_00_00\sib\m_test.sib";
    assert_eq!(exported.written_models, vec![expected.to_string()]);
    assert_eq!(
        *recorder.0.lock().unwrap(),
        vec![(expected.to_string(), 12)]
    );
}

#[test]
fn failed_export_writes_nothing() {
    let recorder = Recorder::default();
    let pipeline = Pipeline::new(PipelineConfig::strict().with_load_payloads(false))
        .with_payload_sink(recorder.clone());

    let variant = GameVariant::DarkSouls3;
    let mut container = two_models(variant);
    container.push(record(variant, ModelSubtype::Collision, "h0001", &[]));
    container.push(record(
        variant,
        PartSubtype::Collision,
        "h0001_0000",
        &[
            ("model", name("h0001")),
            ("play_region_id", mapstudio_foundation::FlatValue::I32(5)),
            ("stable_footing_flag", mapstudio_foundation::FlatValue::I32(5)),
        ],
    ));
    let mut imported = pipeline
        .import_container(&container, &mut PlaceholderCache::new())
        .unwrap();
    let models = imported.store.models_mut();
    let id = models.find("h0001").unwrap();
    models.mark_dirty(id).unwrap();

    let err = pipeline
        .export(&imported.store, &ExportOptions::all())
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::ExclusiveFields { .. }));
    assert!(recorder.0.lock().unwrap().is_empty());
}

#[test]
fn files_and_reports() {
    init_tracing();
    let registry = SubtypeRegistry::standard();
    let pipeline = Pipeline::new(PipelineConfig::offline().with_map_id("m10_01_00_00"));
    let binary = temp_file("files_and_reports.msb");
    let json = temp_file("files_and_reports.json");

    save_to_file(&two_models(GameVariant::Sekiro), registry, &binary).unwrap();
    let container = load_from_file(&binary, registry).unwrap();
    let imported = pipeline
        .import_container(&container, &mut PlaceholderCache::new())
        .unwrap();

    let report = ImportReport::new(&imported);
    assert_eq!(report.map_id, "m10_01_00_00");
    assert_eq!(report.counts.models, 2);
    assert_eq!(report.counts.parts, 2);
    assert_eq!(report.payloads_loaded, 0);
    let text = report.to_json().unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed["counts"]["parts"], 2);

    let exported = pipeline
        .export_container(&imported.store, &ExportOptions::all())
        .unwrap();
    assert_eq!(ExportReport::from_container(&exported).counts.total(), 4);

    dump_json_to_file(&exported.container, registry, &json).unwrap();
    let reloaded = load_json_from_file(&json, registry).unwrap();
    assert_eq!(reloaded, exported.container);
    assert_eq!(reloaded.map_id, "m10_01_00_00");

    let _ = std::fs::remove_file(&binary);
    let _ = std::fs::remove_file(&json);
}

#[test]
fn failing_source_aborts_the_import() {
    struct Broken;
    impl PayloadSource for Broken {
        fn load(&self, name: &str, _subtype: ModelSubtype) -> Result<Option<PayloadHandle>> {
            Err(mapstudio_foundation::Error::new(ErrorKind::Payload(format!(
                "archive for {name} is unreadable"
            ))))
        }
    }

    let pipeline = Pipeline::new(PipelineConfig::default()).with_payload_source(Broken);
    let err = pipeline
        .import_container(&two_models(GameVariant::EldenRing), &mut PlaceholderCache::new())
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Aggregate(ref errors) if errors.len() == 2));
}
