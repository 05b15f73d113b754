use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use bzip2::write::BzEncoder;
use bzip2::Compression;
use serde_json::{json, Value};
use tempfile::TempDir;

use htrc_client::{pairtree, ArchiveKind, Error, FeatureProvider, ProviderConfig};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Writes a bzip2-compressed archive document at its pairtree location.
fn write_archive(root: &Path, volume_id: &str, kind: ArchiveKind, doc: &Value) -> PathBuf {
    let (source, object_id) = volume_id.split_once('.').unwrap();
    let clean = pairtree::clean_id(object_id);
    let dir = root
        .join(kind.as_str())
        .join(source)
        .join(pairtree::PAIRTREE_ROOT)
        .join(pairtree::to_ppath(object_id).unwrap())
        .join(&clean);
    fs::create_dir_all(&dir).unwrap();

    let file = dir.join(format!("{source}.{clean}.{}.json.bz2", kind.as_str()));
    let mut encoder = BzEncoder::new(File::create(&file).unwrap(), Compression::default());
    serde_json::to_writer(&mut encoder, doc).unwrap();
    encoder.finish().unwrap();
    file
}

fn basic_doc() -> Value {
    json!({
        "metadata": {
            "schemaVersion": "1.3",
            "title": "The Test Volume"
        },
        "features": {
            "schemaVersion": "2.0",
            "pageCount": 2,
            "pages": [
                {
                    "seq": "00000001",
                    "dateCreated": "20150403",
                    "tokenCount": 6,
                    "lineCount": 2,
                    "body": {
                        "tokenPosCount": {
                            "the": {"DT": 3},
                            "run": {"NN": 1, "VB": 2}
                        }
                    }
                },
                {
                    "seq": "00000002",
                    "dateCreated": "20150403",
                    "tokenCount": 0,
                    "lineCount": 0,
                    "body": {"tokenPosCount": {}}
                }
            ]
        }
    })
}

fn setup() -> (TempDir, FeatureProvider) {
    init_tracing();
    let root = TempDir::new().unwrap();
    let provider = FeatureProvider::new(root.path()).unwrap();
    (root, provider)
}

#[test]
fn reads_basic_volume() {
    let (root, provider) = setup();
    write_archive(root.path(), "hvd.ah3d1a", ArchiveKind::Basic, &basic_doc());

    let volume = provider.extracted_features("hvd.ah3d1a").unwrap();
    assert_eq!(volume.volume_id(), "hvd.ah3d1a");
    assert!(volume.has_basic());
    assert!(!volume.has_advanced());

    assert_eq!(volume.title().unwrap(), "The Test Volume");
    assert_eq!(volume.page_count().unwrap(), 2);
    assert_eq!(volume.metadata().schema_version().unwrap(), "1.3");
    assert_eq!(volume.metadata().title().unwrap(), "The Test Volume");

    let page = volume.page(0);
    assert_eq!(page.seq().unwrap(), "00000001");
    assert_eq!(page.date_created().unwrap(), "20150403");
    assert_eq!(page.token_count().unwrap(), 6);
    assert_eq!(page.line_count().unwrap(), 2);

    volume.close();
    provider.close();
}

#[test]
fn reads_part_of_speech_data() {
    let (root, provider) = setup();
    write_archive(root.path(), "hvd.ah3d1a", ArchiveKind::Basic, &basic_doc());

    let volume = provider.extracted_features("hvd.ah3d1a").unwrap();
    let body = volume.page(0).body_data();
    assert!(body.is_body());
    assert!(!body.is_header());

    let tokens = body.tokens().unwrap();
    assert_eq!(tokens.len(), 2);
    assert!(tokens.contains("the"));
    assert!(tokens.contains("run"));

    let counts = body.pos_count("run").unwrap();
    assert_eq!(counts.get("NN"), Some(&1));
    assert_eq!(counts.get("VB"), Some(&2));
    assert_eq!(body.count("run").unwrap(), 3);

    // Unknown tokens are a valid query, not an error.
    assert!(body.pos_count("absent").unwrap().is_empty());
    assert_eq!(body.count("absent").unwrap(), 0);

    // The fixture has no header section at all.
    let header = volume.page(0).header_data();
    assert!(matches!(header.tokens(), Err(Error::NoSectionData(_))));
}

#[test]
fn page_index_is_validated_lazily() {
    let (root, provider) = setup();
    write_archive(root.path(), "hvd.ah3d1a", ArchiveKind::Basic, &basic_doc());

    let volume = provider.extracted_features("hvd.ah3d1a").unwrap();
    // Construction never checks bounds.
    let page = volume.page(9);
    assert_eq!(page.index(), 9);
    assert!(matches!(
        page.seq(),
        Err(Error::IndexOutOfRange {
            index: 9,
            page_count: 2
        })
    ));
}

#[test]
fn concurrent_requests_share_one_document() {
    let (root, provider) = setup();
    write_archive(root.path(), "hvd.ah3d1a", ArchiveKind::Basic, &basic_doc());

    let documents: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| s.spawn(|| provider.extracted_features("hvd.ah3d1a").unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for doc in &documents[1..] {
        assert!(Arc::ptr_eq(&documents[0], doc));
    }
}

#[test]
fn volume_without_archives_reports_no_data() {
    let (_root, provider) = setup();

    let volume = provider.extracted_features("hvd.missing1").unwrap();
    assert_eq!(volume.volume_id(), "hvd.missing1");
    assert!(!volume.has_basic());
    assert!(!volume.has_advanced());
    assert!(matches!(
        volume.title(),
        Err(Error::NoDataAvailable { .. })
    ));
    assert!(matches!(
        volume.page_count(),
        Err(Error::NoDataAvailable { .. })
    ));
    assert!(matches!(
        volume.page(0).seq(),
        Err(Error::DataUnavailable {
            kind: ArchiveKind::Basic,
            ..
        })
    ));
}

#[test]
fn advanced_only_volume_falls_back_for_metadata() {
    let (root, provider) = setup();
    write_archive(
        root.path(),
        "hvd.ah3d1a",
        ArchiveKind::Advanced,
        &basic_doc(),
    );

    let volume = provider.extracted_features("hvd.ah3d1a").unwrap();
    assert!(!volume.has_basic());
    assert!(volume.has_advanced());

    // Metadata reads fall back to the advanced archive.
    assert_eq!(volume.title().unwrap(), "The Test Volume");
    // Basic-only accessors still report the missing kind.
    assert!(matches!(
        volume.archive_data(ArchiveKind::Basic),
        Err(Error::DataUnavailable {
            kind: ArchiveKind::Basic,
            ..
        })
    ));
}

#[test]
fn schema_mismatch_fails_and_is_cached() {
    let (root, provider) = setup();
    let mut doc = basic_doc();
    doc["features"]["schemaVersion"] = json!("1.0");
    let file = write_archive(root.path(), "hvd.ah3d1a", ArchiveKind::Basic, &doc);

    let volume = provider.extracted_features("hvd.ah3d1a").unwrap();
    match volume.title() {
        Err(Error::LoadFailed { source, .. }) => {
            assert!(matches!(
                *source,
                Error::SchemaVersionMismatch {
                    expected: "2.0",
                    ..
                }
            ));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    // Deleting the file proves repeat accessors reuse the cached failure
    // instead of re-reading the archive.
    fs::remove_file(&file).unwrap();
    assert!(matches!(volume.title(), Err(Error::LoadFailed { .. })));
}

#[test]
fn corrupt_archive_surfaces_parse_failure() {
    let (root, provider) = setup();
    let file = write_archive(root.path(), "hvd.ah3d1a", ArchiveKind::Basic, &basic_doc());
    fs::write(&file, b"not bzip2 at all").unwrap();

    let volume = provider.extracted_features("hvd.ah3d1a").unwrap();
    assert!(matches!(volume.title(), Err(Error::LoadFailed { .. })));
}

#[test]
fn closed_document_is_deregistered() {
    let (root, provider) = setup();
    write_archive(root.path(), "hvd.ah3d1a", ArchiveKind::Basic, &basic_doc());

    let first = provider.extracted_features("hvd.ah3d1a").unwrap();
    first.close();
    let second = provider.extracted_features("hvd.ah3d1a").unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
}

#[test]
fn disposed_provider_rejects_requests() {
    let (root, provider) = setup();
    write_archive(root.path(), "hvd.ah3d1a", ArchiveKind::Basic, &basic_doc());

    let volume = provider.extracted_features("hvd.ah3d1a").unwrap();
    provider.close();
    // Idempotent.
    provider.close();

    assert!(matches!(
        provider.extracted_features("hvd.ah3d1a"),
        Err(Error::ProviderDisposed)
    ));

    // A document obtained before disposal settles promptly: either the
    // load finished first or it observes the interruption; it never
    // hangs out the full bounded wait.
    match volume.title() {
        Ok(title) => assert_eq!(title, "The Test Volume"),
        Err(Error::LoadInterrupted { .. }) => {}
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn accessors_after_disposal_use_short_timeout() {
    let (root, _) = setup();
    write_archive(root.path(), "hvd.ah3d1a", ArchiveKind::Basic, &basic_doc());

    let provider = FeatureProvider::with_config(
        root.path(),
        ProviderConfig {
            load_timeout: Duration::from_secs(5),
        },
    )
    .unwrap();
    let volume = provider.extracted_features("hvd.ah3d1a").unwrap();
    provider.close();

    let started = std::time::Instant::now();
    let _ = volume.title();
    // Shutdown joins the worker, so every task has settled by now and the
    // accessor must not block anywhere near the bounded wait.
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn volume_ids_requiring_cleaning_are_located() {
    let (root, provider) = setup();
    let volume_id = "uc1.ark:/13030/xt12t3";
    write_archive(root.path(), volume_id, ArchiveKind::Basic, &basic_doc());

    let volume = provider.extracted_features(volume_id).unwrap();
    assert_eq!(volume.title().unwrap(), "The Test Volume");
}

#[test]
fn malformed_volume_id_is_rejected() {
    let (_root, provider) = setup();
    assert!(matches!(
        provider.extracted_features("no-separator"),
        Err(Error::InvalidArgument(_))
    ));
}
