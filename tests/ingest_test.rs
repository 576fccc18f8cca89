//! End-to-end flow: build a package archive in memory, ingest and
//! validate it, persist its dependency links, and resolve them back
//! out the way the API layer would.

use modidx::manifest::{DependencyImportance, ModManifest};
use modidx::resolve::{ResolveFilters, create_download_link, resolve, resolve_supersedes};
use modidx::store::{MemoryStore, Platform, VersionRecord, VersionStore};
use semver::Version;
use std::io::{Cursor, Write};
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::FileOptions;

fn build_archive(files: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options: FileOptions<()> =
        FileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, content) in files {
        zip.start_file(*name, options).unwrap();
        zip.write_all(content).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

fn logo_png(edge: u32) -> Vec<u8> {
    let img = image::DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
        edge,
        edge,
        image::Rgba([10, 200, 90, 255]),
    ));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

fn mod_json() -> Vec<u8> {
    serde_json::json!({
        "loader": "3.0.0",
        "id": "dev.mod",
        "name": "Test Mod",
        "version": "v1.2.0",
        "developers": ["dev", "friend"],
        "description": "a mod",
        "early-load": true,
        "engine": {"win": "2.206", "mac": "2.206"},
        "dependencies": {
            "lib.api": ">=1.0.0",
            "lib.extras": {"version": "*", "importance": "suggested"}
        },
        "incompatibilities": [
            {"id": "old.mod", "version": "*", "importance": "superseded"}
        ],
        "links": {"source": "https://github.com/dev/mod"}
    })
    .to_string()
    .into_bytes()
}

fn record(id: i64, mod_id: &str, version: &str) -> VersionRecord {
    VersionRecord {
        id,
        mod_id: mod_id.to_string(),
        version: Version::parse(version).unwrap(),
        platform: Platform::Windows,
        engine: "2.206".to_string(),
        loader: Version::parse("3.0.0").unwrap(),
    }
}

#[tokio::test]
async fn ingest_persist_and_resolve_round_trip() {
    let archive = build_archive(&[
        ("mod.json", mod_json()),
        ("mod.dll", b"MZ...".to_vec()),
        ("logo.png", logo_png(400)),
        ("about.md", b"# Test Mod".to_vec()),
    ]);

    // Ingest.
    let manifest =
        ModManifest::from_archive(&archive, "https://api.example.org/", true, 250).unwrap();
    manifest.validate().unwrap();

    assert_eq!(manifest.version, "1.2.0");
    assert!(manifest.windows);
    assert!(manifest.early_load);
    assert_eq!(manifest.download_url, "https://api.example.org");
    assert_eq!(manifest.about.as_deref(), Some("# Test Mod"));
    // Oversized logo was normalized on the way in.
    let logo = image::load_from_memory(&manifest.logo).unwrap();
    assert_eq!((logo.width(), logo.height()), (336, 336));

    assert_eq!(manifest.dependencies.len(), 2);
    assert_eq!(manifest.dependencies[0].dependency_id, "lib.api");
    assert_eq!(
        manifest.dependencies[1].importance,
        DependencyImportance::Suggested
    );

    // Persist: this version becomes id 1 in the store.
    let store = MemoryStore::new();
    store.insert_version(record(1, "dev.mod", "1.2.0"));
    store.insert_version(record(10, "lib.api", "1.0.0"));
    store.insert_version(record(11, "lib.api", "1.4.0"));
    store.insert_version(record(20, "lib.extras", "0.3.0"));
    store
        .replace_links(1, &manifest.dependencies, &manifest.incompatibilities)
        .await
        .unwrap();

    // Resolve one hop, unfiltered.
    let resolved = resolve(&store, &[1], &ResolveFilters::none())
        .await
        .unwrap();
    let edges = &resolved[&1];
    assert_eq!(edges.dependencies.len(), 2);
    assert_eq!(edges.dependencies[0].target_version_id, 11);
    assert_eq!(edges.dependencies[1].target_version_id, 20);
    // The superseded target has no stored version, so no edge for it.
    assert!(edges.incompatibilities.is_empty());

    let response = edges.dependencies[0].to_response();
    assert_eq!(response.mod_id, "lib.api");
    assert_eq!(response.version, ">=1.0.0");

    // Supersede lookup from the other direction: dev.mod 1.2.0
    // replaces old.mod.
    let replacements = resolve_supersedes(
        &store,
        &["old.mod".to_string()],
        &ResolveFilters::none(),
    )
    .await
    .unwrap();
    let replacement = &replacements["old.mod"];
    assert_eq!(replacement.mod_id, "dev.mod");
    assert_eq!(replacement.version_id, 1);
    assert_eq!(
        create_download_link("https://api.example.org", &replacement.mod_id, &replacement.version),
        "https://api.example.org/v1/mods/dev.mod/versions/1.2.0/download"
    );
}

#[tokio::test]
async fn reingesting_a_version_replaces_its_links_atomically() {
    let first = build_archive(&[(
        "mod.json",
        serde_json::json!({
            "id": "dev.mod",
            "name": "Mod",
            "version": "1.0.0",
            "developer": "dev",
            "dependencies": {"lib.api": "*"}
        })
        .to_string()
        .into_bytes(),
    )]);
    let second = build_archive(&[(
        "mod.json",
        serde_json::json!({
            "id": "dev.mod",
            "name": "Mod",
            "version": "1.0.0",
            "developer": "dev",
            "dependencies": {"lib.other": "*"}
        })
        .to_string()
        .into_bytes(),
    )]);

    let store = MemoryStore::new();
    store.insert_version(record(1, "dev.mod", "1.0.0"));
    store.insert_version(record(10, "lib.api", "1.0.0"));
    store.insert_version(record(20, "lib.other", "2.0.0"));

    for archive in [&first, &second] {
        let manifest = ModManifest::from_archive(archive, "https://host", false, 250).unwrap();
        manifest.validate().unwrap();
        store
            .replace_links(1, &manifest.dependencies, &manifest.incompatibilities)
            .await
            .unwrap();
    }

    let resolved = resolve(&store, &[1], &ResolveFilters::none())
        .await
        .unwrap();
    let edges = &resolved[&1];
    assert_eq!(edges.dependencies.len(), 1);
    assert_eq!(edges.dependencies[0].mod_id, "lib.other");
}

#[test]
fn rejected_archives_never_yield_a_manifest() {
    // Size cap.
    let err = ModManifest::from_archive(&vec![0u8; 2_000_001], "url", false, 2).unwrap_err();
    assert_eq!(err.kind(), "SizeLimitExceeded");

    // No manifest entry.
    let archive = build_archive(&[("readme.md", b"hello".to_vec())]);
    let err = ModManifest::from_archive(&archive, "url", false, 2).unwrap_err();
    assert_eq!(err.kind(), "MissingManifest");

    // Unparseable dependency constraint.
    let archive = build_archive(&[(
        "mod.json",
        serde_json::json!({
            "id": "dev.mod",
            "name": "Mod",
            "version": "1.0.0",
            "developer": "dev",
            "dependencies": {"a.b": "not-a-version"}
        })
        .to_string()
        .into_bytes(),
    )]);
    let err = ModManifest::from_archive(&archive, "url", false, 2).unwrap_err();
    assert_eq!(err.kind(), "InvalidVersionString");

    // Manifest parses but fails validation.
    let archive = build_archive(&[(
        "mod.json",
        serde_json::json!({"id": "Dev.Mod", "name": "Mod", "version": "1.0.0", "developer": "dev"})
            .to_string()
            .into_bytes(),
    )]);
    let manifest = ModManifest::from_archive(&archive, "url", false, 2).unwrap();
    assert_eq!(manifest.validate().unwrap_err().kind(), "BadRequest");
}
