use kiln_artifact::{Version, VersionRange};
use kiln_scope::prelude::*;
use kiln_scope::ScoperOptions;
use pretty_assertions::assert_eq;

fn v(s: &str) -> Version {
    s.parse().unwrap()
}

fn pair_exporting_p() -> Vec<ModuleDescriptor> {
    vec![
        ModuleDescriptor::new("first", v("1.0")).export(ExportedPackage::new("p", v("1.0"))),
        ModuleDescriptor::new("second", v("1.0")).export(ExportedPackage::new("p", v("2.0"))),
    ]
}

#[test]
fn test_duplicate_export_names_every_exporter() {
    let mut descriptors = pair_exporting_p();
    descriptors.push(ModuleDescriptor::new("bystander", v("1.0")));

    let err = Scoper::new(&mut descriptors, "app-1").scope().unwrap_err();
    match err {
        ScopingError::DuplicateExport {
            scope,
            package,
            exporters,
        } => {
            assert_eq!(scope, "app-1");
            assert_eq!(package, "p");
            assert_eq!(exporters, vec!["first".to_string(), "second".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_duplicate_export_allowed_keeps_first_version() {
    let mut descriptors = pair_exporting_p();

    let scope = Scoper::new(&mut descriptors, "app-1")
        .allow_duplicate_exports(true)
        .scope()
        .unwrap();

    assert_eq!(scope.export_version("p"), Some(&v("1.0")));
    assert_eq!(scope.exports().len(), 1);
    // Both exports are still tagged
    for descriptor in &descriptors {
        assert_eq!(descriptor.exports[0].attributes["module_scope"], "app-1");
    }
}

#[test]
fn test_import_outside_range_stays_unscoped() {
    let mut descriptors = vec![
        ModuleDescriptor::new("exporter", v("1.0")).export(ExportedPackage::new("p", v("1.0"))),
        ModuleDescriptor::new("importer", v("1.0"))
            .import(ImportedPackage::new("p", "[2.0,3.0)".parse().unwrap()).from_bundle("exporter")),
    ];

    let scope = Scoper::new(&mut descriptors, "app-1").scope().unwrap();

    let import = &descriptors[1].imports[0];
    assert!(import.attributes.is_empty());
    assert_eq!(import.bundle_symbolic_name.as_deref(), Some("exporter"));
    assert!(matches!(
        scope.warnings(),
        [ScopingWarning::ImportOutsideScope { package, bundle, .. }]
            if package == "p" && bundle == "importer"
    ));
}

#[test]
fn test_referents_pass_completes_before_references() {
    // The importer precedes the exporter; its import must still be scoped.
    let mut descriptors = vec![
        ModuleDescriptor::new("importer", v("1.0"))
            .import(ImportedPackage::new("p", VersionRange::unbounded()).from_bundle("exporter"))
            .require_bundle(BundleReference::new("exporter", VersionRange::unbounded())),
        ModuleDescriptor::new("exporter", v("1.0")).export(ExportedPackage::new("p", v("1.0"))),
    ];

    let scope = Scoper::new(&mut descriptors, "app-1").scope().unwrap();

    let importer = &descriptors[0];
    assert_eq!(importer.symbolic_name, "app-1-importer");
    assert_eq!(importer.imports[0].attributes["module_scope"], "app-1");
    assert_eq!(
        importer.imports[0].bundle_symbolic_name.as_deref(),
        Some("app-1-exporter")
    );
    assert_eq!(importer.required_bundles[0].symbolic_name, "app-1-exporter");
    assert!(scope.warnings().is_empty());
    assert_eq!(
        scope.bundles().keys().cloned().collect::<Vec<_>>(),
        vec!["importer".to_string(), "exporter".to_string()]
    );
}

#[test]
fn test_unsupported_format_aborts_whole_operation() {
    let mut descriptors = vec![
        ModuleDescriptor::new("modern", v("1.0")).export(ExportedPackage::new("p", v("1.0"))),
        ModuleDescriptor::new("legacy", v("1.0")).with_manifest_version(1),
        ModuleDescriptor::new("consumer", v("1.0"))
            .import(ImportedPackage::new("p", VersionRange::unbounded())),
    ];

    let err = Scoper::new(&mut descriptors, "app-1").scope().unwrap_err();
    assert!(matches!(
        err,
        ScopingError::UnsupportedManifestVersion { ref symbolic_name, found: 1, minimum: 2 }
            if symbolic_name == "legacy"
    ));
    // References pass never ran
    assert!(descriptors[2].imports[0].attributes.is_empty());
}

#[test]
fn test_custom_options() {
    let mut descriptors = vec![ModuleDescriptor::new("old", v("1.0"))
        .with_manifest_version(1)
        .export(ExportedPackage::new("p", v("1.0")))];

    let options = ScoperOptions {
        minimum_manifest_version: 1,
        scope_attribute: "application".to_string(),
        ..ScoperOptions::default()
    };
    Scoper::new(&mut descriptors, "web-2.0")
        .with_options(options)
        .scope()
        .unwrap();

    let export = &descriptors[0].exports[0];
    assert_eq!(export.attributes["application"], "web-2.0");
    assert!(export.mandatory.contains("application"));
}
