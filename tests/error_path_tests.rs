//! Configuration-error scenarios: each one must surface its own error kind
//! before any deployment work happens.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use qtdeploy::deploy::{self, DeployError, DeployOptions};
use qtdeploy::qt::QmakeError;

fn touch(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, b"stub").unwrap();
}

fn write_qmake(path: &Path, body: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, format!("#!/bin/sh\n{body}")).unwrap();
    let mut permissions = fs::metadata(path).unwrap().permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(path, permissions).unwrap();
}

/// Stub qmake answering a full query for an installation under `root`.
/// The directories themselves are only created for those names listed in
/// `dirs`, so tests can leave parts of the installation missing.
fn fake_qt_installation(root: &Path, dirs: &[&str]) -> PathBuf {
    for dir in dirs {
        fs::create_dir_all(root.join(dir)).unwrap();
    }
    let qmake = root.join("bin/qmake");
    let root = root.display();
    write_qmake(
        &qmake,
        &format!(
            "echo 'QT_INSTALL_PLUGINS:{root}/plugins'\n\
             echo 'QT_INSTALL_LIBEXECS:{root}/libexec'\n\
             echo 'QT_INSTALL_DATA:{root}'\n\
             echo 'QT_INSTALL_TRANSLATIONS:{root}/translations'\n\
             echo 'QT_INSTALL_BINS:{root}/bin'\n\
             echo 'QT_INSTALL_LIBS:{root}/lib'\n\
             echo 'QT_INSTALL_QML:{root}/qml'\n"
        ),
    );
    qmake
}

fn options(appdir: &Path, qmake: &Path) -> DeployOptions {
    DeployOptions {
        appdir: appdir.to_path_buf(),
        qmake_override: Some(qmake.to_path_buf()),
        ..DeployOptions::default()
    }
}

#[test]
fn test_empty_bundle_has_nothing_to_deploy() {
    let qt = tempfile::tempdir().unwrap();
    let bundle = tempfile::tempdir().unwrap();
    let qmake = fake_qt_installation(qt.path(), &["plugins", "translations"]);

    let result = deploy::run(&options(bundle.path(), &qmake));
    assert!(matches!(result, Err(DeployError::NoModules)));
}

#[test]
fn test_unknown_tokens_have_nothing_to_deploy() {
    let qt = tempfile::tempdir().unwrap();
    let bundle = tempfile::tempdir().unwrap();
    let qmake = fake_qt_installation(qt.path(), &["plugins", "translations"]);

    let mut options = options(bundle.path(), &qmake);
    options.extra_plugins = vec!["not-a-module".to_string()];
    assert!(matches!(
        deploy::run(&options),
        Err(DeployError::NoModules)
    ));
}

#[test]
fn test_missing_qmake_override_is_fatal() {
    let bundle = tempfile::tempdir().unwrap();

    let result = deploy::run(&options(bundle.path(), Path::new("/nonexistent/qmake")));
    match result {
        Err(DeployError::Qmake(QmakeError::Missing { .. })) => {}
        other => panic!("expected missing qmake, got {other:?}"),
    }
}

#[test]
fn test_failed_query_is_fatal() {
    let qt = tempfile::tempdir().unwrap();
    let bundle = tempfile::tempdir().unwrap();

    let qmake = qt.path().join("bin/qmake");
    write_qmake(&qmake, "echo 'could not find a Qt installation' >&2\nexit 1\n");

    match deploy::run(&options(bundle.path(), &qmake)) {
        Err(DeployError::Qmake(QmakeError::QueryFailed { stderr })) => {
            assert!(stderr.contains("could not find"));
        }
        other => panic!("expected failed query, got {other:?}"),
    }
}

#[test]
fn test_empty_query_is_fatal() {
    let qt = tempfile::tempdir().unwrap();
    let bundle = tempfile::tempdir().unwrap();

    let qmake = qt.path().join("bin/qmake");
    write_qmake(&qmake, "true\n");

    assert!(matches!(
        deploy::run(&options(bundle.path(), &qmake)),
        Err(DeployError::Qmake(QmakeError::EmptyQuery))
    ));
}

#[test]
fn test_partial_query_names_the_missing_key() {
    let qt = tempfile::tempdir().unwrap();
    let bundle = tempfile::tempdir().unwrap();

    let qmake = qt.path().join("bin/qmake");
    write_qmake(
        &qmake,
        "echo 'QT_INSTALL_PLUGINS:/opt/qt/plugins'\necho 'QT_INSTALL_LIBEXECS:/opt/qt/libexec'\n",
    );

    match deploy::run(&options(bundle.path(), &qmake)) {
        Err(DeployError::Qmake(QmakeError::MissingKey { key })) => {
            assert_eq!(key, "QT_INSTALL_DATA");
        }
        other => panic!("expected missing key, got {other:?}"),
    }
}

#[test]
fn test_missing_translations_directory_is_fatal() {
    let qt = tempfile::tempdir().unwrap();
    let bundle = tempfile::tempdir().unwrap();
    touch(&bundle.path().join("usr/lib/libQt5Widgets.so.5"));

    // Full query, but the translations directory was never created.
    let qmake = fake_qt_installation(qt.path(), &["plugins", "lib", "qml"]);

    assert!(matches!(
        deploy::run(&options(bundle.path(), &qmake)),
        Err(DeployError::Translations { .. })
    ));
}
