//! Static catalog of deployable Qt modules and the matching rules that
//! decide whether a library name or user-supplied token identifies one.

use std::path::Path;

use tracing::debug;

/// A named Qt feature unit the deployment engine knows how to detect.
///
/// `library_file_prefix` is compared with a trailing dot appended, so
/// `libQt5WebEngineCore.so.5` matches the webenginecore entry but never the
/// webengine one. `translation_file_prefix` names the `.qm` file family the
/// module pulls in, shared across modules (core, gui and widgets all map to
/// `qtbase`); modules without translations carry `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QtModule {
    pub name: &'static str,
    pub library_file_prefix: &'static str,
    pub translation_file_prefix: Option<&'static str>,
}

impl QtModule {
    const fn new(
        name: &'static str,
        library_file_prefix: &'static str,
        translation_file_prefix: Option<&'static str>,
    ) -> Self {
        Self {
            name,
            library_file_prefix,
            translation_file_prefix,
        }
    }
}

/// All known Qt modules, in deployment order.
///
/// Resolution iterates this table front to back, so the order here is the
/// order modules are deployed in.
pub const QT_MODULES: &[QtModule] = &[
    QtModule::new("3danimation", "libQt53DAnimation", None),
    QtModule::new("3dcore", "libQt53DCore", None),
    QtModule::new("3dextras", "libQt53DExtras", None),
    QtModule::new("3dinput", "libQt53DInput", None),
    QtModule::new("3dlogic", "libQt53DLogic", None),
    QtModule::new("3dquick", "libQt53DQuick", None),
    QtModule::new("3dquickextras", "libQt53DQuickExtras", None),
    QtModule::new("3dquickinput", "libQt53DQuickInput", None),
    QtModule::new("3dquickrender", "libQt53DQuickRender", None),
    QtModule::new("3drender", "libQt53DRender", None),
    QtModule::new("bluetooth", "libQt5Bluetooth", None),
    QtModule::new("clucene", "libQt5CLucene", Some("qt_help")),
    QtModule::new("concurrent", "libQt5Concurrent", Some("qtbase")),
    QtModule::new("core", "libQt5Core", Some("qtbase")),
    QtModule::new("dbus", "libQt5DBus", None),
    QtModule::new("declarative", "libQt5Declarative", Some("qtquick1")),
    QtModule::new("designer", "libQt5Designer", None),
    QtModule::new("designercomponents", "libQt5DesignerComponents", None),
    QtModule::new("gamepad", "libQt5Gamepad", None),
    QtModule::new("gui", "libQt5Gui", Some("qtbase")),
    QtModule::new("help", "libQt5Help", Some("qt_help")),
    QtModule::new("location", "libQt5Location", None),
    QtModule::new("multimedia", "libQt5Multimedia", Some("qtmultimedia")),
    QtModule::new(
        "multimediagsttools",
        "libQt5MultimediaGstTools",
        Some("qtmultimedia"),
    ),
    QtModule::new(
        "multimediaquick",
        "libQt5MultimediaQuick",
        Some("qtmultimedia"),
    ),
    QtModule::new(
        "multimediawidgets",
        "libQt5MultimediaWidgets",
        Some("qtmultimedia"),
    ),
    QtModule::new("network", "libQt5Network", Some("qtbase")),
    QtModule::new("nfc", "libQt5Nfc", None),
    QtModule::new("opengl", "libQt5OpenGL", None),
    QtModule::new("positioning", "libQt5Positioning", None),
    QtModule::new("printsupport", "libQt5PrintSupport", None),
    QtModule::new("qml", "libQt5Qml", Some("qtdeclarative")),
    QtModule::new("quick", "libQt5Quick", Some("qtdeclarative")),
    QtModule::new("quickcontrols2", "libQt5QuickControls2", None),
    QtModule::new("quickparticles", "libQt5QuickParticles", None),
    QtModule::new("quicktest", "libQt5QuickTest", None),
    QtModule::new("quickwidgets", "libQt5QuickWidgets", None),
    QtModule::new("remoteobjects", "libQt5RemoteObjects", None),
    QtModule::new("script", "libQt5Script", Some("qtscript")),
    QtModule::new("scripttools", "libQt5ScriptTools", Some("qtscript")),
    QtModule::new("sensors", "libQt5Sensors", None),
    QtModule::new("serialbus", "libQt5SerialBus", None),
    QtModule::new("serialport", "libQt5SerialPort", Some("qtserialport")),
    QtModule::new("sql", "libQt5Sql", Some("qtbase")),
    QtModule::new("sqlite", "libqsqlite", None),
    QtModule::new("svg", "libQt5Svg", None),
    QtModule::new("test", "libQt5Test", Some("qtbase")),
    QtModule::new("texttospeech", "libQt5TextToSpeech", None),
    QtModule::new("webchannel", "libQt5WebChannel", None),
    QtModule::new("webengine", "libQt5WebEngine", Some("qtwebengine")),
    QtModule::new("webenginecore", "libQt5WebEngineCore", Some("qtwebengine")),
    QtModule::new(
        "webenginewidgets",
        "libQt5WebEngineWidgets",
        Some("qtwebengine"),
    ),
    QtModule::new("websockets", "libQt5WebSockets", Some("qtwebsockets")),
    QtModule::new("webview", "libQt5WebView", None),
    QtModule::new("widgets", "libQt5Widgets", Some("qtbase")),
    QtModule::new("x11extras", "libQt5X11Extras", Some("qtx11extras")),
    QtModule::new("xcbqpa", "libQt5XcbQpa", None),
    QtModule::new("xml", "libQt5Xml", Some("qtbase")),
    QtModule::new("xmlpatterns", "libQt5XmlPatterns", Some("qtxmlpatterns")),
];

/// Looks up a catalog entry by its canonical name.
pub fn find_module(name: &str) -> Option<&'static QtModule> {
    QT_MODULES.iter().find(|module| module.name == name)
}

/// Decides whether `candidate` identifies `module`.
///
/// A candidate naming an existing regular file is reduced to its basename
/// first; a path that does not exist is matched verbatim, so a token
/// pointing at a not-yet-created file only ever hits the exact-name branch.
/// The match succeeds on a `<library_file_prefix>.` filename prefix or on
/// exact equality with the module name; there are no substring matches.
pub fn matches_module(candidate: &str, module: &QtModule) -> bool {
    let path = Path::new(candidate);
    let name = if path.is_file() {
        path.file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(candidate)
    } else {
        candidate
    };

    let prefix = [module.library_file_prefix, "."].concat();
    if name.starts_with(&prefix) {
        debug!(
            "{} matches library filename, found module: {}",
            name, module.name
        );
        return true;
    }

    if name == module.name {
        debug!("{} matches module name", module.name);
        return true;
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_filename_match() {
        let module = find_module("widgets").unwrap();
        assert!(matches_module("libQt5Widgets.so.5", module));
        assert!(matches_module("libQt5Widgets.so", module));
        assert!(!matches_module("libQt5WidgetsExtra.so.5", module));
    }

    #[test]
    fn test_name_match() {
        let module = find_module("sql").unwrap();
        assert!(matches_module("sql", module));
        assert!(!matches_module("sqldrivers", module));
    }

    #[test]
    fn test_prefix_needs_trailing_dot() {
        let webengine = find_module("webengine").unwrap();
        let webenginecore = find_module("webenginecore").unwrap();

        assert!(matches_module("libQt5WebEngineCore.so.5", webenginecore));
        assert!(!matches_module("libQt5WebEngineCore.so.5", webengine));
        assert!(matches_module("libQt5WebEngine.so.5", webengine));
        assert!(!matches_module("libQt5WebEngine.so.5", webenginecore));
    }

    #[test]
    fn test_empty_candidate_matches_nothing() {
        for module in QT_MODULES {
            assert!(!matches_module("", module));
        }
    }

    #[test]
    fn test_existing_path_reduced_to_basename() {
        let dir = tempfile::tempdir().unwrap();
        let library = dir.path().join("libQt5Svg.so.5");
        std::fs::write(&library, b"stub").unwrap();

        let module = find_module("svg").unwrap();
        assert!(matches_module(library.to_str().unwrap(), module));
    }

    #[test]
    fn test_missing_path_not_reduced() {
        let module = find_module("svg").unwrap();
        assert!(!matches_module("/nonexistent/libQt5Svg.so.5", module));
    }

    #[test]
    fn test_module_names_unique() {
        for (i, a) in QT_MODULES.iter().enumerate() {
            for b in &QT_MODULES[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }

    #[test]
    fn test_no_prefix_shadows_another() {
        // With the trailing dot appended, no module's prefix may swallow
        // library names belonging to a different module.
        for (i, a) in QT_MODULES.iter().enumerate() {
            for b in &QT_MODULES[i + 1..] {
                let a_dotted = format!("{}.", a.library_file_prefix);
                let b_dotted = format!("{}.", b.library_file_prefix);
                assert!(
                    !a_dotted.starts_with(&b_dotted) && !b_dotted.starts_with(&a_dotted),
                    "{} and {} shadow each other",
                    a.name,
                    b.name
                );
            }
        }
    }

    proptest! {
        #[test]
        fn prop_match_implies_prefix_or_name(candidate in "[A-Za-z0-9._]{0,40}") {
            for module in QT_MODULES {
                let matched = matches_module(&candidate, module);
                let prefix = format!("{}.", module.library_file_prefix);
                let expected = candidate.starts_with(&prefix) || candidate == module.name;
                prop_assert_eq!(matched, expected);
            }
        }
    }
}
