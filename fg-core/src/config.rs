//! Debug-override config (spec.md §9): an optional side-channel INI file
//! that flips diagnostic switches without touching the parameter bag. Absent
//! entirely in normal operation — every field defaults to `false` when the
//! file is missing or a key isn't present.

use std::path::Path;

use ini::Ini;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DebugConfig {
    pub enable_debug_overlay: bool,
    pub enable_debug_tear_lines: bool,
    pub enable_interpolated_frames_only: bool,
}

impl DebugConfig {
    /// Loads the `[Debug]` section from `path`. Any failure to open or
    /// parse the file is treated the same as the file not existing — this
    /// is a convenience for internal diagnostics, never a hard dependency
    /// (spec.md §9).
    pub fn load(path: &Path) -> Self {
        let Ok(ini) = Ini::load_from_file(path) else {
            return Self::default();
        };
        let flag = |key: &str| {
            ini.section(Some("Debug"))
                .and_then(|section| section.get(key))
                .map(|value| value.eq_ignore_ascii_case("true") || value == "1")
                .unwrap_or(false)
        };
        Self {
            enable_debug_overlay: flag("EnableDebugOverlay"),
            enable_debug_tear_lines: flag("EnableDebugTearLines"),
            enable_interpolated_frames_only: flag("EnableInterpolatedFramesOnly"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    struct ScratchIniFile {
        path: std::path::PathBuf,
    }

    impl ScratchIniFile {
        fn new(name: &str, contents: &str) -> Self {
            let path = std::env::temp_dir().join(name);
            let mut file = std::fs::File::create(&path).expect("create scratch ini");
            file.write_all(contents.as_bytes()).expect("write scratch ini");
            Self { path }
        }
    }

    impl Drop for ScratchIniFile {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.path);
        }
    }

    #[test]
    fn missing_file_yields_all_false() {
        let config = DebugConfig::load(Path::new("/nonexistent/dlssg_to_fsr3.ini"));
        assert_eq!(config, DebugConfig::default());
    }

    #[test]
    fn true_and_1_both_enable_a_flag() {
        let scratch = ScratchIniFile::new(
            "fg-core-config-test-enabled.ini",
            "[Debug]\nEnableDebugOverlay=true\nEnableDebugTearLines=1\n",
        );
        let config = DebugConfig::load(&scratch.path);
        assert!(config.enable_debug_overlay);
        assert!(config.enable_debug_tear_lines);
        assert!(!config.enable_interpolated_frames_only);
    }

    #[test]
    fn unrecognized_value_is_treated_as_disabled() {
        let scratch = ScratchIniFile::new(
            "fg-core-config-test-garbage.ini",
            "[Debug]\nEnableDebugOverlay=maybe\n",
        );
        let config = DebugConfig::load(&scratch.path);
        assert!(!config.enable_debug_overlay);
    }
}
