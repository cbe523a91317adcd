mod types;

pub use types::*;

use anyhow::{Context, Result};
use configparser::ini::Ini;
use langfilter_mkv::probe::UNDETERMINED_LANGUAGE;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Config locations, highest priority first.
pub const DEFAULT_PATHS: [&str; 4] = [
    "~/.config/langfilter/config.ini",
    "./langfilter.ini",
    "./.langfilter.ini",
    "~/.langfilter.ini",
];

/// Section that holds `[DEFAULT]` and any keys before the first header.
const DEFAULT_SECTION: &str = "default";

/// A config together with the file it came from.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub config: Config,
    pub source: Option<PathBuf>,
}

/// One INI section with its keys in file order.
struct Section {
    name: String,
    entries: Vec<(String, String)>,
}

/// Load configuration from an INI file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    parse_config(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
}

/// Parse configuration from INI text
pub fn parse_config(content: &str) -> Result<Config> {
    let sections = read_sections(content)?;
    let mut config = Config::default();

    // Rules outside [audio]/[subtitles] apply to audio: keys before any
    // header or in [DEFAULT], otherwise the first unrecognised section.
    let legacy = sections
        .iter()
        .position(|s| s.name == DEFAULT_SECTION && !s.entries.is_empty())
        .or_else(|| sections.iter().position(|s| !is_known_section(&s.name)));

    if let Some(index) = legacy {
        apply_rules(&mut config.audio, &sections[index]);
    }

    for (index, section) in sections.iter().enumerate() {
        match section.name.as_str() {
            "audio" => apply_rules(&mut config.audio, section),
            "subtitles" | "subtitle" => apply_rules(&mut config.subtitles, section),
            "tools" => apply_tools(&mut config.tools, section),
            _ if Some(index) == legacy => {}
            DEFAULT_SECTION if section.entries.is_empty() => {}
            name => tracing::warn!("Ignoring unknown config section [{}]", name),
        }
    }

    Ok(config)
}

/// Read INI text into sections, lowercasing section and key names.
///
/// Indented lines continue the previous value.
fn read_sections(content: &str) -> Result<Vec<Section>> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let mut ini = Ini::new();
    ini.set_multiline(true);
    let map = ini
        .read(content.to_string())
        .map_err(|e| anyhow::anyhow!("Invalid INI syntax: {}", e))?;

    let mut sections = Vec::with_capacity(map.len());
    for (name, values) in map {
        let mut entries = Vec::with_capacity(values.len());
        for (key, value) in values {
            let Some(value) = value else {
                anyhow::bail!("Invalid INI syntax: '{}' in [{}] has no value", key, name);
            };
            entries.push((key, value));
        }
        sections.push(Section { name, entries });
    }

    Ok(sections)
}

fn is_known_section(name: &str) -> bool {
    matches!(name, DEFAULT_SECTION | "audio" | "subtitles" | "subtitle" | "tools")
}

fn apply_rules(rules: &mut KindRules, section: &Section) {
    for (key, value) in &section.entries {
        match key.as_str() {
            "keep" => rules.keep = parse_languages(value),
            "remove" => rules.remove = parse_languages(value),
            "default" => {
                let lang = value.trim();
                rules.default = (!lang.is_empty()).then(|| normalize_language(lang));
            }
            key => tracing::warn!("Ignoring unknown key '{}' in [{}]", key, section.name),
        }
    }
}

fn apply_tools(tools: &mut ToolsConfig, section: &Section) {
    for (key, value) in &section.entries {
        let path = (!value.is_empty()).then(|| PathBuf::from(shellexpand::tilde(value).as_ref()));
        match key.as_str() {
            "mkvinfo" => tools.mkvinfo_path = path,
            "mkvmerge" => tools.mkvmerge_path = path,
            key => tracing::warn!("Ignoring unknown key '{}' in [tools]", key),
        }
    }
}

/// Split a comma or newline separated language list into lowercased codes.
pub fn parse_languages(value: &str) -> BTreeSet<String> {
    value
        .split([',', '\n'])
        .map(str::trim)
        .filter(|lang| !lang.is_empty())
        .map(normalize_language)
        .collect()
}

/// Lowercase a language code; `unknown` is spelled `und`.
fn normalize_language(lang: &str) -> String {
    let lang = lang.to_lowercase();
    if lang == "unknown" {
        UNDETERMINED_LANGUAGE.to_string()
    } else {
        lang
    }
}

/// Find the first existing config file in the default locations
pub fn find_config_file() -> Option<PathBuf> {
    DEFAULT_PATHS
        .iter()
        .map(|p| PathBuf::from(shellexpand::tilde(p).as_ref()))
        .find(|p| p.is_file())
}

/// Whether `path` is the per-user config under `~/.config`
pub fn is_standard_location(path: &Path) -> bool {
    Path::new(shellexpand::tilde(DEFAULT_PATHS[0]).as_ref()) == path
}

/// Load config from an explicit path or the default locations.
///
/// An explicit path must exist and parse. A discovered file that fails to
/// load is reported and ignored, as if no config existed.
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = custom_path {
        if !path.exists() {
            anyhow::bail!("Specified config file '{}' does not exist", path.display());
        }
        return Ok(LoadedConfig {
            config: load_config(path)?,
            source: Some(path.to_path_buf()),
        });
    }

    let Some(path) = find_config_file() else {
        tracing::debug!("No config file found, using defaults");
        return Ok(LoadedConfig::default());
    };

    match load_config(&path) {
        Ok(config) => Ok(LoadedConfig {
            config,
            source: Some(path),
        }),
        Err(e) => {
            tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
            Ok(LoadedConfig::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn langs(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_single_section_applies_to_audio() {
        let config = parse_config("[langfilter]\nkeep = ENG, jpn,\nremove = rus\n").unwrap();
        assert_eq!(config.audio.keep, langs(&["eng", "jpn"]));
        assert_eq!(config.audio.remove, langs(&["rus"]));
        assert!(!config.subtitles.has_rules());
    }

    #[test]
    fn test_default_section_applies_to_audio() {
        let config = parse_config("[DEFAULT]\nkeep = eng\n[other]\nkeep = ger\n").unwrap();
        assert_eq!(config.audio.keep, langs(&["eng"]));
    }

    #[test]
    fn test_sectionless_keys_apply_to_audio() {
        let config = parse_config("remove = fre\n").unwrap();
        assert_eq!(config.audio.remove, langs(&["fre"]));
    }

    #[test]
    fn test_kind_sections() {
        let config = parse_config(
            "[audio]\nkeep = jpn\ndefault = JPN\n\n[subtitles]\nremove = rus, ger\ndefault = eng\n",
        )
        .unwrap();

        assert_eq!(config.audio.keep, langs(&["jpn"]));
        assert_eq!(config.audio.default.as_deref(), Some("jpn"));
        assert_eq!(config.subtitles.remove, langs(&["ger", "rus"]));
        assert_eq!(config.subtitles.default.as_deref(), Some("eng"));
    }

    #[test]
    fn test_subtitle_alias() {
        let config = parse_config("[subtitle]\nkeep = eng\n").unwrap();
        assert_eq!(config.subtitles.keep, langs(&["eng"]));
        assert!(!config.audio.has_rules());
    }

    #[test]
    fn test_audio_section_overrides_legacy_keys() {
        let config = parse_config("keep = eng\n[audio]\nkeep = jpn\n").unwrap();
        assert_eq!(config.audio.keep, langs(&["jpn"]));
    }

    #[test]
    fn test_tools_section() {
        let config =
            parse_config("[tools]\nmkvinfo = /opt/mkv/mkvinfo\nmkvmerge = /opt/mkv/mkvmerge\n")
                .unwrap();
        assert_eq!(
            config.tools.mkvinfo_path,
            Some(PathBuf::from("/opt/mkv/mkvinfo"))
        );
        assert_eq!(
            config.tools.mkvmerge_path,
            Some(PathBuf::from("/opt/mkv/mkvmerge"))
        );
        assert!(!config.has_rules());
    }

    #[test]
    fn test_empty_values_clear_rules() {
        let config = parse_config("[audio]\nkeep =\ndefault =\n").unwrap();
        assert!(!config.has_rules());
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let config = parse_config("[audio]\nkeep = eng\nprefer = jpn\n").unwrap();
        assert_eq!(config.audio.keep, langs(&["eng"]));
    }

    #[test]
    fn test_syntax_error_is_reported() {
        let err = parse_config("[audio]\nkeep eng\n").unwrap_err();
        assert!(err.to_string().contains("keep eng"), "{}", err);

        assert!(parse_config("[audio\nkeep = eng\n").is_err());
    }

    #[test]
    fn test_continuation_lines_extend_lists() {
        let config = parse_config("[DEFAULT]\nkeep = eng,\n    jpn\n").unwrap();
        assert_eq!(config.audio.keep, langs(&["eng", "jpn"]));

        let config = parse_config("[subtitles]\nremove = ger\n  rus\n").unwrap();
        assert_eq!(config.subtitles.remove, langs(&["ger", "rus"]));
    }

    #[test]
    fn test_unknown_is_undetermined() {
        let config = parse_config("[DEFAULT]\nremove = unknown\n[subtitles]\ndefault = Unknown\n")
            .unwrap();
        assert_eq!(config.audio.remove, langs(&["und"]));
        assert_eq!(config.subtitles.default.as_deref(), Some("und"));
    }

    #[test]
    fn test_comments_and_bom() {
        let config = parse_config("\u{feff}# langfilter\n[audio]\n; prefer Japanese\nkeep = jpn\n")
            .unwrap();
        assert_eq!(config.audio.keep, langs(&["jpn"]));
    }

    #[test]
    fn test_display() {
        assert_eq!(Config::default().to_string(), "no rules");

        let config =
            parse_config("[audio]\nkeep = jpn, eng\n[subtitles]\nremove = rus\ndefault = eng\n")
                .unwrap();
        assert_eq!(
            config.to_string(),
            "audio keep: eng, jpn; subtitles remove: rus; subtitles default: eng"
        );
    }

    #[test]
    fn test_keeps() {
        let config = parse_config("[audio]\nkeep = eng, jpn\nremove = jpn\n").unwrap();
        assert!(config.audio.keeps("eng"));
        assert!(!config.audio.keeps("jpn"));
        assert!(!config.audio.keeps("ger"));
        assert!(config.subtitles.keeps("ger"));
    }

    #[test]
    fn test_explicit_missing_config_is_error() {
        let err = load_config_or_default(Some(Path::new("/nonexistent/langfilter.ini")))
            .unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.ini");
        std::fs::write(&path, "[audio]\nremove = ita\n").unwrap();

        let loaded = load_config_or_default(Some(&path)).unwrap();
        assert_eq!(loaded.source.as_deref(), Some(path.as_path()));
        assert_eq!(loaded.config.audio.remove, langs(&["ita"]));
    }
}
