//! Window and runtime settings for a lab.
//!
//! Every lab has built-in defaults. An optional XML file overrides any of
//! them:
//!
//! ```xml
//! <lab>
//!     <window>
//!         <width>1024</width>
//!         <height>576</height>
//!         <title>camera</title>
//!         <resizable>true</resizable>
//!         <msaa>false</msaa>
//!     </window>
//!     <target-fps>30</target-fps>
//!     <assets>resources</assets>
//! </lab>
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;

use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

use crate::labs::LabKind;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("invalid value {value:?} for <{tag}>")]
    Value { tag: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub resizable: bool,
    /// Requests 4x multisampling.
    pub msaa: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabConfig {
    pub window: WindowConfig,
    pub target_fps: u32,
    /// Directory texture files are loaded from.
    pub asset_dir: PathBuf,
}

impl LabConfig {
    pub fn defaults(kind: LabKind) -> Self {
        let (width, height, title, msaa) = match kind {
            LabKind::Camera => (800, 450, "3d camera mode", false),
            LabKind::Helicopter => (800, 450, "textured helicopter", false),
            LabKind::Lighting => (800, 450, "basic lighting", true),
            LabKind::Stencil => (1280, 720, "stencil reflections", true),
        };
        Self {
            window: WindowConfig {
                width,
                height,
                title: title.to_string(),
                resizable: true,
                msaa,
            },
            target_fps: 60,
            asset_dir: PathBuf::from("assets"),
        }
    }

    pub fn load(kind: LabKind, path: &Path) -> Result<Self, ConfigError> {
        let xml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::defaults(kind).merge_xml(&xml)
    }

    /// Applies the overrides found in `xml` on top of `self`.
    pub fn merge_xml(mut self, xml: &str) -> Result<Self, ConfigError> {
        let document = Document::parse(xml)?;
        let root = document.root_element();

        if let Some(window) = child(&root, "window") {
            self.window.width = parse_or(&window, "width", self.window.width)?.max(1);
            self.window.height = parse_or(&window, "height", self.window.height)?.max(1);
            if let Some(title) = text(&window, "title") {
                self.window.title = title;
            }
            self.window.resizable = parse_or(&window, "resizable", self.window.resizable)?;
            self.window.msaa = parse_or(&window, "msaa", self.window.msaa)?;
        }
        self.target_fps = parse_or(&root, "target-fps", self.target_fps)?.max(1);
        if let Some(dir) = text(&root, "assets") {
            self.asset_dir = PathBuf::from(dir);
        }
        Ok(self)
    }

    pub fn asset_path(&self, file: &str) -> PathBuf {
        self.asset_dir.join(file)
    }

    pub fn sample_count(&self) -> u32 {
        if self.window.msaa {
            4
        } else {
            1
        }
    }
}

fn child<'a, 'input>(node: &Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|child| child.has_tag_name(tag))
}

fn text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    child(node, tag)
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

fn parse_or<T: FromStr>(node: &Node<'_, '_>, tag: &str, default: T) -> Result<T, ConfigError> {
    match text(node, tag) {
        Some(value) => value.parse().map_err(|_| ConfigError::Value {
            tag: tag.to_string(),
            value,
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_follow_lab() {
        let stencil = LabConfig::defaults(LabKind::Stencil);
        assert_eq!((stencil.window.width, stencil.window.height), (1280, 720));
        assert!(stencil.window.msaa);
        assert_eq!(stencil.sample_count(), 4);

        let camera = LabConfig::defaults(LabKind::Camera);
        assert_eq!((camera.window.width, camera.window.height), (800, 450));
        assert_eq!(camera.sample_count(), 1);
        assert_eq!(camera.target_fps, 60);
    }

    #[test]
    fn xml_overrides_only_given_values() {
        let config = LabConfig::defaults(LabKind::Lighting)
            .merge_xml(
                r#"<lab>
                    <window><width>1024</width><title>demo</title></window>
                    <target-fps>30</target-fps>
                </lab>"#,
            )
            .unwrap();
        assert_eq!(config.window.width, 1024);
        assert_eq!(config.window.height, 450);
        assert_eq!(config.window.title, "demo");
        assert!(config.window.msaa);
        assert_eq!(config.target_fps, 30);
        assert_eq!(config.asset_dir, PathBuf::from("assets"));
    }

    #[test]
    fn bad_value_names_the_tag() {
        let err = LabConfig::defaults(LabKind::Camera)
            .merge_xml("<lab><window><msaa>maybe</msaa></window></lab>")
            .unwrap_err();
        assert!(err.to_string().contains("<msaa>"));
    }

    #[test]
    fn malformed_xml_is_rejected() {
        let err = LabConfig::defaults(LabKind::Camera).merge_xml("<lab>").unwrap_err();
        assert!(matches!(err, ConfigError::Xml(_)));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "<lab><assets>textures</assets></lab>").unwrap();
        let config = LabConfig::load(LabKind::Helicopter, file.path()).unwrap();
        assert_eq!(config.asset_path("img.png"), PathBuf::from("textures/img.png"));
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.xml");
        let err = LabConfig::load(LabKind::Camera, &path).unwrap_err();
        assert!(err.to_string().contains("nope.xml"));
    }
}
