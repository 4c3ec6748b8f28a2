use serde::{Deserialize, Serialize};

/// First four bytes of every binary glTF container
pub const GLB_MAGIC: &[u8; 4] = b"glTF";

/// Interchange formats handed back by the generation backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetFormat {
    Glb,
    Obj,
}

impl AssetFormat {
    /// Label used when listing download links
    pub fn name(&self) -> &str {
        match self {
            Self::Glb => "GLB",
            Self::Obj => "OBJ",
        }
    }

    pub fn extension(&self) -> &str {
        match self {
            Self::Glb => "glb",
            Self::Obj => "obj",
        }
    }

    /// Name a download of this format is saved under
    pub fn default_filename(&self) -> String {
        format!("generated-model.{}", self.extension())
    }

    /// All formats the backend may return, GLB first
    pub fn all() -> [AssetFormat; 2] {
        [Self::Glb, Self::Obj]
    }
}

impl Default for AssetFormat {
    fn default() -> Self {
        Self::Glb
    }
}

/// Sniff a payload for the binary glTF header
pub fn looks_like_glb(bytes: &[u8]) -> bool {
    bytes.len() >= GLB_MAGIC.len() && &bytes[..GLB_MAGIC.len()] == GLB_MAGIC
}

/// Locators for a generated model, as resolved from a backend response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetReference {
    pub glb_url: String,
    pub obj_url: Option<String>,
    pub thumbnail_url: Option<String>,
}

impl AssetReference {
    pub fn new(glb_url: impl Into<String>) -> Self {
        Self {
            glb_url: glb_url.into(),
            obj_url: None,
            thumbnail_url: None,
        }
    }

    pub fn with_obj(mut self, obj_url: impl Into<String>) -> Self {
        self.obj_url = Some(obj_url.into());
        self
    }

    pub fn with_thumbnail(mut self, thumbnail_url: impl Into<String>) -> Self {
        self.thumbnail_url = Some(thumbnail_url.into());
        self
    }

    pub fn url_for(&self, format: AssetFormat) -> Option<&str> {
        match format {
            AssetFormat::Glb => Some(&self.glb_url),
            AssetFormat::Obj => self.obj_url.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filenames() {
        assert_eq!(AssetFormat::Glb.default_filename(), "generated-model.glb");
        assert_eq!(AssetFormat::Obj.default_filename(), "generated-model.obj");
    }

    #[test]
    fn test_names_in_listing_order() {
        let names: Vec<_> = AssetFormat::all().iter().map(|f| f.name().to_string()).collect();
        assert_eq!(names, ["GLB", "OBJ"]);
    }

    #[test]
    fn test_glb_magic() {
        assert!(looks_like_glb(b"glTF\x02\x00\x00\x00"));
        assert!(!looks_like_glb(b"v 0.0 0.0 0.0"));
        assert!(!looks_like_glb(b"gl"));
    }

    #[test]
    fn test_url_for() {
        let asset = AssetReference::new("https://x/car.glb");
        assert_eq!(asset.url_for(AssetFormat::Glb), Some("https://x/car.glb"));
        assert_eq!(asset.url_for(AssetFormat::Obj), None);
        let asset = asset.with_obj("https://x/car.obj");
        assert_eq!(asset.url_for(AssetFormat::Obj), Some("https://x/car.obj"));
    }
}
