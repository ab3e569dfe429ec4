use serde::Deserialize;

/// Whether the field manages exactly one image record or an ordered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    One,
    #[default]
    Many,
}

/// Configuration for one image-set field.
///
/// Deserializable from app config with sensible defaults, and buildable
/// fluently in code:
///
/// ```
/// use imageset::config::{Cardinality, FieldConfig};
///
/// let config = FieldConfig::default()
///     .disk("public")
///     .directory("products/images")
///     .fields(["url", "caption", "alt"])
///     .cardinality(Cardinality::Many);
/// assert_eq!(config.hidden_marker_key(), "hidden_url");
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct FieldConfig {
    /// Storage disk name. Default: "public".
    #[serde(default = "default_disk")]
    pub disk: String,
    /// Directory for stored uploads within the disk. Default: "images".
    #[serde(default = "default_directory")]
    pub directory: String,
    /// Primary-key attribute name on the image record. Default: "id".
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
    /// Attribute holding the stored image path. Default: "url".
    #[serde(default = "default_image_field")]
    pub image_field: String,
    /// Explicit allow-list of persistable attributes. When empty, the
    /// allow-list is derived from `fields` minus the primary key.
    #[serde(default)]
    pub save_only_fields: Vec<String>,
    /// Declared sub-field column names. Default: empty.
    #[serde(default)]
    pub fields: Vec<String>,
    /// One image record vs an ordered list. Default: many.
    #[serde(default)]
    pub cardinality: Cardinality,
}

fn default_disk() -> String {
    "public".into()
}
fn default_directory() -> String {
    "images".into()
}
fn default_primary_key() -> String {
    "id".into()
}
fn default_image_field() -> String {
    "url".into()
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            disk: default_disk(),
            directory: default_directory(),
            primary_key: default_primary_key(),
            image_field: default_image_field(),
            save_only_fields: Vec::new(),
            fields: Vec::new(),
            cardinality: Cardinality::default(),
        }
    }
}

impl FieldConfig {
    pub fn disk(mut self, disk: impl Into<String>) -> Self {
        self.disk = disk.into();
        self
    }

    pub fn directory(mut self, directory: impl Into<String>) -> Self {
        self.directory = directory.into();
        self
    }

    pub fn primary_key(mut self, primary_key: impl Into<String>) -> Self {
        self.primary_key = primary_key.into();
        self
    }

    pub fn image_field(mut self, image_field: impl Into<String>) -> Self {
        self.image_field = image_field.into();
        self
    }

    /// Restrict persisted attributes to an explicit allow-list.
    pub fn save_only_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.save_only_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Declare the sub-field column names of the composite field.
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn cardinality(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = cardinality;
        self
    }

    /// Payload key that carries the previous stored path for an item
    /// ("retain current file" / "replace this file" marker).
    pub fn hidden_marker_key(&self) -> String {
        format!("hidden_{}", self.image_field)
    }
}
