#[cfg(test)]
pub mod test {
    use crate::framework::{CollectionConfig, FrameworkConfig, Upload, UploadOptions};

    /// A framework config with one structured upload record, one `upload =
    /// true`, and one collection without uploads.
    pub const FRAMEWORK_TOML: &str = r#"
server_url = "https://cms.example.com"

[[collections]]
slug = "media"
admin_group = "Assets"

[collections.upload]
static_dir = "media"
handlers = ["strip-exif", "virus-scan"]

[[collections]]
slug = "avatars"
upload = true

[[collections]]
slug = "posts"
"#;

    /// Plugin settings with per-collection overrides.
    pub const OVERRIDES_TOML: &str = r#"
read_file = "local-disk"
upload_file = ["local-disk"]
handlers = ["watermark"]

[collections.media]
read_file = ["s3", "cdn-cache"]
handlers = ["resize"]

[collections.avatars]
"#;

    /// Plugin settings naming slugs only.
    pub const SLUGS_TOML: &str = r#"
collections = ["media"]
handlers = ["watermark"]
"#;

    pub fn collection(slug: &str, handlers: Option<Vec<&'static str>>) -> CollectionConfig<&'static str> {
        let c = CollectionConfig::new(slug);
        match handlers {
            Some(hs) => c.with_upload(Upload::Options(UploadOptions::with_handlers(hs))),
            None => c,
        }
    }

    pub fn framework(collections: Vec<CollectionConfig<&'static str>>) -> FrameworkConfig<&'static str> {
        FrameworkConfig::new(collections)
    }

    #[test]
    fn fixtures_parse() {
        let config: FrameworkConfig<String> = toml::from_str(FRAMEWORK_TOML).unwrap();
        assert_eq!(config.collections.len(), 3);
    }
}
