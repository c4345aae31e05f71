//! Whisper model metadata catalog.
//!
//! Embedding applications resolve a model identifier to its ggml weight file
//! through this table; download and verification of the files themselves are
//! the embedder's concern.

/// Metadata for a Whisper model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    /// Model identifier (e.g. "tiny.en", "base", "large-v3")
    pub name: &'static str,
    /// ggml weight file name
    pub filename: &'static str,
    /// SHA-1 checksum of the weight file
    pub sha1: &'static str,
    /// Approximate size in megabytes
    pub size_mb: u32,
    /// Whether the model transcribes languages other than English
    pub multilingual: bool,
}

/// Catalog of Whisper models, smallest to largest.
///
/// The `.en` variants are English-only, slightly faster and more accurate
/// for English speech at the same size.
pub const MODELS: &[ModelInfo] = &[
    ModelInfo {
        name: "tiny",
        filename: "ggml-tiny.bin",
        sha1: "bd577a113a864445d4c299885e0cb97d4ba92b5f",
        size_mb: 74,
        multilingual: true,
    },
    ModelInfo {
        name: "tiny.en",
        filename: "ggml-tiny.en.bin",
        sha1: "c78c86eb1a8faa21b369bcd33207cc90d64ae9df",
        size_mb: 74,
        multilingual: false,
    },
    ModelInfo {
        name: "base",
        filename: "ggml-base.bin",
        sha1: "465707469ff3a37a2b9b8d8f89f2f99de7299dac",
        size_mb: 141,
        multilingual: true,
    },
    ModelInfo {
        name: "base.en",
        filename: "ggml-base.en.bin",
        sha1: "137c40403d78fd54d454da0f9bd998f78703390c",
        size_mb: 141,
        multilingual: false,
    },
    ModelInfo {
        name: "small",
        filename: "ggml-small.bin",
        sha1: "55356645c2b361a969dfd0ef2c5a50d530afd8d5",
        size_mb: 465,
        multilingual: true,
    },
    ModelInfo {
        name: "small.en",
        filename: "ggml-small.en.bin",
        sha1: "db8a495a91d927739e50b3fc1cc4c6b8f6c2d022",
        size_mb: 465,
        multilingual: false,
    },
    ModelInfo {
        name: "medium",
        filename: "ggml-medium.bin",
        sha1: "fd9727b6e1217c2f614f9b698455c4ffd82463b4",
        size_mb: 1477,
        multilingual: true,
    },
    ModelInfo {
        name: "medium.en",
        filename: "ggml-medium.en.bin",
        sha1: "8c30f0e44ce9560643ebd10bbe50cd20eafd3723",
        size_mb: 1477,
        multilingual: false,
    },
    ModelInfo {
        name: "large-v1",
        filename: "ggml-large-v1.bin",
        sha1: "b1caaf735c4cc1429223d5a74f0f4d0b9b59a299",
        size_mb: 2980,
        multilingual: true,
    },
    ModelInfo {
        name: "large-v2",
        filename: "ggml-large-v2.bin",
        sha1: "0f4c8e34f21cf1a914c59d8b3ce882345ad349d6",
        size_mb: 2980,
        multilingual: true,
    },
    ModelInfo {
        name: "large-v3",
        filename: "ggml-large-v3.bin",
        sha1: "ad82bf6a9043ceed055076d0fd39f5f186ff8062",
        size_mb: 2980,
        multilingual: true,
    },
    ModelInfo {
        name: "large-v3-turbo",
        filename: "ggml-large-v3-turbo.bin",
        sha1: "4af2b29d7ec73d781377bfd1758ca957a807e941",
        size_mb: 1564,
        multilingual: true,
    },
];

/// Looks up a model by identifier.
pub fn get_model(name: &str) -> Option<&'static ModelInfo> {
    MODELS.iter().find(|m| m.name == name)
}

/// Returns all catalogued models.
pub fn list_models() -> &'static [ModelInfo] {
    MODELS
}
