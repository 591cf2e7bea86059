//! Identifier derivation from IDL text names (`"texture format"`).

/// Prefixes used to derive declaration and external names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Naming {
    /// Prefix of native C declarations, e.g. `WGPU`.
    pub native_prefix: String,
    /// Prefix of host-visible class names, e.g. `GPU`.
    pub external_prefix: String,
}

impl Default for Naming {
    fn default() -> Self {
        Self::new("WGPU", "GPU")
    }
}

impl Naming {
    pub fn new(native_prefix: impl Into<String>, external_prefix: impl Into<String>) -> Self {
        Self {
            native_prefix: native_prefix.into(),
            external_prefix: external_prefix.into(),
        }
    }

    /// `"texture format"` -> `WGPUTextureFormat`
    pub fn declaration_name(&self, text_name: &str) -> String {
        format!("{}{}", self.native_prefix, pascal_case(text_name))
    }

    /// `"texture format"` -> `GPUTextureFormat`
    pub fn external_name(&self, text_name: &str) -> String {
        format!("{}{}", self.external_prefix, pascal_case(text_name))
    }
}

fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| c.is_whitespace() || c == '_' || c == '-')
        .filter(|w| !w.is_empty())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `"mip level count"` -> `mipLevelCount`. The first word is kept as written.
pub fn camel_case(text: &str) -> String {
    let mut words = words(text);
    let mut out = words.next().map(str::to_string).unwrap_or_default();
    for word in words {
        out.push_str(&capitalize(word));
    }
    out
}

/// `"texture format"` -> `TextureFormat`
pub fn pascal_case(text: &str) -> String {
    words(text).map(capitalize).collect()
}

/// `"map read"` -> `MAP_READ`
pub fn upper_snake_case(text: &str) -> String {
    words(text)
        .map(str::to_uppercase)
        .collect::<Vec<_>>()
        .join("_")
}
