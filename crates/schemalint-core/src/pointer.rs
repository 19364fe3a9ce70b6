//! `$ref` strings and JSON pointers.

use schemalint_yaml::Value;
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// The `$ref` target of a mapping, when the mapping is a reference.
///
/// Only a string-valued `$ref` makes a reference; `{$ref: 1}` is plain data.
pub fn reference_of(value: &Value) -> Option<&str> {
    value.get("$ref")?.as_str()
}

/// A parsed JSON pointer (RFC 6901).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JsonPointer {
    segments: Vec<String>,
}

impl JsonPointer {
    /// The pointer to the whole document.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_segments(segments: Vec<String>) -> Self {
        Self { segments }
    }

    /// Parse a plain pointer such as a validator's instance path.
    ///
    /// Only `~1` and `~0` are unescaped; `""` is the whole document and
    /// `"/"` the key `""`.
    pub fn parse(text: &str) -> Self {
        let Some(text) = text.strip_prefix('/') else {
            return Self::root();
        };
        Self {
            segments: text.split('/').map(unescape).collect(),
        }
    }

    /// Parse the pointer found after `#` in a reference.
    ///
    /// Segments are percent-decoded, then `~1` and `~0` are unescaped. Both
    /// the empty string and `/` name the whole document.
    pub fn from_fragment(fragment: &str) -> Self {
        let fragment = fragment.strip_prefix('/').unwrap_or(fragment);
        if fragment.is_empty() {
            return Self::root();
        }
        let segments = fragment
            .split('/')
            .map(|raw| unescape(&percent_decode(raw)))
            .collect();
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn into_segments(self) -> Vec<String> {
        self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{}", segment.replace('~', "~0").replace('/', "~1"))?;
        }
        Ok(())
    }
}

fn unescape(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

fn percent_decode(segment: &str) -> String {
    if !segment.contains('%') {
        return segment.to_string();
    }
    let bytes = segment.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex(bytes[i + 1]), hex(bytes[i + 2])) {
                out.push((hi << 4) | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// A `$ref` split into its target file and pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Normalized path of the target file
    pub file: String,
    pub pointer: JsonPointer,
}

impl Reference {
    /// Split `raw` (`file#/ptr`, `#/ptr`, `file` or `#`) as written in
    /// `current_file`.
    ///
    /// A relative file part is resolved against the directory of
    /// `current_file`; an empty one means `current_file` itself.
    pub fn parse(raw: &str, current_file: &str) -> Self {
        let (file_part, fragment) = raw.split_once('#').unwrap_or((raw, ""));
        let file = if file_part.is_empty() {
            current_file.to_string()
        } else {
            resolve_relative(current_file, file_part)
        };
        Self {
            file,
            pointer: JsonPointer::from_fragment(fragment),
        }
    }
}

/// Resolve `target` against the directory containing `current_file`.
pub fn resolve_relative(current_file: &str, target: &str) -> String {
    let target = Path::new(target);
    let joined = if target.is_absolute() {
        target.to_path_buf()
    } else {
        Path::new(current_file)
            .parent()
            .map(|dir| dir.join(target))
            .unwrap_or_else(|| target.to_path_buf())
    };
    normalize(&joined).to_string_lossy().into_owned()
}

/// Remove `.` and `..` components without touching the filesystem.
///
/// Leading `..` components of a relative path are kept.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                );
                if can_pop {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
