//! XDG icon theme model: `index.theme` parsing and directory-size
//! matching rules (spec §4.3).

/// How a theme directory declares the sizes it serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryType {
    Fixed,
    Scalable,
    Threshold,
}

/// Strict interpretation requires `|declared - requested| <= threshold`;
/// relaxed matches any declared size >= requested, "enables downscaling
/// when strict spec would refuse" (spec §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdMode {
    Strict,
    Relaxed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeDirectory {
    /// e.g. `"64x64/apps"`, the path segment under the theme root.
    pub relative_path: String,
    pub size: u32,
    pub scale: u32,
    pub dir_type: DirectoryType,
    pub min: u32,
    pub max: u32,
    pub threshold: u32,
}

impl ThemeDirectory {
    #[must_use]
    pub fn matches(&self, requested: u32, mode: ThresholdMode) -> bool {
        match self.dir_type {
            DirectoryType::Fixed => self.size == requested,
            DirectoryType::Scalable => self.min <= requested && requested <= self.max,
            DirectoryType::Threshold => match mode {
                ThresholdMode::Strict => self.size.abs_diff(requested) <= self.threshold,
                ThresholdMode::Relaxed => self.size >= requested,
            },
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Theme {
    pub name: String,
    pub directories: Vec<ThemeDirectory>,
}

impl Theme {
    /// Parse an `index.theme` file: an `[Icon Theme]` header naming the
    /// `Directories` list, then one `[<relative_path>]` section per
    /// listed directory with `Size`/`Scale`/`Type`/`MinSize`/`MaxSize`/
    /// `Threshold` keys.
    #[must_use]
    pub fn parse(name: &str, text: &str) -> Self {
        let sections = parse_ini_sections(text);
        let mut directories = Vec::new();

        if let Some(main) = sections.iter().find(|(header, _)| header == "Icon Theme") {
            let dir_names = main.1.get("Directories").map(|s| s.as_str()).unwrap_or("");
            for relative_path in dir_names.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                let Some((_, fields)) = sections.iter().find(|(header, _)| header == relative_path) else {
                    continue;
                };
                let size = fields.get("Size").and_then(|s| s.parse().ok()).unwrap_or(0);
                let scale = fields.get("Scale").and_then(|s| s.parse().ok()).unwrap_or(1);
                let min = fields.get("MinSize").and_then(|s| s.parse().ok()).unwrap_or(size);
                let max = fields.get("MaxSize").and_then(|s| s.parse().ok()).unwrap_or(size);
                let threshold = fields.get("Threshold").and_then(|s| s.parse().ok()).unwrap_or(2);
                let dir_type = match fields.get("Type").map(String::as_str) {
                    Some("Scalable") => DirectoryType::Scalable,
                    Some("Threshold") => DirectoryType::Threshold,
                    _ => DirectoryType::Fixed,
                };
                directories.push(ThemeDirectory {
                    relative_path: relative_path.to_string(),
                    size,
                    scale,
                    dir_type,
                    min,
                    max,
                    threshold,
                });
            }
        }

        Self {
            name: name.to_string(),
            directories,
        }
    }

    /// The best directory serving `requested_size` at `scale`, per
    /// `mode`. Among matches, the smallest declared size is preferred
    /// to avoid wasting an oversized candidate.
    #[must_use]
    pub fn best_directory_for(&self, requested_size: u32, scale: u32, mode: ThresholdMode) -> Option<&ThemeDirectory> {
        self.directories
            .iter()
            .filter(|d| d.scale == scale && d.matches(requested_size, mode))
            .min_by_key(|d| d.size)
    }
}

fn parse_ini_sections(text: &str) -> Vec<(String, std::collections::HashMap<String, String>)> {
    let mut sections = Vec::new();
    let mut current_header: Option<String> = None;
    let mut current_fields = std::collections::HashMap::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(stripped) = line.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            if let Some(header) = current_header.take() {
                sections.push((header, std::mem::take(&mut current_fields)));
            }
            current_header = Some(stripped.to_string());
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            current_fields.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    if let Some(header) = current_header {
        sections.push((header, current_fields));
    }
    sections
}
