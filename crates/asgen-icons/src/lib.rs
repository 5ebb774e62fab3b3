//! IconHandler (C3): XDG theme resolution and the icon-caching
//! algorithm (spec §4.3).

pub mod policy;
pub mod renderer;
pub mod theme;

use asgen_backend::Package;
use asgen_composer::{Component, IconPlacement, IconRef};
use asgen_hints::Hint;
use asgen_utils::types::{Gcid, PackageId};
use camino::{Utf8Path, Utf8PathBuf};
use policy::{IconPolicyState, IconSizePolicy};
use renderer::IconRenderer;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use theme::{Theme, ThresholdMode};

const RASTER_EXTENSIONS: &[&str] = &["png", "xpm"];
const VECTOR_EXTENSIONS: &[&str] = &["svg", "svgz"];
const MIN_DEFAULT_SIZE: u32 = 48;

#[derive(Debug, Clone)]
struct FoundIcon {
    bytes: Vec<u8>,
    is_svg: bool,
    width: u32,
    height: u32,
    scale: u32,
    basename: String,
}

/// For one (section, arch) batch: the XDG theme list in preference
/// order, the precomputed icon-file index, and the shared renderer.
/// Built once per batch and shared read-only across extractor workers
/// (spec §4.3 "Thread discipline").
pub struct IconHandler {
    themes: Vec<Theme>,
    icon_index: HashMap<Utf8PathBuf, PackageId>,
    extra_icon_prefix: Option<Utf8PathBuf>,
    renderer: Arc<dyn IconRenderer>,
    /// Serializes the rendering path "to avoid races in the composer's
    /// image library" (spec §4.3).
    render_lock: Mutex<()>,
}

impl IconHandler {
    /// `theme_names` should already be in preference order: `hicolor`
    /// first, then the suite's configured theme, then `Adwaita`,
    /// `AdwaitaLegacy`, `breeze` (spec §4.3 "Model").
    #[must_use]
    pub fn new(
        themes: Vec<Theme>,
        icon_index: HashMap<Utf8PathBuf, PackageId>,
        extra_icon_prefix: Option<Utf8PathBuf>,
        renderer: Arc<dyn IconRenderer>,
    ) -> Self {
        Self {
            themes,
            icon_index,
            extra_icon_prefix,
            renderer,
            render_lock: Mutex::new(()),
        }
    }

    fn read_candidate(&self, path: &Utf8Path, own_package: &dyn Package, packages: &HashMap<PackageId, &dyn Package>) -> Option<Vec<u8>> {
        let bytes = own_package.read(path);
        if !asgen_backend::is_absent(&bytes) {
            return Some(bytes);
        }
        let owner = self.icon_index.get(path)?;
        let package = packages.get(owner)?;
        let bytes = package.read(path);
        if asgen_backend::is_absent(&bytes) {
            None
        } else {
            Some(bytes)
        }
    }

    fn lookup_themed(
        &self,
        icon_name: &str,
        requested: u32,
        scale: u32,
        own_package: &dyn Package,
        packages: &HashMap<PackageId, &dyn Package>,
    ) -> Option<FoundIcon> {
        for theme in &self.themes {
            let Some(dir) = theme.best_directory_for(requested, scale, ThresholdMode::Relaxed) else {
                continue;
            };
            for ext in VECTOR_EXTENSIONS.iter().chain(RASTER_EXTENSIONS.iter()) {
                let path = Utf8PathBuf::from(format!(
                    "/usr/share/icons/{}/{}/{icon_name}.{ext}",
                    theme.name, dir.relative_path
                ));
                if let Some(bytes) = self.read_candidate(&path, own_package, packages) {
                    return Some(self.classify(bytes, ext, dir.size, scale, icon_name));
                }
            }
        }
        None
    }

    fn lookup_legacy_pixmap(&self, icon_name: &str, own_package: &dyn Package, packages: &HashMap<PackageId, &dyn Package>) -> Option<FoundIcon> {
        for ext in VECTOR_EXTENSIONS.iter().chain(RASTER_EXTENSIONS.iter()) {
            let path = Utf8PathBuf::from(format!("/usr/share/pixmaps/{icon_name}.{ext}"));
            if let Some(bytes) = self.read_candidate(&path, own_package, packages) {
                return Some(self.classify(bytes, ext, 64, 1, icon_name));
            }
        }
        None
    }

    fn lookup_extra_prefix(&self, icon_name: &str, own_package: &dyn Package, packages: &HashMap<PackageId, &dyn Package>) -> Option<FoundIcon> {
        let prefix = self.extra_icon_prefix.as_ref()?;
        for ext in VECTOR_EXTENSIONS.iter().chain(RASTER_EXTENSIONS.iter()) {
            let path = prefix.join(format!("{icon_name}.{ext}"));
            if let Some(bytes) = self.read_candidate(&path, own_package, packages) {
                return Some(self.classify(bytes, ext, 64, 1, icon_name));
            }
        }
        None
    }

    fn classify(&self, bytes: Vec<u8>, ext: &str, declared_size: u32, scale: u32, icon_name: &str) -> FoundIcon {
        let is_svg = VECTOR_EXTENSIONS.contains(&ext);
        let (width, height) = if is_svg {
            (declared_size, declared_size)
        } else {
            self.renderer.raster_dimensions(&bytes).unwrap_or((declared_size, declared_size))
        };
        FoundIcon {
            bytes,
            is_svg,
            width,
            height,
            scale,
            basename: format!("{icon_name}.{ext}"),
        }
    }

    fn render(&self, found: &FoundIcon, target_w: u32, target_h: u32) -> Vec<u8> {
        let _guard = self.render_lock.lock().unwrap_or_else(|p| p.into_inner());
        if found.is_svg {
            self.renderer.render_svg(&found.bytes, target_w, target_h)
        } else {
            self.renderer.render_raster(&found.bytes, target_w, target_h)
        }
    }

    /// Resolve icons for `component` per `policies`, writing cached
    /// files under `<media_pool_root>/<gcid>/icons/<size>/<name>`.
    /// Returns the hints raised (spec §4.3 "Algorithm").
    #[allow(clippy::too_many_arguments)]
    pub fn resolve(
        &self,
        component: &mut Component,
        gcid: &Gcid,
        own_package: &dyn Package,
        packages: &HashMap<PackageId, &dyn Package>,
        policies: &[IconSizePolicy],
        media_pool_root: &Utf8Path,
        upscaling_enabled: bool,
    ) -> Vec<Hint> {
        let mut hints = Vec::new();
        component.icons.clear();
        let Some(icon_name) = component.icon_name.take() else {
            return hints;
        };

        let mut sources: Vec<FoundIcon> = Vec::new();
        let mut direct: HashMap<(u32, u32, u32), FoundIcon> = HashMap::new();

        if let Some(path) = icon_name.strip_prefix('/') {
            let abs = Utf8PathBuf::from(format!("/{path}"));
            let bytes = own_package.read(&abs);
            if !asgen_backend::is_absent(&bytes) {
                let ext = abs.extension().unwrap_or("png");
                let basename = abs.file_name().unwrap_or("icon.png").to_string();
                let is_svg = VECTOR_EXTENSIONS.contains(&ext);
                let (width, height) = if is_svg {
                    (64, 64)
                } else {
                    self.renderer.raster_dimensions(&bytes).unwrap_or((64, 64))
                };
                sources.push(FoundIcon { bytes, is_svg, width, height, scale: 1, basename });
            }
        } else {
            for policy in policies {
                if policy.state == IconPolicyState::Ignored {
                    continue;
                }
                let size = policy.width.max(policy.height);
                let found = self
                    .lookup_themed(&icon_name, size, policy.scale, own_package, packages)
                    .or_else(|| {
                        if policy.is_default_size() {
                            self.lookup_legacy_pixmap(&icon_name, own_package, packages)
                        } else {
                            None
                        }
                    })
                    .or_else(|| self.lookup_extra_prefix(&icon_name, own_package, packages));
                if let Some(found) = found {
                    direct.insert((policy.width, policy.height, policy.scale), found.clone());
                    sources.push(found);
                }
            }
        }

        for policy in policies {
            if policy.state == IconPolicyState::Ignored {
                continue;
            }
            let key = (policy.width, policy.height, policy.scale);
            let mut scaled_up = false;
            let source = match direct.get(&key) {
                Some(found) => Some(found.clone()),
                None => pick_scaling_source(&sources, policy, upscaling_enabled).map(|(found, up)| {
                    scaled_up = up;
                    found
                }),
            };

            let Some(source) = source else { continue };

            if policy.is_default_size() && !source.is_svg && source.width < MIN_DEFAULT_SIZE && source.height < MIN_DEFAULT_SIZE {
                hints.push(Hint::for_component(component.id.clone(), "icon-too-small"));
                continue;
            }

            let rendered = self.render(&source, policy.width, policy.height);
            let filename = source.basename.clone();

            if policy.state.wants_cached() {
                let size_dir = size_dir_name(policy.width, policy.height, policy.scale);
                let target = media_pool_root.join(gcid.to_string()).join("icons").join(&size_dir).join(&filename);
                if asgen_utils::atomic_write::write_atomic(&target, &rendered).is_err() {
                    hints.push(Hint::for_component(component.id.clone(), "internal-error").with_var("message", "failed to write cached icon"));
                    continue;
                }
                component.icons.push(IconRef {
                    width: policy.width,
                    height: policy.height,
                    scale: policy.scale,
                    placement: IconPlacement::Cached { filename: filename.clone() },
                });
            }
            if policy.state.wants_remote() {
                component.icons.push(IconRef {
                    width: policy.width,
                    height: policy.height,
                    scale: policy.scale,
                    placement: IconPlacement::Remote { filename },
                });
            }
            if scaled_up {
                hints.push(Hint::for_component(component.id.clone(), "icon-scaled-up"));
            }
        }

        if !component.has_default_size_icon() {
            hints.push(Hint::for_component(component.id.clone(), "icon-not-found"));
            component.icons.clear();
        }

        hints
    }
}

fn pick_scaling_source(sources: &[FoundIcon], policy: &IconSizePolicy, upscaling_enabled: bool) -> Option<(FoundIcon, bool)> {
    let target = policy.width.max(policy.height);
    let mut best_downscale: Option<&FoundIcon> = None;
    for candidate in sources {
        if candidate.scale != policy.scale {
            continue;
        }
        if candidate.is_svg || candidate.width >= target {
            if best_downscale.map(|b| candidate.width < b.width).unwrap_or(true) {
                best_downscale = Some(candidate);
            }
        }
    }
    if let Some(found) = best_downscale {
        return Some((found.clone(), false));
    }

    if upscaling_enabled && policy.is_default_size() {
        let mut best_upscale: Option<&FoundIcon> = None;
        for candidate in sources {
            if candidate.is_svg || candidate.scale != policy.scale {
                continue;
            }
            if candidate.width >= MIN_DEFAULT_SIZE
                && best_upscale.map(|b| candidate.width > b.width).unwrap_or(true)
            {
                best_upscale = Some(candidate);
            }
        }
        if let Some(found) = best_upscale {
            return Some((found.clone(), true));
        }
    }
    None
}

fn size_dir_name(width: u32, height: u32, scale: u32) -> String {
    if scale == 1 {
        format!("{width}x{height}")
    } else {
        format!("{width}x{height}@{scale}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asgen_backend::dummy::DummyPackage;
    use policy::default_policy;
    use tempfile::tempdir;

    fn handler(icon_index: HashMap<Utf8PathBuf, PackageId>) -> IconHandler {
        let hicolor = Theme::parse(
            "hicolor",
            "[Icon Theme]\nDirectories=48x48/apps,64x64/apps\n\n[48x48/apps]\nSize=48\nType=Fixed\n\n[64x64/apps]\nSize=64\nType=Fixed\n",
        );
        IconHandler::new(vec![hicolor], icon_index, None, Arc::new(renderer::PngIconRenderer))
    }

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut bytes, w, h);
            encoder.set_color(png::ColorType::Grayscale);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(&vec![0u8; (w * h) as usize]).unwrap();
        }
        bytes
    }

    #[test]
    fn resolves_direct_hit_in_own_package_and_caches_it() {
        let pkg = DummyPackage::new(PackageId::new("hello", "1.0", "amd64")).with_file(
            "/usr/share/icons/hicolor/64x64/apps/hello.png",
            png_bytes(64, 64),
        );
        let gcid = Gcid::from_component_id("org.example.Hello.desktop", "abc123");
        let mut component = Component::new("org.example.Hello.desktop", asgen_composer::ComponentKind::DesktopApp);
        component.icon_name = Some("hello".to_string());

        let dir = tempdir().unwrap();
        let pool = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let packages: HashMap<PackageId, &dyn Package> = HashMap::new();
        let hints = handler(HashMap::new()).resolve(&mut component, &gcid, &pkg, &packages, &default_policy(), &pool, false);

        assert!(hints.is_empty(), "{hints:?}");
        assert!(component.has_default_size_icon());
        let cached = pool.join(gcid.to_string()).join("icons").join("64x64").join("hello.png");
        assert!(cached.exists());
    }

    #[test]
    fn missing_icon_emits_icon_not_found() {
        let pkg = DummyPackage::new(PackageId::new("hello", "1.0", "amd64"));
        let gcid = Gcid::from_component_id("org.example.Hello.desktop", "abc123");
        let mut component = Component::new("org.example.Hello.desktop", asgen_composer::ComponentKind::DesktopApp);
        component.icon_name = Some("missing".to_string());

        let dir = tempdir().unwrap();
        let pool = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let packages: HashMap<PackageId, &dyn Package> = HashMap::new();
        let hints = handler(HashMap::new()).resolve(&mut component, &gcid, &pkg, &packages, &default_policy(), &pool, false);

        assert_eq!(hints.len(), 1);
        assert_eq!(hints[0].tag, "icon-not-found");
        assert!(component.icons.is_empty());
    }

    #[test]
    fn too_small_direct_raster_hit_at_default_size_is_rejected() {
        let pkg = DummyPackage::new(PackageId::new("hello", "1.0", "amd64")).with_file(
            "/usr/share/icons/hicolor/64x64/apps/hello.png",
            png_bytes(32, 32),
        );
        let gcid = Gcid::from_component_id("org.example.Hello.desktop", "abc123");
        let mut component = Component::new("org.example.Hello.desktop", asgen_composer::ComponentKind::DesktopApp);
        component.icon_name = Some("hello".to_string());

        let dir = tempdir().unwrap();
        let pool = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let packages: HashMap<PackageId, &dyn Package> = HashMap::new();
        let hints = handler(HashMap::new()).resolve(&mut component, &gcid, &pkg, &packages, &default_policy(), &pool, false);

        assert!(hints.iter().any(|h| h.tag == "icon-too-small"));
        assert!(hints.iter().any(|h| h.tag == "icon-not-found"));
    }

    #[test]
    fn icon_found_via_global_index_in_another_package() {
        let pkg = DummyPackage::new(PackageId::new("hello", "1.0", "amd64"));
        let icon_owner = PackageId::new("hicolor-icon-theme", "1.0", "all");
        let icon_pkg = DummyPackage::new(icon_owner.clone()).with_file(
            "/usr/share/icons/hicolor/64x64/apps/hello.png",
            png_bytes(64, 64),
        );

        let mut icon_index = HashMap::new();
        icon_index.insert(
            Utf8PathBuf::from("/usr/share/icons/hicolor/64x64/apps/hello.png"),
            icon_owner.clone(),
        );
        let packages: HashMap<PackageId, &dyn Package> = [(icon_owner, &icon_pkg as &dyn Package)].into_iter().collect();

        let gcid = Gcid::from_component_id("org.example.Hello.desktop", "abc123");
        let mut component = Component::new("org.example.Hello.desktop", asgen_composer::ComponentKind::DesktopApp);
        component.icon_name = Some("hello".to_string());

        let dir = tempdir().unwrap();
        let pool = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let hints = handler(icon_index).resolve(&mut component, &gcid, &pkg, &packages, &default_policy(), &pool, false);

        assert!(hints.is_empty(), "{hints:?}");
        assert!(component.has_default_size_icon());
    }
}
