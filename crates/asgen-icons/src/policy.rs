//! Icon policy: the `{size, scale, state}` set a suite's configuration
//! enables for resolution (spec §4.3 "Responsibility").

/// What `IconHandler` should do with an icon once it is resolved for a
/// given size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconPolicyState {
    /// Do not resolve this size at all.
    Ignored,
    /// Record a remote reference only, never render into the pool.
    RemoteOnly,
    /// Render into the pool; no remote reference recorded.
    CachedOnly,
    /// Render into the pool and also record a remote reference.
    CachedRemote,
}

impl IconPolicyState {
    #[must_use]
    pub fn wants_cached(self) -> bool {
        matches!(self, IconPolicyState::CachedOnly | IconPolicyState::CachedRemote)
    }

    #[must_use]
    pub fn wants_remote(self) -> bool {
        matches!(self, IconPolicyState::RemoteOnly | IconPolicyState::CachedRemote)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IconSizePolicy {
    pub width: u32,
    pub height: u32,
    pub scale: u32,
    pub state: IconPolicyState,
}

impl IconSizePolicy {
    #[must_use]
    pub fn new(width: u32, height: u32, scale: u32, state: IconPolicyState) -> Self {
        Self { width, height, scale, state }
    }

    #[must_use]
    pub fn is_default_size(self) -> bool {
        self.width == 64 && self.height == 64 && self.scale == 1
    }
}

/// The spec's mandatory default: 64x64 at scale 1, cached and remote.
#[must_use]
pub fn default_policy() -> Vec<IconSizePolicy> {
    vec![IconSizePolicy::new(64, 64, 1, IconPolicyState::CachedRemote)]
}
