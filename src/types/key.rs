use std::fmt;

use crate::types::AssetPath;

/// Runtime tag naming the concrete resource type a key addresses.
///
/// The backend decides which tags denote poolable resource types; the
/// registry rejects operations on tags that fail that predicate.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeTag(&'static str);

impl TypeTag {
    /// Create a tag from a static type name.
    #[inline]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Get the tag's type name.
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeTag({})", self.0)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where the template backing a sub-pool comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadSource {
    /// Loaded from the resource database by asset path.
    Resource,
    /// Supplied externally via explicit registration.
    Custom,
    /// Loaded out of a named bundle.
    Bundle,
}

impl LoadSource {
    /// Whether this source addresses templates through a bundle name.
    #[inline]
    pub const fn uses_bundle(&self) -> bool {
        matches!(self, LoadSource::Bundle)
    }
}

impl fmt::Display for LoadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoadSource::Resource => "resource",
            LoadSource::Custom => "custom",
            LoadSource::Bundle => "bundle",
        };
        write!(f, "{}", name)
    }
}

/// Composite address of one sub-pool: type tag, load source, template id.
///
/// The bundle dimension is normalized away at construction for sources
/// that do not use bundles, so two keys are equal iff they resolve to the
/// same template and produce interchangeable instances. Keys are immutable
/// once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PoolKey {
    tag: TypeTag,
    source: LoadSource,
    bundle: Option<AssetPath>,
    asset: AssetPath,
}

impl PoolKey {
    /// Build a key, dropping the bundle name unless the source uses one.
    pub fn new(
        tag: TypeTag,
        source: LoadSource,
        bundle: Option<AssetPath>,
        asset: AssetPath,
    ) -> Self {
        Self {
            tag,
            source,
            bundle: if source.uses_bundle() { bundle } else { None },
            asset,
        }
    }

    /// Shorthand for a resource-database key.
    pub fn resource(tag: TypeTag, asset: AssetPath) -> Self {
        Self::new(tag, LoadSource::Resource, None, asset)
    }

    /// Shorthand for a custom-source key.
    pub fn custom(tag: TypeTag, asset: AssetPath) -> Self {
        Self::new(tag, LoadSource::Custom, None, asset)
    }

    /// Shorthand for a bundle key.
    pub fn bundle(tag: TypeTag, bundle: AssetPath, asset: AssetPath) -> Self {
        Self::new(tag, LoadSource::Bundle, Some(bundle), asset)
    }

    #[inline]
    pub fn type_tag(&self) -> TypeTag {
        self.tag
    }

    #[inline]
    pub fn source(&self) -> LoadSource {
        self.source
    }

    /// Bundle name; always `None` for sources that do not use bundles.
    #[inline]
    pub fn bundle_name(&self) -> Option<&AssetPath> {
        self.bundle.as_ref()
    }

    #[inline]
    pub fn asset(&self) -> &AssetPath {
        &self.asset
    }
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.bundle {
            Some(bundle) => write!(f, "{}:{}:{}/{}", self.tag, self.source, bundle, self.asset),
            None => write!(f, "{}:{}:{}", self.tag, self.source, self.asset),
        }
    }
}
