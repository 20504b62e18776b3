//! [`AttributeRegistry`]: pluggable attribute "views" that read and write a
//! per-file attribute map through a uniform `view:key` namespace
//! (spec.md 4.6).
//!
//! Each provider is a value satisfying [`AttributeProvider`] — the spec's
//! design notes call out that the original used virtual inheritance from a
//! base class; here that becomes plain delegation, the way the teacher
//! crate expresses NFSv3's `FileAttr`/`SetAttr` pairing as independent data
//! rather than a class hierarchy.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use indexmap::IndexMap;
use moka::sync::Cache;
use parking_lot::Mutex;

use crate::config::Features;
use crate::error::{Error, Result};
use crate::file::{File, FileType};

/// An attribute value stored in a file's attribute map.
///
/// Values are duck-typed: each provider validates and widens them itself
/// (spec.md 9, "Duck-typed attribute values") rather than relying on a
/// shared runtime type-introspection layer.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Bool(bool),
    Integer(i64),
    Long(i64),
    String(String),
    StringList(Vec<String>),
    Bytes(Vec<u8>),
    FileTime(SystemTime),
    Object(String),
}

impl AttrValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            AttrValue::Integer(n) | AttrValue::Long(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            AttrValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_file_time(&self) -> Option<SystemTime> {
        match self {
            AttrValue::FileTime(t) => Some(*t),
            _ => None,
        }
    }
}

/// A single attribute's descriptor: name, accepted kind, and whether it can
/// be written after creation and/or supplied at creation time.
#[derive(Debug, Clone, Copy)]
pub struct AttrDescriptor {
    pub name: &'static str,
    pub settable: bool,
    pub settable_at_create: bool,
}

/// A named group of attributes a caller may read or write together.
pub trait AttributeProvider: Send + Sync {
    /// The view's own name, e.g. `"basic"`, `"posix"`.
    fn name(&self) -> &'static str;

    /// Other view names this one inherits attributes from, in lookup order.
    fn inherits(&self) -> &[&'static str] {
        &[]
    }

    fn descriptors(&self) -> &[AttrDescriptor];

    /// Populates default values for a newly created file.
    fn initialize(&self, file: &File);

    /// Reads `key` (without the `view:` prefix) for `file`.
    fn get(&self, file: &File, key: &str) -> Option<AttrValue>;

    /// Writes `key` (without the `view:` prefix) on `file`, validating and
    /// widening `value` against this view's descriptor for `key`.
    fn set(&self, file: &File, key: &str, value: AttrValue) -> Result<()>;
}

/// The `defaultOwner`/`defaultGroup`/`defaultPermissions`/`defaultAclEntries`
/// fields of spec.md §6's Configuration object — threaded into the
/// `owner`/`posix`/`acl` providers so a configured file system actually
/// seeds new files with them (SPEC_FULL.md §3a), instead of each provider
/// hardcoding its own default.
#[derive(Debug, Clone)]
pub struct AttributeDefaults {
    pub owner: String,
    pub group: String,
    pub permissions: i64,
    pub acl_entries: Vec<String>,
}

impl Default for AttributeDefaults {
    fn default() -> AttributeDefaults {
        AttributeDefaults {
            owner: "root".to_owned(),
            group: "root".to_owned(),
            permissions: 0o644,
            acl_entries: Vec::new(),
        }
    }
}

/// Registry of enabled providers, resolving `view:key` lookups through each
/// view's declared inheritance chain.
pub struct AttributeRegistry {
    providers: IndexMap<&'static str, Box<dyn AttributeProvider>>,
}

impl AttributeRegistry {
    pub fn new() -> AttributeRegistry {
        AttributeRegistry { providers: IndexMap::new() }
    }

    /// Builds a registry with `basic` plus the requested extra views, using
    /// [`AttributeDefaults::default`] and every optional feature enabled to
    /// seed `owner`/`posix`/`acl`.
    pub fn with_views(views: &[&str]) -> AttributeRegistry {
        AttributeRegistry::with_views_and_defaults(views, &AttributeDefaults::default(), Features::all())
    }

    /// Builds a registry with `basic` plus the requested extra views,
    /// wiring in the inheritance chains spec.md 6 assumes
    /// (`unix` = `basic` + `owner` + `posix`, `posix` = `basic` + `owner`,
    /// `dos` = `basic`, `acl` = `owner`), seeding newly created files from
    /// `defaults` (spec.md §6, SPEC_FULL.md §3a). `features` gates
    /// `posix:group`/`unix:gid` writes behind `Features::GROUPS`, per
    /// spec.md §6's `supportedFeatures`.
    pub fn with_views_and_defaults(
        views: &[&str],
        defaults: &AttributeDefaults,
        features: Features,
    ) -> AttributeRegistry {
        let groups_supported = features.contains(Features::GROUPS);
        let mut registry = AttributeRegistry::new();
        registry.register(Box::new(BasicAttributeProvider));
        for view in views {
            match *view {
                "basic" => {}
                "owner" => registry.register(Box::new(OwnerAttributeProvider::new(defaults.owner.clone()))),
                "posix" => registry.register(Box::new(PosixAttributeProvider::new(
                    defaults.permissions,
                    defaults.group.clone(),
                    groups_supported,
                ))),
                "unix" => registry.register(Box::new(UnixAttributeProvider::new())),
                "dos" => registry.register(Box::new(DosAttributeProvider)),
                "acl" => registry.register(Box::new(AclAttributeProvider::new(defaults.acl_entries.clone()))),
                "user" => registry.register(Box::new(UserAttributeProvider)),
                other => tracing::warn!(view = other, "unknown attribute view requested, ignoring"),
            }
        }
        // `posix` and `unix` need `owner` present to delegate to.
        if registry.providers.contains_key("posix") && !registry.providers.contains_key("owner") {
            registry.register(Box::new(OwnerAttributeProvider::new(defaults.owner.clone())));
        }
        if registry.providers.contains_key("unix") {
            if !registry.providers.contains_key("owner") {
                registry.register(Box::new(OwnerAttributeProvider::new(defaults.owner.clone())));
            }
            if !registry.providers.contains_key("posix") {
                registry.register(Box::new(PosixAttributeProvider::new(
                    defaults.permissions,
                    defaults.group.clone(),
                    groups_supported,
                )));
            }
        }
        registry
    }

    pub fn register(&mut self, provider: Box<dyn AttributeProvider>) {
        self.providers.insert(provider.name(), provider);
    }

    pub fn is_enabled(&self, view: &str) -> bool {
        self.providers.contains_key(view)
    }

    /// Runs every enabled provider's `initialize` over a freshly allocated
    /// file (spec.md 3a, seeding defaults at creation time).
    pub fn initialize_all(&self, file: &File) {
        for provider in self.providers.values() {
            provider.initialize(file);
        }
    }

    fn chain(&self, view: &str) -> Vec<&str> {
        let mut order = vec![view];
        if let Some(provider) = self.providers.get(view) {
            order.extend(provider.inherits());
        }
        order
    }

    /// Reads `"view:key"`. Lookup policy: the named view first, then its
    /// inherited views in declared order.
    pub fn get(&self, file: &File, qualified_key: &str) -> Result<AttrValue> {
        let (view, key) = split_qualified(qualified_key)?;
        for candidate in self.chain(view) {
            if let Some(provider) = self.providers.get(candidate) {
                if let Some(value) = provider.get(file, key) {
                    return Ok(value);
                }
            }
        }
        Err(Error::invalid_argument(format!("unrecognized attribute {qualified_key:?}")))
    }

    /// Writes `"view:key"`, validated by whichever provider in the chain
    /// declares that attribute.
    pub fn set(&self, file: &File, qualified_key: &str, value: AttrValue) -> Result<()> {
        let (view, key) = split_qualified(qualified_key)?;
        for candidate in self.chain(view) {
            if let Some(provider) = self.providers.get(candidate) {
                if provider.descriptors().iter().any(|d| d.name == key) {
                    return provider.set(file, key, value);
                }
            }
        }
        Err(Error::invalid_argument(format!("unrecognized attribute {qualified_key:?}")))
    }

    /// Reads every attribute declared by `view` (plus its inherited views)
    /// as one map, as in `basic:*`.
    pub fn read_view(&self, file: &File, view: &str) -> Result<HashMap<String, AttrValue>> {
        if !self.providers.contains_key(view) {
            return Err(Error::invalid_argument(format!("unrecognized attribute view {view:?}")));
        }
        let mut out = HashMap::new();
        for candidate in self.chain(view) {
            if let Some(provider) = self.providers.get(candidate) {
                for descriptor in provider.descriptors() {
                    if let Some(value) = provider.get(file, descriptor.name) {
                        out.entry(descriptor.name.to_owned()).or_insert(value);
                    }
                }
            }
        }
        Ok(out)
    }
}

impl Default for AttributeRegistry {
    fn default() -> AttributeRegistry {
        AttributeRegistry::with_views(&["basic"])
    }
}

fn split_qualified(qualified_key: &str) -> Result<(&str, &str)> {
    qualified_key
        .split_once(':')
        .ok_or_else(|| Error::invalid_argument(format!("attribute key {qualified_key:?} is not `view:attr`")))
}

/// `basic`: the view every file always has — size, timestamps, file type,
/// and a human-readable file key (the inode id).
pub struct BasicAttributeProvider;

const BASIC_DESCRIPTORS: &[AttrDescriptor] = &[
    AttrDescriptor { name: "size", settable: false, settable_at_create: false },
    AttrDescriptor { name: "isDirectory", settable: false, settable_at_create: false },
    AttrDescriptor { name: "isRegularFile", settable: false, settable_at_create: false },
    AttrDescriptor { name: "isSymbolicLink", settable: false, settable_at_create: false },
    AttrDescriptor { name: "fileKey", settable: false, settable_at_create: false },
    AttrDescriptor { name: "creationTime", settable: true, settable_at_create: false },
    AttrDescriptor { name: "lastAccessTime", settable: true, settable_at_create: false },
    AttrDescriptor { name: "lastModifiedTime", settable: true, settable_at_create: false },
];

impl AttributeProvider for BasicAttributeProvider {
    fn name(&self) -> &'static str {
        "basic"
    }

    fn descriptors(&self) -> &[AttrDescriptor] {
        BASIC_DESCRIPTORS
    }

    fn initialize(&self, _file: &File) {
        // Timestamps and size live on `File` itself, not the attribute map.
    }

    fn get(&self, file: &File, key: &str) -> Option<AttrValue> {
        match key {
            "size" => Some(AttrValue::Long(file.size() as i64)),
            "isDirectory" => Some(AttrValue::Bool(file.file_type() == FileType::Directory)),
            "isRegularFile" => Some(AttrValue::Bool(file.file_type() == FileType::Regular)),
            "isSymbolicLink" => Some(AttrValue::Bool(file.file_type() == FileType::Symlink)),
            "fileKey" => Some(AttrValue::Long(file.id() as i64)),
            "creationTime" => Some(AttrValue::FileTime(file.created())),
            "lastAccessTime" => Some(AttrValue::FileTime(file.last_access())),
            "lastModifiedTime" => Some(AttrValue::FileTime(file.last_modified())),
            _ => None,
        }
    }

    fn set(&self, file: &File, key: &str, value: AttrValue) -> Result<()> {
        let time = value
            .as_file_time()
            .ok_or_else(|| Error::invalid_argument(format!("{key} requires a file time value")))?;
        match key {
            "creationTime" => file.set_created(time),
            "lastAccessTime" => file.set_last_access(time),
            "lastModifiedTime" => file.set_last_modified(time),
            _ => return Err(Error::invalid_argument(format!("basic:{key} is not settable"))),
        }
        Ok(())
    }
}

/// `owner`: a single free-form owner principal name, seeded from
/// [`AttributeDefaults::owner`] (spec.md §6 `defaultOwner`).
pub struct OwnerAttributeProvider {
    default_owner: String,
}

impl OwnerAttributeProvider {
    pub fn new(default_owner: impl Into<String>) -> OwnerAttributeProvider {
        OwnerAttributeProvider { default_owner: default_owner.into() }
    }
}

const OWNER_DESCRIPTORS: &[AttrDescriptor] =
    &[AttrDescriptor { name: "owner", settable: true, settable_at_create: true }];

impl AttributeProvider for OwnerAttributeProvider {
    fn name(&self) -> &'static str {
        "owner"
    }

    fn descriptors(&self) -> &[AttrDescriptor] {
        OWNER_DESCRIPTORS
    }

    fn initialize(&self, file: &File) {
        file.attributes_mut()
            .entry("owner:owner".to_owned())
            .or_insert(AttrValue::String(self.default_owner.clone()));
    }

    fn get(&self, file: &File, key: &str) -> Option<AttrValue> {
        (key == "owner").then(|| file.attributes().get("owner:owner").cloned()).flatten()
    }

    fn set(&self, file: &File, key: &str, value: AttrValue) -> Result<()> {
        if key != "owner" {
            return Err(Error::invalid_argument(format!("owner:{key} is not settable")));
        }
        let owner =
            value.as_str().ok_or_else(|| Error::invalid_argument("owner:owner requires a string".to_owned()))?;
        file.attributes_mut().insert("owner:owner".to_owned(), AttrValue::String(owner.to_owned()));
        Ok(())
    }
}

/// `posix`: POSIX permission bits and a free-form group principal, seeded
/// from [`AttributeDefaults::permissions`]/[`AttributeDefaults::group`]
/// (spec.md §6 `defaultPermissions`/`defaultGroup`). `group` writes are
/// refused with [`Error::Unsupported`] unless `Features::GROUPS` is enabled
/// (spec.md §6 `supportedFeatures`).
pub struct PosixAttributeProvider {
    default_permissions: i64,
    default_group: String,
    groups_supported: bool,
}

impl PosixAttributeProvider {
    pub fn new(
        default_permissions: i64,
        default_group: impl Into<String>,
        groups_supported: bool,
    ) -> PosixAttributeProvider {
        PosixAttributeProvider { default_permissions, default_group: default_group.into(), groups_supported }
    }
}

const POSIX_DESCRIPTORS: &[AttrDescriptor] = &[
    AttrDescriptor { name: "permissions", settable: true, settable_at_create: true },
    AttrDescriptor { name: "group", settable: true, settable_at_create: true },
];

impl AttributeProvider for PosixAttributeProvider {
    fn name(&self) -> &'static str {
        "posix"
    }

    fn inherits(&self) -> &[&'static str] {
        &["basic", "owner"]
    }

    fn descriptors(&self) -> &[AttrDescriptor] {
        POSIX_DESCRIPTORS
    }

    fn initialize(&self, file: &File) {
        let mut attrs = file.attributes_mut();
        attrs.entry("posix:permissions".to_owned()).or_insert(AttrValue::Integer(self.default_permissions));
        attrs.entry("posix:group".to_owned()).or_insert(AttrValue::String(self.default_group.clone()));
    }

    fn get(&self, file: &File, key: &str) -> Option<AttrValue> {
        match key {
            "permissions" => file.attributes().get("posix:permissions").cloned(),
            "group" => file.attributes().get("posix:group").cloned(),
            _ => None,
        }
    }

    fn set(&self, file: &File, key: &str, value: AttrValue) -> Result<()> {
        match key {
            "permissions" => {
                let mode = value
                    .as_integer()
                    .ok_or_else(|| Error::invalid_argument("posix:permissions requires an integer".to_owned()))?;
                file.attributes_mut().insert("posix:permissions".to_owned(), AttrValue::Integer(mode));
                Ok(())
            }
            "group" => {
                if !self.groups_supported {
                    return Err(Error::unsupported(
                        "group attributes are disabled for this file system".to_owned(),
                    ));
                }
                let group = value
                    .as_str()
                    .ok_or_else(|| Error::invalid_argument("posix:group requires a string".to_owned()))?;
                file.attributes_mut().insert("posix:group".to_owned(), AttrValue::String(group.to_owned()));
                Ok(())
            }
            _ => Err(Error::invalid_argument(format!("posix:{key} is not settable"))),
        }
    }
}

/// `unix`: derived attributes computed from other views rather than stored
/// directly — `uid`/`gid` come from a process-local incremental cache keyed
/// by principal name, `mode` from `posix:permissions`, `ino` from the file
/// id, and `nlink` from the live link count (spec.md 4.6).
pub struct UnixAttributeProvider {
    principal_ids: Mutex<PrincipalIdAllocator>,
}

struct PrincipalIdAllocator {
    cache: Cache<String, u32>,
    next: u32,
}

impl PrincipalIdAllocator {
    fn new() -> PrincipalIdAllocator {
        PrincipalIdAllocator { cache: Cache::new(10_000), next: 1 }
    }

    fn id_for(&mut self, principal: &str) -> u32 {
        if let Some(id) = self.cache.get(principal) {
            return id;
        }
        let id = self.next;
        self.next += 1;
        self.cache.insert(principal.to_owned(), id);
        id
    }
}

impl UnixAttributeProvider {
    pub fn new() -> UnixAttributeProvider {
        UnixAttributeProvider { principal_ids: Mutex::new(PrincipalIdAllocator::new()) }
    }
}

const UNIX_DESCRIPTORS: &[AttrDescriptor] = &[
    AttrDescriptor { name: "uid", settable: false, settable_at_create: false },
    AttrDescriptor { name: "gid", settable: false, settable_at_create: false },
    AttrDescriptor { name: "mode", settable: false, settable_at_create: false },
    AttrDescriptor { name: "ino", settable: false, settable_at_create: false },
    AttrDescriptor { name: "nlink", settable: false, settable_at_create: false },
    AttrDescriptor { name: "dev", settable: false, settable_at_create: false },
    AttrDescriptor { name: "rdev", settable: false, settable_at_create: false },
];

impl AttributeProvider for UnixAttributeProvider {
    fn name(&self) -> &'static str {
        "unix"
    }

    fn inherits(&self) -> &[&'static str] {
        &["basic", "posix", "owner"]
    }

    fn descriptors(&self) -> &[AttrDescriptor] {
        UNIX_DESCRIPTORS
    }

    fn initialize(&self, _file: &File) {
        // Entirely derived; nothing to seed.
    }

    fn get(&self, file: &File, key: &str) -> Option<AttrValue> {
        match key {
            "uid" => {
                let owner = file.attributes().get("owner:owner")?.as_str()?.to_owned();
                Some(AttrValue::Integer(self.principal_ids.lock().id_for(&owner) as i64))
            }
            "gid" => {
                let group = file.attributes().get("posix:group")?.as_str()?.to_owned();
                Some(AttrValue::Integer(self.principal_ids.lock().id_for(&group) as i64))
            }
            "mode" => {
                let mode = file.attributes().get("posix:permissions")?.as_integer()?;
                let type_bits: i64 = match file.file_type() {
                    FileType::Directory => 0o040000,
                    FileType::Regular => 0o100000,
                    FileType::Symlink => 0o120000,
                };
                Some(AttrValue::Integer(type_bits | mode))
            }
            "ino" => Some(AttrValue::Long(file.id() as i64)),
            "nlink" => Some(AttrValue::Integer(file.link_count() as i64)),
            "dev" | "rdev" => Some(AttrValue::Integer(1)),
            _ => None,
        }
    }

    fn set(&self, _file: &File, key: &str, _value: AttrValue) -> Result<()> {
        Err(Error::invalid_argument(format!("unix:{key} is derived and cannot be set directly")))
    }
}

/// `dos`: the legacy FAT/NTFS attribute bits.
pub struct DosAttributeProvider;

const DOS_DESCRIPTORS: &[AttrDescriptor] = &[
    AttrDescriptor { name: "readonly", settable: true, settable_at_create: true },
    AttrDescriptor { name: "hidden", settable: true, settable_at_create: true },
    AttrDescriptor { name: "archive", settable: true, settable_at_create: true },
    AttrDescriptor { name: "system", settable: true, settable_at_create: true },
];

impl AttributeProvider for DosAttributeProvider {
    fn name(&self) -> &'static str {
        "dos"
    }

    fn inherits(&self) -> &[&'static str] {
        &["basic"]
    }

    fn descriptors(&self) -> &[AttrDescriptor] {
        DOS_DESCRIPTORS
    }

    fn initialize(&self, file: &File) {
        let mut attrs = file.attributes_mut();
        for descriptor in DOS_DESCRIPTORS {
            attrs.entry(format!("dos:{}", descriptor.name)).or_insert(AttrValue::Bool(false));
        }
    }

    fn get(&self, file: &File, key: &str) -> Option<AttrValue> {
        file.attributes().get(&format!("dos:{key}")).cloned()
    }

    fn set(&self, file: &File, key: &str, value: AttrValue) -> Result<()> {
        let flag =
            value.as_bool().ok_or_else(|| Error::invalid_argument(format!("dos:{key} requires a bool")))?;
        file.attributes_mut().insert(format!("dos:{key}"), AttrValue::Bool(flag));
        Ok(())
    }
}

/// `acl`: a list of opaque ACL entry descriptions, seeded from
/// [`AttributeDefaults::acl_entries`] (spec.md §6 `defaultAclEntries`).
pub struct AclAttributeProvider {
    default_acl_entries: Vec<String>,
}

impl AclAttributeProvider {
    pub fn new(default_acl_entries: Vec<String>) -> AclAttributeProvider {
        AclAttributeProvider { default_acl_entries }
    }
}

const ACL_DESCRIPTORS: &[AttrDescriptor] =
    &[AttrDescriptor { name: "acl", settable: true, settable_at_create: true }];

impl AttributeProvider for AclAttributeProvider {
    fn name(&self) -> &'static str {
        "acl"
    }

    fn inherits(&self) -> &[&'static str] {
        &["owner"]
    }

    fn descriptors(&self) -> &[AttrDescriptor] {
        ACL_DESCRIPTORS
    }

    fn initialize(&self, file: &File) {
        file.attributes_mut()
            .entry("acl:acl".to_owned())
            .or_insert(AttrValue::StringList(self.default_acl_entries.clone()));
    }

    fn get(&self, file: &File, key: &str) -> Option<AttrValue> {
        (key == "acl").then(|| file.attributes().get("acl:acl").cloned()).flatten()
    }

    fn set(&self, file: &File, key: &str, value: AttrValue) -> Result<()> {
        if key != "acl" {
            return Err(Error::invalid_argument(format!("acl:{key} is not settable")));
        }
        match &value {
            AttrValue::StringList(_) => {
                file.attributes_mut().insert("acl:acl".to_owned(), value);
                Ok(())
            }
            _ => Err(Error::invalid_argument("acl:acl requires a list of entry strings".to_owned())),
        }
    }
}

/// `user`: free-form, caller-named attributes whose values are always byte
/// arrays (spec.md 4.6) — names are not declared ahead of time, so
/// `descriptors()` is empty and every key is accepted.
pub struct UserAttributeProvider;

impl AttributeProvider for UserAttributeProvider {
    fn name(&self) -> &'static str {
        "user"
    }

    fn descriptors(&self) -> &[AttrDescriptor] {
        &[]
    }

    fn initialize(&self, _file: &File) {}

    fn get(&self, file: &File, key: &str) -> Option<AttrValue> {
        file.attributes().get(&format!("user:{key}")).cloned()
    }

    fn set(&self, file: &File, key: &str, value: AttrValue) -> Result<()> {
        let bytes = value
            .as_bytes()
            .ok_or_else(|| Error::invalid_argument(format!("user:{key} requires a byte array")))?;
        file.attributes_mut().insert(format!("user:{key}"), AttrValue::Bytes(bytes.to_owned()));
        Ok(())
    }
}

impl AttributeRegistry {
    /// `user:*` bypasses descriptor-driven dispatch since names are
    /// caller-chosen; this override lets [`AttributeRegistry::set`] accept
    /// any `user:` key.
    pub fn set_any(&self, file: &File, qualified_key: &str, value: AttrValue) -> Result<()> {
        let (view, key) = split_qualified(qualified_key)?;
        if view == "user" {
            if let Some(provider) = self.providers.get("user") {
                return provider.set(file, key, value);
            }
        }
        self.set(file, qualified_key, value)
    }
}

pub fn unix_epoch() -> SystemTime {
    UNIX_EPOCH
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockPool;
    use std::sync::Arc;

    fn directory() -> File {
        File::new_directory(1, 1, Arc::new(BlockPool::new(8, 64)))
    }

    #[test]
    fn basic_view_reports_size_and_kind() {
        let registry = AttributeRegistry::default();
        let file = directory();
        registry.initialize_all(&file);
        assert_eq!(registry.get(&file, "basic:isDirectory").unwrap().as_bool(), Some(true));
    }

    #[test]
    fn unix_view_derives_mode_from_posix_permissions() {
        let registry = AttributeRegistry::with_views(&["unix"]);
        let file = directory();
        registry.initialize_all(&file);
        registry.set(&file, "posix:permissions", AttrValue::Integer(0o755)).unwrap();
        let mode = registry.get(&file, "unix:mode").unwrap().as_integer().unwrap();
        assert_eq!(mode & 0o777, 0o755);
        assert_eq!(mode & 0o040000, 0o040000);
    }

    #[test]
    fn unix_view_reaches_basic_attributes_through_inheritance() {
        let registry = AttributeRegistry::with_views(&["unix"]);
        let file = directory();
        registry.initialize_all(&file);
        assert_eq!(registry.get(&file, "unix:isDirectory").unwrap().as_bool(), Some(true));
        assert!(registry.read_view(&file, "unix").unwrap().contains_key("size"));
    }

    #[test]
    fn posix_view_reaches_basic_attributes_through_inheritance() {
        let registry = AttributeRegistry::with_views(&["posix"]);
        let file = directory();
        registry.initialize_all(&file);
        assert_eq!(registry.get(&file, "posix:isDirectory").unwrap().as_bool(), Some(true));
    }

    #[test]
    fn unix_uid_is_stable_for_repeated_lookups_of_same_owner() {
        let registry = AttributeRegistry::with_views(&["unix"]);
        let a = directory();
        let b = directory();
        registry.initialize_all(&a);
        registry.initialize_all(&b);
        let uid_a = registry.get(&a, "unix:uid").unwrap().as_integer().unwrap();
        let uid_b = registry.get(&b, "unix:uid").unwrap().as_integer().unwrap();
        assert_eq!(uid_a, uid_b);
    }

    #[test]
    fn user_view_round_trips_byte_array() {
        let registry = AttributeRegistry::with_views(&["user"]);
        let file = directory();
        registry.set_any(&file, "user:tag", AttrValue::Bytes(vec![1, 2, 3])).unwrap();
        let value = registry.get(&file, "user:tag").unwrap();
        assert_eq!(value.as_bytes(), Some(&[1, 2, 3][..]));
    }

    #[test]
    fn unrecognized_view_is_an_error() {
        let registry = AttributeRegistry::default();
        let file = directory();
        assert!(registry.get(&file, "nope:attr").is_err());
    }

    #[test]
    fn configured_defaults_seed_owner_group_permissions_and_acl() {
        let defaults = AttributeDefaults {
            owner: "alice".to_owned(),
            group: "staff".to_owned(),
            permissions: 0o600,
            acl_entries: vec!["alice:rw".to_owned()],
        };
        let registry = AttributeRegistry::with_views_and_defaults(&["unix", "acl"], &defaults, Features::all());
        let file = directory();
        registry.initialize_all(&file);

        assert_eq!(registry.get(&file, "owner:owner").unwrap().as_str(), Some("alice"));
        assert_eq!(registry.get(&file, "posix:group").unwrap().as_str(), Some("staff"));
        assert_eq!(registry.get(&file, "posix:permissions").unwrap().as_integer(), Some(0o600));
        assert!(matches!(
            registry.get(&file, "acl:acl").unwrap(),
            AttrValue::StringList(entries) if entries == vec!["alice:rw".to_owned()]
        ));
    }

    #[test]
    fn group_writes_are_refused_when_groups_feature_is_disabled() {
        let registry = AttributeRegistry::with_views_and_defaults(
            &["posix"],
            &AttributeDefaults::default(),
            Features::all() - Features::GROUPS,
        );
        let file = directory();
        registry.initialize_all(&file);
        let result = registry.set(&file, "posix:group", AttrValue::String("staff".to_owned()));
        assert!(matches!(result, Err(Error::Unsupported { .. })));
    }
}
