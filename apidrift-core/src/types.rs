//! Data models for parsed constructs.
//!
//! These types are what the parser collaborator hands to the engine: one
//! [`ModuleStream`] per declaring module, each holding the declared
//! [`Construct`]s of one snapshot side. They carry declared structure only;
//! nothing here knows about inheritance or effective API status.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Member or construct visibility.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Private => "private",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Visibility::Public => 2,
            Visibility::Protected => 1,
            Visibility::Private => 0,
        }
    }

    /// True when `self` exposes strictly less than `other`.
    pub fn is_narrower_than(&self, other: Visibility) -> bool {
        self.rank() < other.rank()
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a construct was declared.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    #[serde(default)]
    pub line: u32,
}

impl Location {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line > 0 {
            write!(f, "{}:{}", self.file, self.line)
        } else {
            f.write_str(&self.file)
        }
    }
}

/// A type annotation as declared, split by provenance.
///
/// `native` is the language-level declaration, `doc` the documentation-only
/// one. The effective type prefers `native`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeHint {
    #[serde(default)]
    pub native: Option<String>,
    #[serde(default)]
    pub doc: Option<String>,
}

impl TypeHint {
    pub fn native(ty: impl Into<String>) -> Self {
        Self {
            native: Some(ty.into()),
            doc: None,
        }
    }

    pub fn doc(ty: impl Into<String>) -> Self {
        Self {
            native: None,
            doc: Some(ty.into()),
        }
    }

    /// The type the engine reasons about.
    pub fn effective(&self) -> Option<&str> {
        self.native
            .as_deref()
            .or(self.doc.as_deref())
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    pub fn is_declared(&self) -> bool {
        self.effective().is_some()
    }
}

/// A function/method parameter.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDef {
    pub name: String,
    #[serde(default)]
    pub type_hint: TypeHint,
    /// Default value source text, when one is declared.
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub is_variadic: bool,
}

impl ParameterDef {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_default(name: impl Into<String>, default: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: Some(default.into()),
            optional: true,
            ..Default::default()
        }
    }

    pub fn typed(mut self, hint: TypeHint) -> Self {
        self.type_hint = hint;
        self
    }

    /// Callers may omit this argument.
    pub fn is_optional(&self) -> bool {
        self.optional || self.default.is_some() || self.is_variadic
    }
}

/// Kind of nested declaration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    #[default]
    Method,
    Property,
    Constant,
}

impl MemberKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberKind::Method => "method",
            MemberKind::Property => "property",
            MemberKind::Constant => "constant",
        }
    }
}

/// A method, property or constant declared inside a class-like.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDef {
    pub name: String,
    #[serde(default)]
    pub kind: MemberKind,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub parameters: Vec<ParameterDef>,
    /// Return type for methods, declared type for properties and constants.
    #[serde(default)]
    pub return_type: TypeHint,
    #[serde(default)]
    pub throws: Vec<String>,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_final: bool,
    /// Locally tagged as API.
    #[serde(default)]
    pub is_api: bool,
    /// Constructor, destructor, serialization hook or similar fixed-contract member.
    #[serde(default)]
    pub is_lifecycle: bool,
    #[serde(default)]
    pub location: Location,
}

impl MemberDef {
    pub fn method(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Method,
            ..Default::default()
        }
    }

    pub fn property(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Property,
            ..Default::default()
        }
    }

    pub fn constant(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Constant,
            ..Default::default()
        }
    }

    /// Name as it appears after `::` in the member's unique key.
    ///
    /// Methods get a `()` suffix and properties a `$` prefix so a constant,
    /// a property and a method sharing a bare name never collide.
    pub fn key_name(&self) -> String {
        member_key_name(self.kind, &self.name)
    }

    /// Identity used to match a member across tables and snapshots.
    ///
    /// Method names are case-insensitive; property and constant names are not.
    pub fn identity(&self) -> String {
        match self.kind {
            MemberKind::Method => self.key_name().to_lowercase(),
            _ => self.key_name(),
        }
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_params(mut self, parameters: Vec<ParameterDef>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_return(mut self, hint: TypeHint) -> Self {
        self.return_type = hint;
        self
    }

    pub fn with_throws(mut self, throws: &[&str]) -> Self {
        self.throws = throws.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn api(mut self) -> Self {
        self.is_api = true;
        self
    }
}

/// Build the key suffix for a member of the given kind.
pub fn member_key_name(kind: MemberKind, name: &str) -> String {
    let name = name.trim_start_matches('$');
    match kind {
        MemberKind::Method => format!("{}()", name),
        MemberKind::Property => format!("${}", name),
        MemberKind::Constant => name.to_string(),
    }
}

/// Join a class-like key and a member key name.
pub fn member_key(class_key: &str, key_name: &str) -> String {
    format!("{}::{}", class_key, key_name)
}

/// Strip the leading namespace separator from a class-like reference.
pub fn normalize_name(name: &str) -> String {
    name.trim().trim_start_matches('\\').to_string()
}

/// Class, interface or trait.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassKind {
    #[default]
    Class,
    Interface,
    Trait,
}

impl ClassKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassKind::Class => "class",
            ClassKind::Interface => "interface",
            ClassKind::Trait => "trait",
        }
    }
}

/// Re-exposes a trait member under another name and/or visibility.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitAlias {
    /// Member name inside the trait.
    pub member: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub visibility: Option<Visibility>,
}

/// A `use` of a trait, with its conflict-resolution metadata.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitUse {
    pub name: String,
    /// Member names for which this trait wins over every other used trait.
    #[serde(default)]
    pub prefers: Vec<String>,
    #[serde(default)]
    pub aliases: Vec<TraitAlias>,
}

impl TraitUse {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// A class, interface or trait declaration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDef {
    /// Fully-qualified name.
    pub name: String,
    #[serde(default)]
    pub kind: ClassKind,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub traits: Vec<TraitUse>,
    #[serde(default)]
    pub members: Vec<MemberDef>,
    #[serde(default)]
    pub is_api: bool,
    #[serde(default)]
    pub is_final: bool,
    #[serde(default)]
    pub location: Location,
}

impl ClassDef {
    pub fn new(name: impl Into<String>, kind: ClassKind) -> Self {
        Self {
            name: name.into(),
            kind,
            ..Default::default()
        }
    }

    pub fn key(&self) -> String {
        normalize_name(&self.name)
    }

    pub fn extends(mut self, parent: &str) -> Self {
        self.parent = Some(parent.to_string());
        self
    }

    pub fn implements(mut self, interface: &str) -> Self {
        self.interfaces.push(interface.to_string());
        self
    }

    pub fn uses(mut self, trait_use: TraitUse) -> Self {
        self.traits.push(trait_use);
        self
    }

    pub fn with_member(mut self, member: MemberDef) -> Self {
        self.members.push(member);
        self
    }

    pub fn api(mut self) -> Self {
        self.is_api = true;
        self
    }
}

/// Layout element kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    Block,
    Container,
    Update,
}

/// Style rule kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleKind {
    Mixin,
    Variable,
    Import,
}

/// Schema element kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaKind {
    VirtualType,
    Entry,
}

/// Test artifact kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestKind {
    Page,
    Section,
}

/// Every presence-only construct kind, flattened across families.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainKind {
    LayoutBlock,
    LayoutContainer,
    LayoutUpdate,
    StyleMixin,
    StyleVariable,
    StyleImport,
    SchemaVirtualType,
    SchemaEntry,
    TestPage,
    TestSection,
}

impl DomainKind {
    pub const ALL: [DomainKind; 10] = [
        DomainKind::LayoutBlock,
        DomainKind::LayoutContainer,
        DomainKind::LayoutUpdate,
        DomainKind::StyleMixin,
        DomainKind::StyleVariable,
        DomainKind::StyleImport,
        DomainKind::SchemaVirtualType,
        DomainKind::SchemaEntry,
        DomainKind::TestPage,
        DomainKind::TestSection,
    ];

    /// Construct family the kind belongs to.
    pub fn family(&self) -> &'static str {
        match self {
            DomainKind::LayoutBlock | DomainKind::LayoutContainer | DomainKind::LayoutUpdate => {
                "layout"
            }
            DomainKind::StyleMixin | DomainKind::StyleVariable | DomainKind::StyleImport => "style",
            DomainKind::SchemaVirtualType | DomainKind::SchemaEntry => "schema",
            DomainKind::TestPage | DomainKind::TestSection => "test",
        }
    }

    /// Key prefix; also the human-readable kind name.
    pub fn prefix(&self) -> &'static str {
        match self {
            DomainKind::LayoutBlock => "layout.block",
            DomainKind::LayoutContainer => "layout.container",
            DomainKind::LayoutUpdate => "layout.update",
            DomainKind::StyleMixin => "style.mixin",
            DomainKind::StyleVariable => "style.variable",
            DomainKind::StyleImport => "style.import",
            DomainKind::SchemaVirtualType => "schema.virtual_type",
            DomainKind::SchemaEntry => "schema.entry",
            DomainKind::TestPage => "test.page",
            DomainKind::TestSection => "test.section",
        }
    }
}

impl From<LayoutKind> for DomainKind {
    fn from(kind: LayoutKind) -> Self {
        match kind {
            LayoutKind::Block => DomainKind::LayoutBlock,
            LayoutKind::Container => DomainKind::LayoutContainer,
            LayoutKind::Update => DomainKind::LayoutUpdate,
        }
    }
}

impl From<StyleKind> for DomainKind {
    fn from(kind: StyleKind) -> Self {
        match kind {
            StyleKind::Mixin => DomainKind::StyleMixin,
            StyleKind::Variable => DomainKind::StyleVariable,
            StyleKind::Import => DomainKind::StyleImport,
        }
    }
}

impl From<SchemaKind> for DomainKind {
    fn from(kind: SchemaKind) -> Self {
        match kind {
            SchemaKind::VirtualType => DomainKind::SchemaVirtualType,
            SchemaKind::Entry => DomainKind::SchemaEntry,
        }
    }
}

impl From<TestKind> for DomainKind {
    fn from(kind: TestKind) -> Self {
        match kind {
            TestKind::Page => DomainKind::TestPage,
            TestKind::Section => DomainKind::TestSection,
        }
    }
}

/// A named element of a presence-only family.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementDef<K> {
    pub kind: K,
    /// Semantic name (block name, variable name, virtual type name, ...).
    pub name: String,
    #[serde(default)]
    pub location: Location,
}

impl<K> ElementDef<K> {
    pub fn new(kind: K, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            location: Location::default(),
        }
    }
}

pub type LayoutDef = ElementDef<LayoutKind>;
pub type StyleDef = ElementDef<StyleKind>;
pub type SchemaDef = ElementDef<SchemaKind>;
pub type TestDef = ElementDef<TestKind>;

/// A declared entity with a stable unique key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "construct", rename_all = "snake_case")]
pub enum Construct {
    ClassLike(ClassDef),
    Layout(LayoutDef),
    Style(StyleDef),
    Schema(SchemaDef),
    Test(TestDef),
}

impl Construct {
    /// Unique key within a module of one snapshot.
    pub fn key(&self) -> String {
        match self {
            Construct::ClassLike(class) => class.key(),
            _ => match (self.domain_kind(), self.domain_name()) {
                (Some(kind), Some(name)) => format!("{}:{}", kind.prefix(), name.trim()),
                _ => String::new(),
            },
        }
    }

    pub fn as_class(&self) -> Option<&ClassDef> {
        match self {
            Construct::ClassLike(class) => Some(class),
            _ => None,
        }
    }

    /// Flattened kind for presence-only constructs, `None` for class-likes.
    pub fn domain_kind(&self) -> Option<DomainKind> {
        match self {
            Construct::ClassLike(_) => None,
            Construct::Layout(el) => Some(el.kind.into()),
            Construct::Style(el) => Some(el.kind.into()),
            Construct::Schema(el) => Some(el.kind.into()),
            Construct::Test(el) => Some(el.kind.into()),
        }
    }

    fn domain_name(&self) -> Option<&str> {
        match self {
            Construct::ClassLike(_) => None,
            Construct::Layout(el) => Some(&el.name),
            Construct::Style(el) => Some(&el.name),
            Construct::Schema(el) => Some(&el.name),
            Construct::Test(el) => Some(&el.name),
        }
    }

    pub fn location(&self) -> &Location {
        match self {
            Construct::ClassLike(class) => &class.location,
            Construct::Layout(el) => &el.location,
            Construct::Style(el) => &el.location,
            Construct::Schema(el) => &el.location,
            Construct::Test(el) => &el.location,
        }
    }

    /// Human-readable kind ("class", "interface", "layout.block", ...).
    pub fn kind_name(&self) -> &'static str {
        match self {
            Construct::ClassLike(class) => class.kind.as_str(),
            _ => self.domain_kind().map(|k| k.prefix()).unwrap_or("construct"),
        }
    }
}

impl From<ClassDef> for Construct {
    fn from(class: ClassDef) -> Self {
        Construct::ClassLike(class)
    }
}

/// Parsed constructs of one module, one snapshot side.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleStream {
    pub module: String,
    #[serde(default)]
    pub constructs: Vec<Construct>,
}

impl ModuleStream {
    pub fn new(module: impl Into<String>, constructs: Vec<Construct>) -> Self {
        Self {
            module: module.into(),
            constructs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_narrowing() {
        assert!(Visibility::Private.is_narrower_than(Visibility::Public));
        assert!(Visibility::Protected.is_narrower_than(Visibility::Public));
        assert!(Visibility::Private.is_narrower_than(Visibility::Protected));
        assert!(!Visibility::Public.is_narrower_than(Visibility::Private));
        assert!(!Visibility::Public.is_narrower_than(Visibility::Public));
    }

    #[test]
    fn test_type_hint_prefers_native() {
        let hint = TypeHint {
            native: Some("int".to_string()),
            doc: Some("string".to_string()),
        };
        assert_eq!(hint.effective(), Some("int"));
        assert_eq!(TypeHint::doc("string").effective(), Some("string"));
        assert_eq!(TypeHint::native("  ").effective(), None);
        assert!(!TypeHint::default().is_declared());
    }

    #[test]
    fn test_parameter_optionality() {
        assert!(!ParameterDef::required("a").is_optional());
        assert!(ParameterDef::with_default("b", "null").is_optional());
        let variadic = ParameterDef {
            name: "rest".to_string(),
            is_variadic: true,
            ..Default::default()
        };
        assert!(variadic.is_optional());
    }

    #[test]
    fn test_member_key_names_do_not_collide() {
        assert_eq!(MemberDef::method("save").key_name(), "save()");
        assert_eq!(MemberDef::property("$data").key_name(), "$data");
        assert_eq!(MemberDef::property("data").key_name(), "$data");
        assert_eq!(MemberDef::constant("SAVE").key_name(), "SAVE");
        assert_eq!(member_key("Acme\\Repo", "save()"), "Acme\\Repo::save()");
        assert_eq!(MemberDef::method("getName").identity(), "getname()");
        assert_eq!(MemberDef::constant("Name").identity(), "Name");
    }

    #[test]
    fn test_construct_keys() {
        let class = Construct::from(ClassDef::new("\\Acme\\Repo", ClassKind::Class));
        assert_eq!(class.key(), "Acme\\Repo");
        assert_eq!(class.kind_name(), "class");

        let block = Construct::Layout(LayoutDef::new(LayoutKind::Block, "product.info"));
        assert_eq!(block.key(), "layout.block:product.info");
        assert_eq!(block.domain_kind(), Some(DomainKind::LayoutBlock));

        let vtype = Construct::Schema(SchemaDef::new(SchemaKind::VirtualType, "CatalogSearch"));
        assert_eq!(vtype.key(), "schema.virtual_type:CatalogSearch");
    }

    #[test]
    fn test_module_stream_deserialization() {
        let json = r#"{
            "module": "Acme_Catalog",
            "constructs": [
                {"construct": "class_like", "name": "Acme\\Catalog\\Repo", "kind": "class", "is_api": true,
                 "members": [{"name": "save", "parameters": [{"name": "entity"}]}]},
                {"construct": "style", "kind": "variable", "name": "@primary-color"}
            ]
        }"#;
        let stream: ModuleStream = serde_json::from_str(json).unwrap();
        assert_eq!(stream.module, "Acme_Catalog");
        assert_eq!(stream.constructs.len(), 2);
        let class = stream.constructs[0].as_class().unwrap();
        assert!(class.is_api);
        assert_eq!(class.members[0].kind, MemberKind::Method);
        assert_eq!(stream.constructs[1].key(), "style.variable:@primary-color");
    }
}
