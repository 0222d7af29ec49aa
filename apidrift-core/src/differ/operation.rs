//! Operation taxonomy: change codes, their fixed severities, and the
//! operation record the comparator emits.
//!
//! The code -> severity mapping is total and static. Codes are append-only:
//! a code string is never reassigned to a different rule.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

use crate::types::{DomainKind, Location};

/// Semantic-versioning impact of a change.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// No reportable API effect.
    #[default]
    Patch,
    /// Backward-compatible addition.
    Minor,
    /// Breaking change.
    Major,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Patch => "patch",
            Severity::Minor => "minor",
            Severity::Major => "major",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "patch" => Ok(Severity::Patch),
            "minor" => Ok(Severity::Minor),
            "major" => Ok(Severity::Major),
            other => Err(format!("unknown severity '{}'", other)),
        }
    }
}

/// Every rule the comparator can fire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OperationCode {
    ClassRemoved,
    InterfaceRemoved,
    TraitRemoved,
    ClassAdded,
    InterfaceAdded,
    TraitAdded,
    ClassFinalAdded,
    ClassParentRemoved,
    ClassInterfaceRemoved,
    ClassInterfaceAdded,
    InternalConstructRemoved,

    MethodRemoved,
    MethodAdded,
    MethodVisibilityReduced,
    MethodMadeFinal,
    MethodStaticChanged,
    MethodParameterAdded,
    MethodOptionalParameterAdded,
    MethodParameterRemoved,
    MethodParameterReordered,
    MethodParameterMadeRequired,
    MethodParameterTypeChanged,
    MethodParameterDefaultChanged,
    MethodReturnTypeChanged,
    MethodExceptionNarrowed,
    MethodExceptionChanged,

    PropertyRemoved,
    PropertyAdded,
    PropertyVisibilityReduced,
    PropertyTypeChanged,
    PropertyStaticChanged,

    ConstantRemoved,
    ConstantAdded,
    ConstantVisibilityReduced,
    ConstantTypeChanged,

    InternalMemberRemoved,

    AmbiguousTraitMember,

    ElementRemoved(DomainKind),
    ElementAdded(DomainKind),
}

impl OperationCode {
    /// Every code that does not carry a domain kind, in declaration order.
    pub const ALL_STATIC: [OperationCode; 37] = [
        OperationCode::ClassRemoved,
        OperationCode::InterfaceRemoved,
        OperationCode::TraitRemoved,
        OperationCode::ClassAdded,
        OperationCode::InterfaceAdded,
        OperationCode::TraitAdded,
        OperationCode::ClassFinalAdded,
        OperationCode::ClassParentRemoved,
        OperationCode::ClassInterfaceRemoved,
        OperationCode::ClassInterfaceAdded,
        OperationCode::InternalConstructRemoved,
        OperationCode::MethodRemoved,
        OperationCode::MethodAdded,
        OperationCode::MethodVisibilityReduced,
        OperationCode::MethodMadeFinal,
        OperationCode::MethodStaticChanged,
        OperationCode::MethodParameterAdded,
        OperationCode::MethodOptionalParameterAdded,
        OperationCode::MethodParameterRemoved,
        OperationCode::MethodParameterReordered,
        OperationCode::MethodParameterMadeRequired,
        OperationCode::MethodParameterTypeChanged,
        OperationCode::MethodParameterDefaultChanged,
        OperationCode::MethodReturnTypeChanged,
        OperationCode::MethodExceptionNarrowed,
        OperationCode::MethodExceptionChanged,
        OperationCode::PropertyRemoved,
        OperationCode::PropertyAdded,
        OperationCode::PropertyVisibilityReduced,
        OperationCode::PropertyTypeChanged,
        OperationCode::PropertyStaticChanged,
        OperationCode::ConstantRemoved,
        OperationCode::ConstantAdded,
        OperationCode::ConstantVisibilityReduced,
        OperationCode::ConstantTypeChanged,
        OperationCode::InternalMemberRemoved,
        OperationCode::AmbiguousTraitMember,
    ];

    /// Every code, domain kinds expanded.
    pub fn all() -> Vec<OperationCode> {
        let mut codes = OperationCode::ALL_STATIC.to_vec();
        for kind in DomainKind::ALL {
            codes.push(OperationCode::ElementRemoved(kind));
            codes.push(OperationCode::ElementAdded(kind));
        }
        codes
    }

    /// Stable identifier.
    pub fn code(&self) -> &'static str {
        match self {
            OperationCode::ClassRemoved => "class.removed",
            OperationCode::InterfaceRemoved => "interface.removed",
            OperationCode::TraitRemoved => "trait.removed",
            OperationCode::ClassAdded => "class.added",
            OperationCode::InterfaceAdded => "interface.added",
            OperationCode::TraitAdded => "trait.added",
            OperationCode::ClassFinalAdded => "class.final_added",
            OperationCode::ClassParentRemoved => "class.parent_removed",
            OperationCode::ClassInterfaceRemoved => "class.interface_removed",
            OperationCode::ClassInterfaceAdded => "class.interface_added",
            OperationCode::InternalConstructRemoved => "internal.construct_removed",
            OperationCode::MethodRemoved => "method.removed",
            OperationCode::MethodAdded => "method.added",
            OperationCode::MethodVisibilityReduced => "method.visibility_reduced",
            OperationCode::MethodMadeFinal => "method.final_added",
            OperationCode::MethodStaticChanged => "method.static_changed",
            OperationCode::MethodParameterAdded => "method.parameter_added",
            OperationCode::MethodOptionalParameterAdded => "method.optional_parameter_added",
            OperationCode::MethodParameterRemoved => "method.parameter_removed",
            OperationCode::MethodParameterReordered => "method.parameter_reordered",
            OperationCode::MethodParameterMadeRequired => "method.parameter_made_required",
            OperationCode::MethodParameterTypeChanged => "method.parameter_type_changed",
            OperationCode::MethodParameterDefaultChanged => "method.parameter_default_changed",
            OperationCode::MethodReturnTypeChanged => "method.return_type_changed",
            OperationCode::MethodExceptionNarrowed => "method.exception_narrowed",
            OperationCode::MethodExceptionChanged => "method.exception_changed",
            OperationCode::PropertyRemoved => "property.removed",
            OperationCode::PropertyAdded => "property.added",
            OperationCode::PropertyVisibilityReduced => "property.visibility_reduced",
            OperationCode::PropertyTypeChanged => "property.type_changed",
            OperationCode::PropertyStaticChanged => "property.static_changed",
            OperationCode::ConstantRemoved => "constant.removed",
            OperationCode::ConstantAdded => "constant.added",
            OperationCode::ConstantVisibilityReduced => "constant.visibility_reduced",
            OperationCode::ConstantTypeChanged => "constant.type_changed",
            OperationCode::InternalMemberRemoved => "internal.member_removed",
            OperationCode::AmbiguousTraitMember => "warning.ambiguous_trait_member",
            OperationCode::ElementRemoved(kind) => element_code(*kind, true),
            OperationCode::ElementAdded(kind) => element_code(*kind, false),
        }
    }

    pub fn severity(&self) -> Severity {
        use OperationCode::*;
        match self {
            ClassAdded
            | InterfaceAdded
            | TraitAdded
            | ClassInterfaceAdded
            | InternalConstructRemoved
            | MethodAdded
            | MethodOptionalParameterAdded
            | PropertyAdded
            | ConstantAdded
            | InternalMemberRemoved
            | ElementAdded(_) => Severity::Minor,
            MethodParameterDefaultChanged | AmbiguousTraitMember => Severity::Patch,
            ClassRemoved
            | InterfaceRemoved
            | TraitRemoved
            | ClassFinalAdded
            | ClassParentRemoved
            | ClassInterfaceRemoved
            | MethodRemoved
            | MethodVisibilityReduced
            | MethodMadeFinal
            | MethodStaticChanged
            | MethodParameterAdded
            | MethodParameterRemoved
            | MethodParameterReordered
            | MethodParameterMadeRequired
            | MethodParameterTypeChanged
            | MethodReturnTypeChanged
            | MethodExceptionNarrowed
            | MethodExceptionChanged
            | PropertyRemoved
            | PropertyVisibilityReduced
            | PropertyTypeChanged
            | PropertyStaticChanged
            | ConstantRemoved
            | ConstantVisibilityReduced
            | ConstantTypeChanged
            | ElementRemoved(_) => Severity::Major,
        }
    }

    /// Report grouping.
    pub fn category(&self) -> &'static str {
        use OperationCode::*;
        match self {
            ClassRemoved | InterfaceRemoved | TraitRemoved | ClassAdded | InterfaceAdded
            | TraitAdded | ClassFinalAdded | ClassParentRemoved | ClassInterfaceRemoved
            | ClassInterfaceAdded => "class",
            MethodRemoved
            | MethodAdded
            | MethodVisibilityReduced
            | MethodMadeFinal
            | MethodStaticChanged
            | MethodParameterAdded
            | MethodOptionalParameterAdded
            | MethodParameterRemoved
            | MethodParameterReordered
            | MethodParameterMadeRequired
            | MethodParameterTypeChanged
            | MethodParameterDefaultChanged
            | MethodReturnTypeChanged
            | MethodExceptionNarrowed
            | MethodExceptionChanged => "method",
            PropertyRemoved | PropertyAdded | PropertyVisibilityReduced | PropertyTypeChanged
            | PropertyStaticChanged => "property",
            ConstantRemoved | ConstantAdded | ConstantVisibilityReduced | ConstantTypeChanged => {
                "constant"
            }
            InternalConstructRemoved | InternalMemberRemoved => "internal",
            AmbiguousTraitMember => "warning",
            ElementRemoved(kind) | ElementAdded(kind) => kind.family(),
        }
    }

    /// Advisory codes; they never decide a verdict.
    pub fn is_warning(&self) -> bool {
        matches!(self, OperationCode::AmbiguousTraitMember)
    }

    pub fn description(&self) -> &'static str {
        use OperationCode::*;
        match self {
            ClassRemoved => "Class was removed",
            InterfaceRemoved => "Interface was removed",
            TraitRemoved => "Trait was removed",
            ClassAdded => "Class was added",
            InterfaceAdded => "Interface was added",
            TraitAdded => "Trait was added",
            ClassFinalAdded => "Class was made final",
            ClassParentRemoved => "Class no longer extends its previous parent",
            ClassInterfaceRemoved => "Class no longer implements an interface",
            ClassInterfaceAdded => "Class implements a new interface",
            InternalConstructRemoved => "Non-API construct was removed",
            MethodRemoved => "Method was removed",
            MethodAdded => "Method was added",
            MethodVisibilityReduced => "Method visibility was reduced",
            MethodMadeFinal => "Method was made final",
            MethodStaticChanged => "Method switched between static and instance",
            MethodParameterAdded => "Required or non-trailing parameter was added",
            MethodOptionalParameterAdded => "Optional parameter was appended",
            MethodParameterRemoved => "Parameter was removed",
            MethodParameterReordered => "Parameters were reordered",
            MethodParameterMadeRequired => "Optional parameter was made required",
            MethodParameterTypeChanged => "Parameter type was narrowed or changed",
            MethodParameterDefaultChanged => "Parameter default value changed",
            MethodReturnTypeChanged => "Return type was declared, narrowed or changed",
            MethodExceptionNarrowed => "Thrown type was replaced by a subtype",
            MethodExceptionChanged => "Thrown type was replaced by an unrelated type",
            PropertyRemoved => "Property was removed",
            PropertyAdded => "Property was added",
            PropertyVisibilityReduced => "Property visibility was reduced",
            PropertyTypeChanged => "Property type was narrowed or changed",
            PropertyStaticChanged => "Property switched between static and instance",
            ConstantRemoved => "Constant was removed",
            ConstantAdded => "Constant was added",
            ConstantVisibilityReduced => "Constant visibility was reduced",
            ConstantTypeChanged => "Constant type was narrowed or changed",
            InternalMemberRemoved => "Non-API member was removed",
            AmbiguousTraitMember => "Member provided by several traits without resolution",
            ElementRemoved(_) => "Element was removed",
            ElementAdded(_) => "Element was added",
        }
    }
}

impl fmt::Display for OperationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for OperationCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

fn element_code(kind: DomainKind, removed: bool) -> &'static str {
    use DomainKind::*;
    match (kind, removed) {
        (LayoutBlock, true) => "layout.block.removed",
        (LayoutBlock, false) => "layout.block.added",
        (LayoutContainer, true) => "layout.container.removed",
        (LayoutContainer, false) => "layout.container.added",
        (LayoutUpdate, true) => "layout.update.removed",
        (LayoutUpdate, false) => "layout.update.added",
        (StyleMixin, true) => "style.mixin.removed",
        (StyleMixin, false) => "style.mixin.added",
        (StyleVariable, true) => "style.variable.removed",
        (StyleVariable, false) => "style.variable.added",
        (StyleImport, true) => "style.import.removed",
        (StyleImport, false) => "style.import.added",
        (SchemaVirtualType, true) => "schema.virtual_type.removed",
        (SchemaVirtualType, false) => "schema.virtual_type.added",
        (SchemaEntry, true) => "schema.entry.removed",
        (SchemaEntry, false) => "schema.entry.added",
        (TestPage, true) => "test.page.removed",
        (TestPage, false) => "test.page.added",
        (TestSection, true) => "test.section.removed",
        (TestSection, false) => "test.section.added",
    }
}

/// A single classified change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Operation {
    pub code: OperationCode,
    pub severity: Severity,
    /// Declaring module.
    pub module: String,
    /// Unique key of the affected construct or member.
    pub target: String,
    pub location: Location,
    /// Human-readable explanation.
    pub reason: String,
}

impl Operation {
    /// Create an operation; severity follows from the code.
    pub fn new(code: OperationCode, module: &str, target: impl Into<String>) -> Self {
        Self {
            code,
            severity: code.severity(),
            module: module.to_string(),
            target: target.into(),
            location: Location::default(),
            reason: code.description().to_string(),
        }
    }

    /// Set location.
    pub fn at(mut self, location: &Location) -> Self {
        self.location = location.clone();
        self
    }

    /// Set reason.
    pub fn because(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    pub fn category(&self) -> &'static str {
        self.code.category()
    }
}
