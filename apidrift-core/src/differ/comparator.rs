//! Comparator logic for diffing two resolved snapshots.
//!
//! Walks every module present on either side and applies the fixed rule
//! table. Class-likes are compared through their effective member tables so
//! a member that moved into a parent or trait is still considered present.

use std::collections::BTreeSet;

use tracing::debug;

use crate::config::AnalyzerConfig;
use crate::hierarchy::{ClassNode, EffectiveMember, MemberOrigin, ResolvedSnapshot};
use crate::registry::{class_lookup_key, ModuleIndex};
use crate::report::Report;
use crate::types::{member_key, normalize_name, ClassKind, Construct, MemberKind};

use super::domain;
use super::operation::{Operation, OperationCode};
use super::signature::{classify_type_change, compare_parameters};

/// Every thrown type is a subtype of this root.
const THROWABLE_ROOT: &str = "throwable";

fn class_removed_code(kind: ClassKind) -> OperationCode {
    match kind {
        ClassKind::Class => OperationCode::ClassRemoved,
        ClassKind::Interface => OperationCode::InterfaceRemoved,
        ClassKind::Trait => OperationCode::TraitRemoved,
    }
}

fn class_added_code(kind: ClassKind) -> OperationCode {
    match kind {
        ClassKind::Class => OperationCode::ClassAdded,
        ClassKind::Interface => OperationCode::InterfaceAdded,
        ClassKind::Trait => OperationCode::TraitAdded,
    }
}

fn member_removed_code(kind: MemberKind) -> OperationCode {
    match kind {
        MemberKind::Method => OperationCode::MethodRemoved,
        MemberKind::Property => OperationCode::PropertyRemoved,
        MemberKind::Constant => OperationCode::ConstantRemoved,
    }
}

fn member_added_code(kind: MemberKind) -> OperationCode {
    match kind {
        MemberKind::Method => OperationCode::MethodAdded,
        MemberKind::Property => OperationCode::PropertyAdded,
        MemberKind::Constant => OperationCode::ConstantAdded,
    }
}

fn visibility_code(kind: MemberKind) -> OperationCode {
    match kind {
        MemberKind::Method => OperationCode::MethodVisibilityReduced,
        MemberKind::Property => OperationCode::PropertyVisibilityReduced,
        MemberKind::Constant => OperationCode::ConstantVisibilityReduced,
    }
}

/// Compares a before snapshot against an after snapshot.
pub struct Comparator<'a> {
    before: &'a ResolvedSnapshot,
    after: &'a ResolvedSnapshot,
    config: &'a AnalyzerConfig,
}

impl<'a> Comparator<'a> {
    pub fn new(
        before: &'a ResolvedSnapshot,
        after: &'a ResolvedSnapshot,
        config: &'a AnalyzerConfig,
    ) -> Self {
        Self {
            before,
            after,
            config,
        }
    }

    /// Run every rule and collect the ordered report.
    pub fn compare(&self) -> Report {
        let mut ops = Vec::new();

        let modules: BTreeSet<&str> = self
            .before
            .registry
            .module_names()
            .chain(self.after.registry.module_names())
            .collect();
        for module in modules {
            self.compare_module(module, &mut ops);
        }

        for ambiguity in &self.after.graph.ambiguities {
            ops.push(
                Operation::new(
                    OperationCode::AmbiguousTraitMember,
                    &ambiguity.module,
                    member_key(&ambiguity.class, &ambiguity.member),
                )
                .at(&ambiguity.location)
                .because(format!(
                    "{} is provided by {} with no resolution",
                    ambiguity.member,
                    ambiguity.traits.join(", ")
                )),
            );
        }

        let diagnostics = self
            .before
            .graph
            .diagnostics
            .iter()
            .chain(&self.after.graph.diagnostics)
            .cloned()
            .collect();

        debug!(operations = ops.len(), "comparison finished");
        Report::new(ops, diagnostics)
    }

    fn compare_module(&self, module: &str, ops: &mut Vec<Operation>) {
        let empty = ModuleIndex::new();
        let before = self.before.registry.module(module).unwrap_or(&empty);
        let after = self.after.registry.module(module).unwrap_or(&empty);

        for (key, old) in before {
            match after.get(key) {
                None => self.construct_removed(module, key, old, ops),
                Some(new) => match (old, new) {
                    (Construct::ClassLike(a), Construct::ClassLike(b)) if a.kind == b.kind => {
                        self.compare_class(module, key, ops)
                    }
                    (Construct::ClassLike(_), _) | (_, Construct::ClassLike(_)) => {
                        self.construct_removed(module, key, old, ops);
                        self.construct_added(module, key, new, ops);
                    }
                    // Presence-only: same key means same element.
                    _ => {}
                },
            }
        }

        for (key, new) in after {
            if !before.contains_key(key) {
                self.construct_added(module, key, new, ops);
            }
        }
    }

    fn construct_removed(&self, module: &str, key: &str, construct: &Construct, ops: &mut Vec<Operation>) {
        let Construct::ClassLike(class) = construct else {
            ops.extend(domain::removed(module, key, construct));
            return;
        };
        let is_api = self
            .before
            .graph
            .class(module, key)
            .map(|node| node.is_api)
            .unwrap_or(class.is_api);

        if is_api {
            ops.push(
                Operation::new(class_removed_code(class.kind), module, key)
                    .at(&class.location)
                    .because(format!("{} {} was removed", class.kind.as_str(), key)),
            );
        } else if self.config.reports_internal_removals() {
            ops.push(
                Operation::new(OperationCode::InternalConstructRemoved, module, key)
                    .at(&class.location)
                    .because(format!("non-API {} {} was removed", class.kind.as_str(), key)),
            );
        }
    }

    fn construct_added(&self, module: &str, key: &str, construct: &Construct, ops: &mut Vec<Operation>) {
        let Construct::ClassLike(class) = construct else {
            ops.extend(domain::added(module, key, construct));
            return;
        };
        let is_api = self
            .after
            .graph
            .class(module, key)
            .map(|node| node.is_api)
            .unwrap_or(class.is_api);

        if is_api {
            ops.push(
                Operation::new(class_added_code(class.kind), module, key)
                    .at(&class.location)
                    .because(format!("{} {} was added", class.kind.as_str(), key)),
            );
        }
    }

    fn compare_class(&self, module: &str, key: &str, ops: &mut Vec<Operation>) {
        let (Some(old), Some(new)) = (
            self.before.graph.class(module, key),
            self.after.graph.class(module, key),
        ) else {
            return;
        };

        if old.is_api {
            self.compare_class_shape(module, old, new, ops);
        }
        if new.is_api {
            for (lookup, name) in &new.all_interfaces {
                if !old.all_interfaces.contains_key(lookup) {
                    ops.push(
                        Operation::new(OperationCode::ClassInterfaceAdded, module, key)
                            .at(&new.location)
                            .because(format!("{} now implements {}", key, name)),
                    );
                }
            }
        }

        for (id, member) in &old.members {
            if !member.origin.is_owned() {
                continue;
            }
            match new.members.get(id) {
                Some(current) => self.compare_member(module, old, member, current, ops),
                None if new.has_opaque_ancestry => {
                    debug!(
                        class = key,
                        member = id.as_str(),
                        "member missing behind an unresolved ancestor, assumed present"
                    );
                }
                None => self.member_removed(module, old, member, ops),
            }
        }

        for (id, member) in &new.members {
            if member.origin.is_owned() && member.is_api && !old.members.contains_key(id) {
                let target = member_key(key, &member.def.key_name());
                ops.push(
                    Operation::new(member_added_code(member.def.kind), module, target)
                        .at(&member.def.location)
                        .because(format!("{} {} was added", member.def.kind.as_str(), member.def.key_name())),
                );
            }
        }
    }

    /// Final, parent and interface rules for an API class-like.
    fn compare_class_shape(&self, module: &str, old: &ClassNode, new: &ClassNode, ops: &mut Vec<Operation>) {
        let key = old.key.as_str();

        if old.kind == ClassKind::Class && !old.is_final && new.is_final {
            ops.push(
                Operation::new(OperationCode::ClassFinalAdded, module, key)
                    .at(&new.location)
                    .because(format!("{} was made final", key)),
            );
        }

        if let Some(parent) = &old.parent {
            let still_inherits = new.lineage.contains(&class_lookup_key(parent.name()));
            let unknowable = new.parent.is_some() && new.has_opaque_ancestry;
            if !still_inherits && !unknowable {
                ops.push(
                    Operation::new(OperationCode::ClassParentRemoved, module, key)
                        .at(&new.location)
                        .because(format!("{} no longer extends {}", key, parent.name())),
                );
            }
        }

        if !new.has_opaque_ancestry {
            for (lookup, name) in &old.all_interfaces {
                if !new.all_interfaces.contains_key(lookup) {
                    ops.push(
                        Operation::new(OperationCode::ClassInterfaceRemoved, module, key)
                            .at(&new.location)
                            .because(format!("{} no longer implements {}", key, name)),
                    );
                }
            }
        }
    }

    fn member_removed(&self, module: &str, class: &ClassNode, member: &EffectiveMember, ops: &mut Vec<Operation>) {
        let key_name = member.def.key_name();
        let target = member_key(&class.key, &key_name);
        let kind = member.def.kind.as_str();

        if member.is_api {
            ops.push(
                Operation::new(member_removed_code(member.def.kind), module, target)
                    .at(&member.def.location)
                    .because(format!("{} {} was removed", kind, key_name)),
            );
        } else if self.config.reports_internal_removals()
            && member.def.visibility != crate::types::Visibility::Private
        {
            ops.push(
                Operation::new(OperationCode::InternalMemberRemoved, module, target)
                    .at(&member.def.location)
                    .because(format!("non-API {} {} was removed", kind, key_name)),
            );
        }
    }

    fn compare_member(
        &self,
        module: &str,
        class: &ClassNode,
        old: &EffectiveMember,
        new: &EffectiveMember,
        ops: &mut Vec<Operation>,
    ) {
        if !old.is_api {
            return;
        }
        if self.config.exempt_lifecycle_members && (old.def.is_lifecycle || new.def.is_lifecycle) {
            return;
        }

        let target = member_key(&class.key, &old.def.key_name());
        let location = &new.def.location;
        let kind = old.def.kind;
        let mut emit = |code: OperationCode, reason: String| {
            ops.push(
                Operation::new(code, module, target.clone())
                    .at(location)
                    .because(reason),
            );
        };

        if new.def.visibility.is_narrower_than(old.def.visibility) {
            emit(
                visibility_code(kind),
                format!(
                    "visibility reduced from {} to {}",
                    old.def.visibility, new.def.visibility
                ),
            );
        }

        // Both copies come from the same trait; the trait itself carries the change.
        if let (MemberOrigin::Trait(a), MemberOrigin::Trait(b)) = (&old.origin, &new.origin) {
            if a == b {
                return;
            }
        }

        let is_subtype = |sub: &str, sup: &str| self.is_subtype(sub, sup);
        let type_change = classify_type_change(&old.def.return_type, &new.def.return_type, &is_subtype);
        let type_reason = || {
            format!(
                "type changed from '{}' to '{}'",
                old.def.return_type.effective().unwrap_or("mixed"),
                new.def.return_type.effective().unwrap_or("mixed")
            )
        };

        match kind {
            MemberKind::Method => {
                if !old.def.is_final && new.def.is_final {
                    emit(OperationCode::MethodMadeFinal, "method was made final".to_string());
                }
                if old.def.is_static != new.def.is_static {
                    emit(
                        OperationCode::MethodStaticChanged,
                        static_reason(new.def.is_static),
                    );
                }
                for finding in compare_parameters(&old.def.parameters, &new.def.parameters, &is_subtype) {
                    emit(finding.code, finding.reason);
                }
                if type_change.is_breaking() {
                    emit(OperationCode::MethodReturnTypeChanged, format!("return {}", type_reason()));
                }
                for (code, reason) in self.compare_throws(&old.def.throws, &new.def.throws) {
                    emit(code, reason);
                }
            }
            MemberKind::Property => {
                if old.def.is_static != new.def.is_static {
                    emit(
                        OperationCode::PropertyStaticChanged,
                        static_reason(new.def.is_static),
                    );
                }
                if type_change.is_breaking() {
                    emit(OperationCode::PropertyTypeChanged, type_reason());
                }
            }
            MemberKind::Constant => {
                if type_change.is_breaking() {
                    emit(OperationCode::ConstantTypeChanged, type_reason());
                }
            }
        }
    }

    /// Thrown-type rules. Equal or broader replacements are fine, removals
    /// are fine, a subtype replacement narrows the contract.
    fn compare_throws(&self, old: &[String], new: &[String]) -> Vec<(OperationCode, String)> {
        let old: Vec<String> = old
            .iter()
            .map(|t| normalize_name(t))
            .filter(|t| !t.is_empty())
            .collect();
        if old.is_empty() {
            return Vec::new();
        }

        let mut findings = Vec::new();
        for thrown in new.iter().map(|t| normalize_name(t)).filter(|t| !t.is_empty()) {
            let lookup = class_lookup_key(&thrown);
            if old.iter().any(|o| class_lookup_key(o) == lookup) {
                continue;
            }
            if let Some(base) = old.iter().find(|o| self.throws_subtype(&thrown, o)) {
                findings.push((
                    OperationCode::MethodExceptionNarrowed,
                    format!("throws {} instead of broader {}", thrown, base),
                ));
            } else if old.iter().any(|o| self.throws_subtype(o, &thrown)) {
                continue;
            } else {
                findings.push((
                    OperationCode::MethodExceptionChanged,
                    format!("throws unrelated {} instead of {}", thrown, old.join(", ")),
                ));
            }
        }
        findings
    }

    fn throws_subtype(&self, sub: &str, sup: &str) -> bool {
        class_lookup_key(sup) == THROWABLE_ROOT || self.is_subtype(sub, sup)
    }

    /// Subtype check against the after hierarchy, falling back to before.
    fn is_subtype(&self, sub: &str, sup: &str) -> bool {
        self.after
            .graph
            .is_subtype(sub, sup)
            .or_else(|| self.before.graph.is_subtype(sub, sup))
            .unwrap_or(false)
    }
}

fn static_reason(now_static: bool) -> String {
    if now_static {
        "changed from instance to static".to_string()
    } else {
        "changed from static to instance".to_string()
    }
}
