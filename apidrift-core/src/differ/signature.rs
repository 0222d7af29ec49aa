//! Type and signature comparison.
//!
//! Effective types come from [`TypeHint::effective`], so a type moved between
//! its native and documentation-only form with the same content compares
//! equal. Types are normalized into a [`TypeSet`] before comparison.

use std::collections::BTreeSet;

use crate::types::{ParameterDef, TypeHint};

use super::operation::OperationCode;

/// A normalized union type. `None` is the top type (absent hint or `mixed`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeSet(Option<BTreeSet<String>>);

impl TypeSet {
    pub fn of(hint: &TypeHint) -> Self {
        match hint.effective() {
            Some(ty) => Self::parse(ty),
            None => TypeSet(None),
        }
    }

    /// Split a union, expand `?T`, strip the namespace separator, fold case
    /// and map documentation aliases onto native names.
    pub fn parse(ty: &str) -> Self {
        let mut members = BTreeSet::new();
        for part in ty.split('|') {
            let mut part = part.trim();
            if part.is_empty() {
                continue;
            }
            if let Some(rest) = part.strip_prefix('?') {
                members.insert("null".to_string());
                part = rest.trim();
            }
            let name = part.trim_start_matches('\\').to_lowercase();
            let name = match name.as_str() {
                "integer" => "int".to_string(),
                "boolean" => "bool".to_string(),
                "double" | "real" => "float".to_string(),
                "callback" => "callable".to_string(),
                _ => name,
            };
            if name == "mixed" {
                return TypeSet(None);
            }
            members.insert(name);
        }
        if members.is_empty() {
            TypeSet(None)
        } else {
            TypeSet(Some(members))
        }
    }

    pub fn is_top(&self) -> bool {
        self.0.is_none()
    }

    pub fn members(&self) -> Option<&BTreeSet<String>> {
        self.0.as_ref()
    }

    /// Every value of `other` is a value of `self`.
    fn covers(&self, other: &TypeSet, is_subtype: &dyn Fn(&str, &str) -> bool) -> bool {
        match (&self.0, &other.0) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(wide), Some(narrow)) => narrow
                .iter()
                .all(|n| wide.contains(n) || wide.iter().any(|w| is_subtype(n, w))),
        }
    }
}

/// How a declared type moved between snapshots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeChange {
    Unchanged,
    /// Accepts at least everything it accepted before.
    Widened,
    /// Accepts a strict subset of what it accepted before.
    Narrowed,
    /// Undeclared before, declared now.
    Declared,
    /// Neither wider nor narrower.
    Incompatible,
}

impl TypeChange {
    /// Narrowed, newly declared or incompatible.
    pub fn is_breaking(&self) -> bool {
        matches!(
            self,
            TypeChange::Narrowed | TypeChange::Declared | TypeChange::Incompatible
        )
    }
}

/// Classify the change of one declared type. `is_subtype(a, b)` answers
/// whether class-like `a` inherits from `b`.
pub fn classify_type_change(
    before: &TypeHint,
    after: &TypeHint,
    is_subtype: &dyn Fn(&str, &str) -> bool,
) -> TypeChange {
    let old = TypeSet::of(before);
    let new = TypeSet::of(after);
    if old == new {
        return TypeChange::Unchanged;
    }
    if !before.is_declared() {
        return TypeChange::Declared;
    }
    match (new.covers(&old, is_subtype), old.covers(&new, is_subtype)) {
        (true, true) => TypeChange::Unchanged,
        (true, false) => TypeChange::Widened,
        (false, true) => TypeChange::Narrowed,
        (false, false) => TypeChange::Incompatible,
    }
}

/// One parameter-level finding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParameterFinding {
    pub code: OperationCode,
    pub reason: String,
}

impl ParameterFinding {
    fn new(code: OperationCode, reason: String) -> Self {
        Self { code, reason }
    }
}

fn names(params: &[ParameterDef]) -> Vec<String> {
    params.iter().map(|p| param_name(&p.name)).collect()
}

fn param_name(name: &str) -> String {
    name.trim().trim_start_matches('$').to_string()
}

/// Compare two ordered parameter lists by name and position.
pub fn compare_parameters(
    before: &[ParameterDef],
    after: &[ParameterDef],
    is_subtype: &dyn Fn(&str, &str) -> bool,
) -> Vec<ParameterFinding> {
    let mut findings = Vec::new();
    let old_names = names(before);
    let new_names = names(after);

    let removed: Vec<&String> = old_names.iter().filter(|n| !new_names.contains(n)).collect();
    if !removed.is_empty() || after.len() < before.len() {
        let list = removed.iter().map(|n| format!("${}", n)).collect::<Vec<_>>().join(", ");
        findings.push(ParameterFinding::new(
            OperationCode::MethodParameterRemoved,
            format!("parameter(s) {} removed", list),
        ));
    } else {
        let kept: Vec<&String> = new_names.iter().filter(|n| old_names.contains(n)).collect();
        if kept.iter().zip(old_names.iter()).any(|(a, b)| *a != b) {
            findings.push(ParameterFinding::new(
                OperationCode::MethodParameterReordered,
                format!(
                    "parameter order changed from ({}) to ({})",
                    old_names.join(", "),
                    new_names.join(", ")
                ),
            ));
        }

        let added: Vec<(usize, &ParameterDef)> = after
            .iter()
            .enumerate()
            .filter(|(_, p)| !old_names.contains(&param_name(&p.name)))
            .collect();
        if !added.is_empty() {
            let list = added
                .iter()
                .map(|(_, p)| format!("${}", param_name(&p.name)))
                .collect::<Vec<_>>()
                .join(", ");
            let breaking = added
                .iter()
                .any(|(idx, p)| !p.is_optional() || *idx < before.len());
            if breaking {
                findings.push(ParameterFinding::new(
                    OperationCode::MethodParameterAdded,
                    format!("required or non-trailing parameter(s) {} added", list),
                ));
            } else {
                findings.push(ParameterFinding::new(
                    OperationCode::MethodOptionalParameterAdded,
                    format!("optional parameter(s) {} appended", list),
                ));
            }
        }
    }

    for old in before {
        let name = param_name(&old.name);
        let Some(new) = after.iter().find(|p| param_name(&p.name) == name) else {
            continue;
        };
        if old.is_optional() && !new.is_optional() {
            findings.push(ParameterFinding::new(
                OperationCode::MethodParameterMadeRequired,
                format!("parameter ${} is no longer optional", name),
            ));
        }
        if classify_type_change(&old.type_hint, &new.type_hint, is_subtype).is_breaking() {
            findings.push(ParameterFinding::new(
                OperationCode::MethodParameterTypeChanged,
                format!(
                    "parameter ${} type changed from '{}' to '{}'",
                    name,
                    old.type_hint.effective().unwrap_or("mixed"),
                    new.type_hint.effective().unwrap_or("mixed")
                ),
            ));
        }
        if let (Some(a), Some(b)) = (&old.default, &new.default) {
            if a.trim() != b.trim() {
                findings.push(ParameterFinding::new(
                    OperationCode::MethodParameterDefaultChanged,
                    format!("parameter ${} default changed from {} to {}", name, a.trim(), b.trim()),
                ));
            }
        }
    }

    findings
}
