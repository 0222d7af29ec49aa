//! Inheritance resolution powered by petgraph.
//!
//! Builds one directed graph per [`Registry`] where nodes are class-likes and
//! edges point from a class-like to what it extends, implements or uses.
//! From it the resolver derives, per class-like:
//!
//! - the **effective member table**: parent members (minus private ones),
//!   then interface members, then trait members overriding inherited ones,
//!   then local declarations overriding everything
//! - the **effective API flag** per member: the member's own tag, the tag of
//!   its declaring class-like, or an API member with the same identity in a
//!   parent, interface or trait
//! - whether any ancestor lies outside the scanned modules (opaque)
//!
//! # Architecture
//!
//! ```text
//! Registry -> DiGraph (extends/implements/uses) -> SCC check -> topo order -> ClassNode tables
//! ```
//!
//! References that cannot be resolved are recorded as diagnostics, never as
//! errors. A cycle is fatal.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use petgraph::algo::{kosaraju_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{DiffError, Result, Side};
use crate::registry::{class_lookup_key, Registry};
use crate::report::{Diagnostic, DiagnosticKind};
use crate::types::{normalize_name, ClassDef, ClassKind, Location, MemberDef, TraitUse, Visibility};

/// Relationship carried by a graph edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Extends,
    Implements,
    Uses,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Extends => "parent",
            EdgeKind::Implements => "interface",
            EdgeKind::Uses => "trait",
        }
    }
}

/// A parent, interface or trait reference after resolution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "name", rename_all = "lowercase")]
pub enum TypeRef {
    /// Declared in the scanned modules; holds the canonical key.
    Resolved(String),
    /// External or vendor type; holds the reference as written, normalized.
    Unresolved(String),
}

impl TypeRef {
    pub fn name(&self) -> &str {
        match self {
            TypeRef::Resolved(name) | TypeRef::Unresolved(name) => name,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, TypeRef::Resolved(_))
    }
}

/// Where an effective member came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MemberOrigin {
    Local,
    Trait(String),
    Parent(String),
    Interface(String),
}

impl MemberOrigin {
    /// Declared by the class-like itself or copied in from a used trait.
    pub fn is_owned(&self) -> bool {
        matches!(self, MemberOrigin::Local | MemberOrigin::Trait(_))
    }
}

/// A member as seen through inheritance.
#[derive(Clone, Debug)]
pub struct EffectiveMember {
    /// Declaration with trait aliasing already applied.
    pub def: MemberDef,
    pub origin: MemberOrigin,
    pub is_api: bool,
}

/// Resolved view of one class-like.
#[derive(Clone, Debug)]
pub struct ClassNode {
    pub module: String,
    pub key: String,
    pub kind: ClassKind,
    pub is_final: bool,
    pub location: Location,
    pub parent: Option<TypeRef>,
    pub interfaces: Vec<TypeRef>,
    pub traits: Vec<TypeRef>,
    /// Member identity -> effective member.
    pub members: BTreeMap<String, EffectiveMember>,
    /// Locally tagged as API. Never inherited.
    pub is_api: bool,
    /// Some ancestor, interface or trait is outside the scanned modules.
    pub has_opaque_ancestry: bool,
    /// Lower-cased references of every transitive parent.
    pub lineage: BTreeSet<String>,
    /// Lower-cased reference -> display name of every interface implemented,
    /// directly or through inheritance.
    pub all_interfaces: BTreeMap<String, String>,
}

impl ClassNode {
    pub fn member(&self, identity: &str) -> Option<&EffectiveMember> {
        self.members.get(identity)
    }

    /// True when `reference` names this class-like or any parent or interface of it.
    pub fn is_a(&self, reference: &str) -> bool {
        let lookup = class_lookup_key(reference);
        class_lookup_key(&self.key) == lookup
            || self.lineage.contains(&lookup)
            || self.all_interfaces.contains_key(&lookup)
    }
}

/// A member two or more used traits provide, with no resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AmbiguousMember {
    pub module: String,
    pub class: String,
    /// Member key name (`name()`, `$name`, `NAME`).
    pub member: String,
    /// Providing traits, in `use` order.
    pub traits: Vec<String>,
    pub location: Location,
}

type NodeId = (String, String);

/// Resolution links of one class-like, in declaration order.
struct Links {
    parent: Option<(TypeRef, Option<NodeIndex>)>,
    interfaces: Vec<(TypeRef, Option<NodeIndex>)>,
    traits: Vec<(TypeRef, Option<NodeIndex>)>,
}

/// Every class-like of a registry, resolved.
#[derive(Debug)]
pub struct HierarchyGraph {
    side: Side,
    nodes: HashMap<NodeId, ClassNode>,
    /// Lower-cased class-like reference -> node, same winner as the registry.
    by_name: HashMap<String, NodeId>,
    pub diagnostics: Vec<Diagnostic>,
    pub ambiguities: Vec<AmbiguousMember>,
}

impl HierarchyGraph {
    /// Resolve every class-like of `registry`.
    pub fn build(registry: &Registry) -> Result<Self> {
        let side = registry.side();
        let mut graph: DiGraph<NodeId, EdgeKind> = DiGraph::new();
        let mut index: HashMap<NodeId, NodeIndex> = HashMap::new();

        for (module, class) in registry.classes() {
            let id = (module.to_string(), class.key());
            let idx = graph.add_node(id.clone());
            index.insert(id, idx);
        }

        let mut diagnostics = Vec::new();
        let mut links: HashMap<NodeIndex, Links> = HashMap::with_capacity(index.len());

        for (module, class) in registry.classes() {
            let from = index[&(module.to_string(), class.key())];
            let mut resolve = |name: &str, edge: EdgeKind| -> (TypeRef, Option<NodeIndex>) {
                match registry.find_class(name) {
                    Some((target_module, target)) => {
                        let to = index[&(target_module.to_string(), target.key())];
                        graph.add_edge(from, to, edge);
                        (TypeRef::Resolved(target.key()), Some(to))
                    }
                    None => {
                        let name = normalize_name(name);
                        warn!(
                            side = %side,
                            class = class.name.as_str(),
                            reference = name.as_str(),
                            relation = edge.as_str(),
                            "unresolved reference, treating as opaque"
                        );
                        diagnostics.push(Diagnostic {
                            module: module.to_string(),
                            target: class.key(),
                            message: format!(
                                "{} '{}' is not declared in the scanned modules",
                                edge.as_str(),
                                name
                            ),
                            kind: DiagnosticKind::UnresolvedReference,
                            side,
                        });
                        (TypeRef::Unresolved(name), None)
                    }
                }
            };

            let parent = class
                .parent
                .as_deref()
                .filter(|p| !p.trim().is_empty())
                .map(|p| resolve(p, EdgeKind::Extends));
            let interfaces = class
                .interfaces
                .iter()
                .map(|i| resolve(i, EdgeKind::Implements))
                .collect();
            let traits = class
                .traits
                .iter()
                .map(|t| resolve(&t.name, EdgeKind::Uses))
                .collect();
            links.insert(
                from,
                Links {
                    parent,
                    interfaces,
                    traits,
                },
            );
        }

        check_cycles(side, &graph)?;

        // Edges point at ancestors, so reverse topological order visits them first.
        let order = toposort(&graph, None).map_err(|cycle| DiffError::HierarchyCycle {
            side,
            members: vec![graph[cycle.node_id()].1.clone()],
        })?;

        let mut resolved: HashMap<NodeIndex, ClassNode> = HashMap::with_capacity(order.len());
        let mut ambiguities = Vec::new();
        for idx in order.into_iter().rev() {
            let (module, key) = &graph[idx];
            let Some(class) = registry.get(module, key).and_then(|c| c.as_class()) else {
                continue;
            };
            let Some(class_links) = links.remove(&idx) else {
                continue;
            };
            let node = resolve_class(module, class, class_links, &resolved, &mut ambiguities);
            resolved.insert(idx, node);
        }

        let mut nodes = HashMap::with_capacity(resolved.len());
        for (idx, node) in resolved {
            nodes.insert(graph[idx].clone(), node);
        }

        let mut by_name = HashMap::new();
        for (module, class) in registry.classes() {
            by_name
                .entry(class_lookup_key(&class.name))
                .or_insert_with(|| (module.to_string(), class.key()));
        }

        ambiguities.sort_by(|a: &AmbiguousMember, b| (&a.module, &a.class, &a.member).cmp(&(&b.module, &b.class, &b.member)));

        debug!(
            side = %side,
            classes = nodes.len(),
            edges = graph.edge_count(),
            unresolved = diagnostics.len(),
            ambiguous = ambiguities.len(),
            "hierarchy resolved"
        );

        Ok(Self {
            side,
            nodes,
            by_name,
            diagnostics,
            ambiguities,
        })
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn class(&self, module: &str, key: &str) -> Option<&ClassNode> {
        self.nodes.get(&(module.to_string(), key.to_string()))
    }

    /// Look up by reference, ignoring case and a leading `\`.
    pub fn find(&self, reference: &str) -> Option<&ClassNode> {
        let id = self.by_name.get(&class_lookup_key(reference))?;
        self.nodes.get(id)
    }

    /// Whether `sub` is `sup` or inherits from it. `None` when `sub` is not
    /// declared in the scanned modules.
    pub fn is_subtype(&self, sub: &str, sup: &str) -> Option<bool> {
        if class_lookup_key(sub) == class_lookup_key(sup) {
            return Some(true);
        }
        self.find(sub).map(|node| node.is_a(sup))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Fail on the first strongly connected component (or self-loop), keys sorted.
fn check_cycles(side: Side, graph: &DiGraph<NodeId, EdgeKind>) -> Result<()> {
    let mut cycles: Vec<Vec<String>> = kosaraju_scc(graph)
        .into_iter()
        .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
        .map(|scc| {
            let mut members: Vec<String> = scc.into_iter().map(|idx| graph[idx].1.clone()).collect();
            members.sort();
            members
        })
        .collect();
    cycles.sort();

    match cycles.into_iter().next() {
        Some(members) => Err(DiffError::HierarchyCycle { side, members }),
        None => Ok(()),
    }
}

fn resolve_class(
    module: &str,
    class: &ClassDef,
    links: Links,
    resolved: &HashMap<NodeIndex, ClassNode>,
    ambiguities: &mut Vec<AmbiguousMember>,
) -> ClassNode {
    let target = |link: &Option<NodeIndex>| link.and_then(|idx| resolved.get(&idx));

    let parent_node = links.parent.as_ref().and_then(|(_, idx)| target(idx));
    let interface_nodes: Vec<&ClassNode> = links.interfaces.iter().filter_map(|(_, idx)| target(idx)).collect();
    let trait_nodes: Vec<Option<&ClassNode>> = links.traits.iter().map(|(_, idx)| target(idx)).collect();

    let ancestors = || {
        parent_node
            .into_iter()
            .chain(interface_nodes.iter().copied())
            .chain(trait_nodes.iter().flatten().copied())
    };

    let is_api = class.is_api;
    let has_opaque_ancestry = links.parent.iter().any(|(r, _)| !r.is_resolved())
        || links.interfaces.iter().any(|(r, _)| !r.is_resolved())
        || links.traits.iter().any(|(r, _)| !r.is_resolved())
        || ancestors().any(|n| n.has_opaque_ancestry);

    let mut lineage = BTreeSet::new();
    let mut all_interfaces = BTreeMap::new();
    if let Some((reference, _)) = &links.parent {
        lineage.insert(class_lookup_key(reference.name()));
    }
    if let Some(parent) = parent_node {
        lineage.extend(parent.lineage.iter().cloned());
        all_interfaces.extend(parent.all_interfaces.clone());
    }
    for (reference, _) in &links.interfaces {
        all_interfaces.insert(class_lookup_key(reference.name()), reference.name().to_string());
    }
    for interface in &interface_nodes {
        all_interfaces.extend(interface.all_interfaces.clone());
        // Interfaces may list their parents as `parent`.
        lineage.extend(interface.lineage.iter().cloned());
    }

    let mut members: BTreeMap<String, EffectiveMember> = BTreeMap::new();
    let mut inherited_api: HashSet<String> = HashSet::new();

    if let Some(parent) = parent_node {
        for (id, member) in &parent.members {
            if member.def.visibility == Visibility::Private {
                continue;
            }
            if member.is_api {
                inherited_api.insert(id.clone());
            }
            members.insert(
                id.clone(),
                EffectiveMember {
                    def: member.def.clone(),
                    origin: MemberOrigin::Parent(parent.key.clone()),
                    is_api: member.is_api,
                },
            );
        }
    }

    for interface in &interface_nodes {
        for (id, member) in &interface.members {
            if member.is_api {
                inherited_api.insert(id.clone());
            }
            members.entry(id.clone()).or_insert_with(|| EffectiveMember {
                def: member.def.clone(),
                origin: MemberOrigin::Interface(interface.key.clone()),
                is_api: member.is_api,
            });
        }
    }

    let local: HashSet<String> = class.members.iter().map(MemberDef::identity).collect();
    let provided = trait_members(&class.traits, &trait_nodes);
    for (id, mut candidates) in provided {
        if candidates.iter().any(|c| c.member.is_api) {
            inherited_api.insert(id.clone());
        }
        let distinct: BTreeSet<&str> = candidates.iter().map(|c| c.trait_key.as_str()).collect();
        let pick = if distinct.len() <= 1 {
            0
        } else if let Some(pos) = candidates.iter().position(|c| c.preferred) {
            pos
        } else {
            if !local.contains(&id) {
                let traits: Vec<String> = candidates.iter().map(|c| c.trait_key.clone()).collect();
                warn!(
                    class = class.name.as_str(),
                    member = id.as_str(),
                    traits = ?traits,
                    "member provided by several traits without resolution"
                );
                ambiguities.push(AmbiguousMember {
                    module: module.to_string(),
                    class: class.key(),
                    member: candidates[0].member.def.key_name(),
                    traits,
                    location: class.location.clone(),
                });
            }
            0
        };
        let chosen = candidates.swap_remove(pick);
        members.insert(id, chosen.member);
    }

    for def in &class.members {
        members.insert(
            def.identity(),
            EffectiveMember {
                def: def.clone(),
                origin: MemberOrigin::Local,
                is_api: false,
            },
        );
    }

    // Inherited copies keep the flag they had in their declaring class-like.
    for (id, member) in members.iter_mut() {
        let via_class = is_api && member.def.visibility != Visibility::Private;
        member.is_api = match member.origin {
            MemberOrigin::Local => member.def.is_api || via_class || inherited_api.contains(id),
            MemberOrigin::Trait(_) => member.is_api || via_class,
            MemberOrigin::Parent(_) | MemberOrigin::Interface(_) => member.is_api,
        };
    }

    ClassNode {
        module: module.to_string(),
        key: class.key(),
        kind: class.kind,
        is_final: class.is_final,
        location: class.location.clone(),
        parent: links.parent.map(|(r, _)| r),
        interfaces: links.interfaces.into_iter().map(|(r, _)| r).collect(),
        traits: links.traits.into_iter().map(|(r, _)| r).collect(),
        members,
        is_api,
        has_opaque_ancestry,
        lineage,
        all_interfaces,
    }
}

struct TraitCandidate {
    trait_key: String,
    member: EffectiveMember,
    /// The `use` names this trait as the winner for the member.
    preferred: bool,
}

/// Members each used trait contributes, aliases applied, grouped by identity.
fn trait_members(
    uses: &[TraitUse],
    nodes: &[Option<&ClassNode>],
) -> BTreeMap<String, Vec<TraitCandidate>> {
    let mut provided: BTreeMap<String, Vec<TraitCandidate>> = BTreeMap::new();

    for (trait_use, node) in uses.iter().zip(nodes) {
        let Some(node) = node else {
            continue;
        };
        for member in node.members.values() {
            let mut base = member.def.clone();
            let mut copies = Vec::new();

            for alias in trait_use
                .aliases
                .iter()
                .filter(|a| a.member.eq_ignore_ascii_case(&member.def.name))
            {
                match &alias.alias {
                    Some(name) => {
                        let mut copy = member.def.clone();
                        copy.name = name.clone();
                        if let Some(visibility) = alias.visibility {
                            copy.visibility = visibility;
                        }
                        copies.push(copy);
                    }
                    None => {
                        if let Some(visibility) = alias.visibility {
                            base.visibility = visibility;
                        }
                    }
                }
            }

            for def in std::iter::once(base).chain(copies) {
                let preferred = trait_use
                    .prefers
                    .iter()
                    .any(|p| p.eq_ignore_ascii_case(&def.name));
                provided.entry(def.identity()).or_default().push(TraitCandidate {
                    trait_key: node.key.clone(),
                    member: EffectiveMember {
                        def,
                        origin: MemberOrigin::Trait(node.key.clone()),
                        is_api: member.is_api,
                    },
                    preferred,
                });
            }
        }
    }
    provided
}

/// A registry together with its resolved hierarchy.
#[derive(Debug)]
pub struct ResolvedSnapshot {
    pub registry: Registry,
    pub graph: HierarchyGraph,
}

impl ResolvedSnapshot {
    pub fn resolve(registry: Registry) -> Result<Self> {
        let graph = HierarchyGraph::build(&registry)?;
        Ok(Self { registry, graph })
    }

    pub fn side(&self) -> Side {
        self.registry.side()
    }
}
