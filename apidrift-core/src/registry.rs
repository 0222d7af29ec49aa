//! Per-snapshot construct index.
//!
//! A [`Registry`] maps module name -> unique key -> [`Construct`] for one
//! snapshot side. It is built once from the parser collaborator's
//! [`ModuleStream`]s and never mutated afterwards.
//!
//! # Example
//!
//! ```rust
//! use apidrift_core::error::Side;
//! use apidrift_core::registry::Registry;
//! use apidrift_core::types::{ClassDef, ClassKind, ModuleStream};
//!
//! let stream = ModuleStream::new(
//!     "Acme_Catalog",
//!     vec![ClassDef::new("Acme\\Catalog\\Repo", ClassKind::Class).into()],
//! );
//! let registry = Registry::from_streams(Side::Before, vec![stream]).unwrap();
//! assert!(registry.get("Acme_Catalog", "Acme\\Catalog\\Repo").is_some());
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;

use crate::error::{DiffError, Result, Side};
use crate::types::{member_key, ClassDef, Construct, ModuleStream};

/// Constructs of one module, keyed by unique key.
pub type ModuleIndex = BTreeMap<String, Construct>;

/// Immutable index of every construct of one snapshot side.
#[derive(Debug, Clone)]
pub struct Registry {
    side: Side,
    modules: BTreeMap<String, ModuleIndex>,
    /// Lower-cased class-like key -> declaring module.
    classes: HashMap<String, String>,
}

impl Registry {
    /// Build a registry from every stream of one side.
    pub fn from_streams(side: Side, streams: impl IntoIterator<Item = ModuleStream>) -> Result<Self> {
        let mut builder = RegistryBuilder::new(side);
        for stream in streams {
            builder.add_stream(stream)?;
        }
        Ok(builder.build())
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Module names, sorted.
    pub fn module_names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    pub fn module(&self, name: &str) -> Option<&ModuleIndex> {
        self.modules.get(name)
    }

    pub fn get(&self, module: &str, key: &str) -> Option<&Construct> {
        self.modules.get(module)?.get(key)
    }

    /// Look up a class-like by reference, ignoring case and a leading `\`.
    ///
    /// When two modules declare the same class-like, the module that sorts
    /// first wins.
    pub fn find_class(&self, name: &str) -> Option<(&str, &ClassDef)> {
        let lookup = class_lookup_key(name);
        let module = self.classes.get(&lookup)?;
        self.modules
            .get(module)?
            .values()
            .filter_map(Construct::as_class)
            .find(|class| class_lookup_key(&class.name) == lookup)
            .map(|class| (module.as_str(), class))
    }

    /// Every class-like with its declaring module, in module then key order.
    pub fn classes(&self) -> impl Iterator<Item = (&str, &ClassDef)> {
        self.modules.iter().flat_map(|(module, index)| {
            index
                .values()
                .filter_map(Construct::as_class)
                .map(move |class| (module.as_str(), class))
        })
    }

    /// Total number of constructs across all modules.
    pub fn len(&self) -> usize {
        self.modules.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Case-folded, separator-stripped class-like reference.
pub fn class_lookup_key(name: &str) -> String {
    name.trim().trim_start_matches('\\').to_lowercase()
}

/// Accumulates module streams for one side.
pub struct RegistryBuilder {
    side: Side,
    modules: BTreeMap<String, ModuleIndex>,
}

impl RegistryBuilder {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            modules: BTreeMap::new(),
        }
    }

    /// Index every construct of a stream. Several streams may target the
    /// same module; keys must stay unique across all of them.
    pub fn add_stream(&mut self, stream: ModuleStream) -> Result<&mut Self> {
        let ModuleStream {
            module,
            constructs,
        } = stream;
        let index = self.modules.entry(module.clone()).or_default();

        for construct in constructs {
            let key = construct.key();
            if key.is_empty() {
                return Err(DiffError::EmptyKey {
                    side: self.side,
                    module,
                });
            }
            if let Some(class) = construct.as_class() {
                check_members(self.side, &module, &key, class)?;
            }
            if index.contains_key(&key) {
                return Err(DiffError::DuplicateKey {
                    side: self.side,
                    module,
                    key,
                });
            }
            index.insert(key, construct);
        }
        Ok(self)
    }

    pub fn build(self) -> Registry {
        let mut classes = HashMap::new();
        for (module, index) in &self.modules {
            for class in index.values().filter_map(Construct::as_class) {
                let lookup = class_lookup_key(&class.name);
                if let Some(first) = classes.get(&lookup) {
                    debug!(
                        side = %self.side,
                        class = class.name.as_str(),
                        module = module.as_str(),
                        kept = %first,
                        "class-like declared in more than one module"
                    );
                    continue;
                }
                classes.insert(lookup, module.clone());
            }
        }

        let registry = Registry {
            side: self.side,
            modules: self.modules,
            classes,
        };
        debug!(
            side = %registry.side,
            modules = registry.modules.len(),
            constructs = registry.len(),
            "registry built"
        );
        registry
    }
}

fn check_members(side: Side, module: &str, class_key: &str, class: &ClassDef) -> Result<()> {
    let mut seen = HashSet::with_capacity(class.members.len());
    for member in &class.members {
        if member.name.trim().trim_start_matches('$').is_empty() {
            return Err(DiffError::EmptyKey {
                side,
                module: module.to_string(),
            });
        }
        if !seen.insert(member.identity()) {
            return Err(DiffError::DuplicateKey {
                side,
                module: module.to_string(),
                key: member_key(class_key, &member.key_name()),
            });
        }
    }
    Ok(())
}
