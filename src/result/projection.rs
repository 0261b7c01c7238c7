//! Interface projections backed by property maps.
//!
//! Each projecting interface gets one [`ProjectionAdapter`], generated on
//! first use and cached by interface name. A [`Projection`] pairs an
//! adapter with the property map it reads from.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use crate::error::{QueryError, Result};
use crate::types::{TypeIntrospector, TypeKind, TypeRef};
use crate::value::Value;

static NULL: Value = Value::Null;

/// Accessor table generated for one projecting interface.
#[derive(Debug, Eq, PartialEq)]
pub struct ProjectionAdapter {
    interface: String,
    accessors: Vec<(String, TypeRef)>,
    open: bool,
}

impl ProjectionAdapter {
    fn generate(interface: &str, types: &dyn TypeIntrospector) -> Self {
        let descriptor = types.describe(interface);
        let accessors = descriptor
            .map(|d| {
                d.properties()
                    .iter()
                    .map(|p| (p.name.clone(), p.ty.clone()))
                    .collect()
            })
            .unwrap_or_default();
        Self {
            interface: interface.to_string(),
            accessors,
            open: descriptor.map_or(true, |d| d.is_open()),
        }
    }

    /// Interface name.
    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Declared accessor names in declaration order.
    pub fn accessors(&self) -> impl Iterator<Item = &str> {
        self.accessors.iter().map(|(name, _)| name.as_str())
    }

    /// Whether the interface declares `property`.
    pub fn declares(&self, property: &str) -> bool {
        self.accessors.iter().any(|(name, _)| name == property)
    }

    /// Whether any backing property may be read.
    pub fn is_open(&self) -> bool {
        self.open
    }

    fn declared_type(&self, property: &str) -> Option<&TypeRef> {
        self.accessors
            .iter()
            .find(|(name, _)| name == property)
            .map(|(_, ty)| ty)
    }
}

/// View of a property map through a projecting interface.
#[derive(Clone, Debug)]
pub struct Projection {
    adapter: Arc<ProjectionAdapter>,
    backing: BTreeMap<String, Value>,
}

impl Projection {
    /// Interface the projection implements.
    pub fn interface(&self) -> &str {
        self.adapter.interface()
    }

    /// Reads `property` through the interface. Undeclared accessors fail
    /// on closed projections; declared but absent values read as `Null`.
    pub fn get(&self, property: &str) -> Result<&Value> {
        if !self.adapter.declares(property) && !self.adapter.is_open() {
            return Err(QueryError::ProjectionPropertyMissing {
                interface: self.adapter.interface().to_string(),
                property: property.to_string(),
            });
        }
        Ok(self.backing.get(property).unwrap_or(&NULL))
    }

    /// Backing property map.
    pub fn backing(&self) -> &BTreeMap<String, Value> {
        &self.backing
    }

    /// Generated adapter.
    pub fn adapter(&self) -> &ProjectionAdapter {
        &self.adapter
    }
}

impl PartialEq for Projection {
    fn eq(&self, other: &Self) -> bool {
        self.adapter.interface() == other.adapter.interface() && self.backing == other.backing
    }
}

/// Creates projections and caches the adapter of every interface seen.
pub struct ProjectionFactory {
    types: Arc<dyn TypeIntrospector>,
    adapters: RwLock<HashMap<String, Arc<ProjectionAdapter>>>,
}

impl ProjectionFactory {
    /// Creates a factory over the given type graph.
    pub fn new(types: Arc<dyn TypeIntrospector>) -> Self {
        Self {
            types,
            adapters: RwLock::new(HashMap::new()),
        }
    }

    /// Type graph used to generate adapters.
    pub fn types(&self) -> &Arc<dyn TypeIntrospector> {
        &self.types
    }

    /// Adapter for `interface`, generated once.
    pub fn adapter_for(&self, interface: &str) -> Arc<ProjectionAdapter> {
        if let Some(adapter) = self.adapters.read().get(interface) {
            return Arc::clone(adapter);
        }
        let mut adapters = self.adapters.write();
        let adapter = adapters.entry(interface.to_string()).or_insert_with(|| {
            trace!(interface, "result.projection.adapter_generated");
            Arc::new(ProjectionAdapter::generate(interface, self.types.as_ref()))
        });
        Arc::clone(adapter)
    }

    /// Number of cached adapters.
    pub fn adapter_count(&self) -> usize {
        self.adapters.read().len()
    }

    /// Projects `source` onto `interface`. Records, maps and projections
    /// become a projection view; any other value has no properties to
    /// expose and is returned as is.
    pub fn project(&self, interface: &str, source: Value) -> Result<Value> {
        match source {
            Value::Record(_) | Value::Map(_) | Value::Projection(_) => {
                self.create_projection(interface, source).map(Value::Projection)
            }
            other => {
                trace!(interface, source = %other.describe(), "result.projection.passthrough");
                Ok(other)
            }
        }
    }

    /// Projects `source` (record, map or projection) onto `interface`.
    /// Declared accessors whose type is itself an interface are projected
    /// recursively.
    pub fn create_projection(&self, interface: &str, source: Value) -> Result<Projection> {
        let adapter = self.adapter_for(interface);
        let mut backing = match source {
            Value::Record(record) => record.into_fields(),
            Value::Map(entries) => entries,
            Value::Projection(projection) => projection.backing,
            other => {
                return Err(QueryError::conversion(
                    other.describe(),
                    interface,
                    "only records, maps and projections can back an interface projection",
                ))
            }
        };
        for (name, value) in backing.iter_mut() {
            if let Some(target) = adapter.declared_type(name) {
                let projected = self.project_nested(target, std::mem::replace(value, Value::Null))?;
                *value = projected;
            }
        }
        Ok(Projection { adapter, backing })
    }

    fn project_nested(&self, declared: &TypeRef, value: Value) -> Result<Value> {
        let Some(target) = declared.component_type().as_named() else {
            return Ok(value);
        };
        if self.types.kind_of(target) != TypeKind::Interface {
            return Ok(value);
        }
        match value {
            Value::Record(_) | Value::Map(_) => {
                Ok(Value::Projection(self.create_projection(target, value)?))
            }
            Value::Projection(projection) if projection.interface() == target => {
                Ok(Value::Projection(projection))
            }
            Value::Projection(projection) => Ok(Value::Projection(
                self.create_projection(target, Value::Projection(projection))?,
            )),
            Value::List(items) => items
                .into_iter()
                .map(|item| self.project_nested(declared, item))
                .collect::<Result<Vec<_>>>()
                .map(Value::List),
            other => Ok(other),
        }
    }
}

impl std::fmt::Debug for ProjectionFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectionFactory")
            .field("adapters", &self.adapter_count())
            .finish_non_exhaustive()
    }
}
