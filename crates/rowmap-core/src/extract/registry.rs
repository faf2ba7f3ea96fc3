use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use super::extractor::{extract, Catalog};
use crate::errors::ExtractionError;
use crate::model::{EntityDeclaration, Metamodel, TypeRef};
use crate::sql::StatementSet;
use crate::{log_op_end, log_op_error, log_op_start};

/// A registered entity: its metamodel and its generated statements
#[derive(Debug)]
pub struct EntityModel {
    metamodel: Metamodel,
    statements: StatementSet,
}

impl EntityModel {
    pub fn metamodel(&self) -> &Metamodel {
        &self.metamodel
    }

    pub fn statements(&self) -> &StatementSet {
        &self.statements
    }

    pub fn entity(&self) -> &str {
        self.metamodel.entity()
    }

    pub fn table(&self) -> &str {
        self.metamodel.table()
    }
}

/// Immutable map from entity type to its model
///
/// Built once by [`RegistryBuilder::build`], then shared behind an `Arc`.
#[derive(Debug, Default)]
pub struct Registry {
    models: HashMap<TypeRef, Arc<EntityModel>>,
    order: Vec<TypeRef>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn get(&self, type_ref: TypeRef) -> Option<&Arc<EntityModel>> {
        self.models.get(&type_ref)
    }

    pub fn model<T: 'static>(&self) -> Option<&Arc<EntityModel>> {
        self.get(TypeRef::of::<T>())
    }

    pub fn contains(&self, type_ref: TypeRef) -> bool {
        self.models.contains_key(&type_ref)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Models in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<EntityModel>> {
        self.order.iter().filter_map(|t| self.models.get(t))
    }

    /// Models ordered so that relation targets precede their dependents
    ///
    /// Registration order breaks ties. Cycles between distinct entities
    /// fall back to registration order for the entities involved.
    pub fn creation_order(&self) -> Vec<&Arc<EntityModel>> {
        let mut placed: HashSet<TypeRef> = HashSet::new();
        let mut ordered = Vec::with_capacity(self.order.len());

        while ordered.len() < self.order.len() {
            let ready = self.order.iter().find(|t| {
                !placed.contains(*t)
                    && self.models[*t]
                        .metamodel
                        .references()
                        .all(|r| r.target == **t || placed.contains(&r.target))
            });
            let next = match ready {
                Some(t) => *t,
                None => match self.order.iter().find(|t| !placed.contains(*t)) {
                    Some(t) => *t,
                    None => break,
                },
            };
            placed.insert(next);
            ordered.push(&self.models[&next]);
        }
        ordered
    }
}

/// Collects declarations and builds the [`Registry`]
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    declarations: Vec<EntityDeclaration>,
}

impl RegistryBuilder {
    pub fn register(mut self, declaration: EntityDeclaration) -> Self {
        self.declarations.push(declaration);
        self
    }

    pub fn declarations(&self) -> &[EntityDeclaration] {
        &self.declarations
    }

    /// Extract and generate every registered entity
    ///
    /// # Errors
    ///
    /// The first [`ExtractionError`] met, in registration order.
    pub fn build(self) -> Result<Registry, ExtractionError> {
        let start = Instant::now();
        log_op_start!("registry_build", entities = self.declarations.len() as u64);

        let result = self.build_inner();
        let duration_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(registry) => {
                log_op_end!(
                    "registry_build",
                    duration_ms = duration_ms,
                    entities = registry.len() as u64
                );
            }
            Err(err) => {
                log_op_error!("registry_build", err, duration_ms = duration_ms);
            }
        }
        result
    }

    fn build_inner(&self) -> Result<Registry, ExtractionError> {
        let mut seen = HashSet::new();
        for decl in &self.declarations {
            if !seen.insert(decl.type_ref) {
                return Err(ExtractionError::DuplicateEntity {
                    entity: decl.name.clone(),
                });
            }
        }

        let catalog = Catalog::new(&self.declarations);
        let mut registry = Registry::default();
        for decl in &self.declarations {
            let metamodel = extract(decl, &catalog)?;
            let statements = StatementSet::generate(&metamodel)?;
            tracing::debug!(
                entity = metamodel.entity(),
                table = metamodel.table(),
                columns = metamodel.column_count() as u64,
                "entity registered"
            );
            registry.order.push(decl.type_ref);
            registry.models.insert(
                decl.type_ref,
                Arc::new(EntityModel {
                    metamodel,
                    statements,
                }),
            );
        }
        Ok(registry)
    }
}
