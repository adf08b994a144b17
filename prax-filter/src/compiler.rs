//! The filter clause compiler.
//!
//! Walks a [`ConditionTree`] against entity metadata and produces a
//! [`CompiledClause`]: predicates over aliased columns plus the joins
//! they need. A nested condition on a relation always becomes a join and
//! a recursion into the joined alias, however deep the nesting and however
//! many filters are active. A structured value compared against a relation
//! is rejected rather than bound as a literal.
//!
//! When a join is introduced, the active filters defined on the joined
//! entity are compiled against the join alias as well and attached to the
//! join itself. A related row that fails its own entity's filters is never
//! joined, so it neither satisfies a condition nor counts as present.
//!
//! ```rust
//! use prax_filter::{
//!     ActiveFilterSet, CompileOptions, ConditionTree, EntityMeta, EntityRegistry,
//!     FilterCompiler, RelationSpec,
//! };
//!
//! let registry = EntityRegistry::new()
//!     .register(EntityMeta::new("User", "users").relation(
//!         RelationSpec::many_to_one("location", "Location", "location_id"),
//!     ))
//!     .register(EntityMeta::new("Location", "location").scalar("name"))
//!     .register(EntityMeta::new("Task", "task").relation(
//!         RelationSpec::many_to_one("owner", "User", "owner_id"),
//!     ));
//!
//! let options = CompileOptions::default();
//! let compiler = FilterCompiler::new(&registry, &options);
//! let tree = ConditionTree::new().path("owner.location.name", "HQ");
//! let compiled = compiler.compile("Task", &tree, &ActiveFilterSet::new()).unwrap();
//!
//! assert_eq!(compiled.joins.len(), 2);
//! assert_eq!(compiled.join_for("owner.location").unwrap().alias, "e2");
//! ```

use smol_str::SmolStr;
use tracing::{debug, trace};

use crate::clause::{Clause, ColumnRef, CompiledClause};
use crate::condition::{Condition, ConditionTree};
use crate::config::CompileOptions;
use crate::definition::ActiveFilterSet;
use crate::error::{QueryError, QueryResult};
use crate::filter::{FilterValue, ScalarFilter};
use crate::join::JoinContext;
use crate::metadata::{EntityMeta, EntityRegistry, FieldMeta};
use crate::relation::RelationSpec;

/// Compiles condition trees and active filters into [`CompiledClause`]s.
///
/// Holds only shared references to immutable metadata, so one compiler
/// can serve any number of queries.
#[derive(Debug, Clone, Copy)]
pub struct FilterCompiler<'a> {
    registry: &'a EntityRegistry,
    options: &'a CompileOptions,
}

/// Per-compilation state threaded through the recursion.
struct Walk<'w> {
    ctx: &'w mut JoinContext,
    active: &'w ActiveFilterSet,
    /// Entities whose filters are currently being applied, root first.
    chain: Vec<String>,
}

impl<'a> FilterCompiler<'a> {
    /// Create a compiler over the given metadata.
    pub fn new(registry: &'a EntityRegistry, options: &'a CompileOptions) -> Self {
        Self { registry, options }
    }

    /// Metadata this compiler resolves against.
    pub fn registry(&self) -> &'a EntityRegistry {
        self.registry
    }

    /// Options in effect.
    pub fn options(&self) -> &'a CompileOptions {
        self.options
    }

    /// A fresh join context using the configured aliases.
    pub fn context(&self) -> JoinContext {
        JoinContext::new(self.options.root_alias.as_str(), self.options.alias_prefix.as_str())
    }

    /// Merge the active filters for `entity` and compile them.
    ///
    /// With no applicable filters this yields [`Clause::True`] and no joins.
    pub fn compile_filters(&self, entity: &str, active: &ActiveFilterSet) -> QueryResult<CompiledClause> {
        self.compile(entity, &ConditionTree::new(), active)
    }

    /// Compile a caller condition together with the active filters for
    /// `entity`, sharing one join context.
    pub fn compile(
        &self,
        entity: &str,
        tree: &ConditionTree,
        active: &ActiveFilterSet,
    ) -> QueryResult<CompiledClause> {
        let meta = self.registry.entity(entity)?;
        self.registry.validate_filters(active)?;

        let mut ctx = self.context();
        let root = ctx.root_alias().clone();
        let condition = {
            let mut walk = Walk {
                ctx: &mut ctx,
                active,
                chain: vec![meta.name().to_string()],
            };
            let caller = self.compile_tree(tree, meta, &root, "", &mut walk)?;
            let filters = self.compile_entity_filters(meta, &root, "", &mut walk)?;
            Clause::and([caller, filters])
        };

        debug!(
            entity,
            filters = ?active.names().collect::<Vec<_>>(),
            joins = ctx.len(),
            "Compiled filter clause"
        );

        Ok(CompiledClause {
            root_alias: root,
            joins: ctx.into_joins(),
            condition,
        })
    }

    /// Compile one tree rooted at `entity` into an existing join context.
    ///
    /// Joins it needs are registered in `ctx` (reusing aliases already
    /// there); filters in `active` are applied to those joins.
    pub fn compile_condition(
        &self,
        tree: &ConditionTree,
        entity: &str,
        ctx: &mut JoinContext,
        active: &ActiveFilterSet,
    ) -> QueryResult<Clause> {
        let meta = self.registry.entity(entity)?;
        let root = ctx.root_alias().clone();
        let mut walk = Walk {
            ctx,
            active,
            chain: vec![meta.name().to_string()],
        };
        self.compile_tree(tree, meta, &root, "", &mut walk)
    }

    fn compile_entity_filters(
        &self,
        meta: &'a EntityMeta,
        alias: &SmolStr,
        path: &str,
        walk: &mut Walk<'_>,
    ) -> QueryResult<Clause> {
        let merged = self.registry.merge_filters(meta.name(), walk.active)?;
        if merged.is_empty() {
            return Ok(Clause::True);
        }
        trace!(entity = meta.name(), alias = %alias, path, "Applying entity filters");
        self.compile_tree(&merged, meta, alias, path, walk)
    }

    fn compile_tree(
        &self,
        tree: &ConditionTree,
        meta: &'a EntityMeta,
        alias: &SmolStr,
        path: &str,
        walk: &mut Walk<'_>,
    ) -> QueryResult<Clause> {
        let mut parts = Vec::with_capacity(tree.len());
        for condition in tree.conditions() {
            parts.push(self.compile_node(condition, meta, alias, path, walk)?);
        }
        Ok(Clause::and(parts))
    }

    fn compile_trees(
        &self,
        trees: &[ConditionTree],
        meta: &'a EntityMeta,
        alias: &SmolStr,
        path: &str,
        walk: &mut Walk<'_>,
    ) -> QueryResult<Vec<Clause>> {
        trees
            .iter()
            .map(|tree| self.compile_tree(tree, meta, alias, path, walk))
            .collect()
    }

    fn compile_node(
        &self,
        condition: &Condition,
        meta: &'a EntityMeta,
        alias: &SmolStr,
        path: &str,
        walk: &mut Walk<'_>,
    ) -> QueryResult<Clause> {
        match condition {
            Condition::Field { name, filter } => match meta.field(name) {
                Some(FieldMeta::Scalar { column, .. }) => Ok(Clause::predicate(
                    ColumnRef::new(alias.clone(), column.as_str()),
                    filter.clone(),
                )),
                Some(FieldMeta::Relation(spec)) => {
                    self.compile_relation_predicate(spec, filter, meta, alias, path, walk)
                }
                None => Err(QueryError::unknown_field(meta.name(), join_path(path, name))),
            },
            Condition::Relation { name, tree } => match meta.field(name) {
                Some(FieldMeta::Relation(spec)) => {
                    let (related, join_alias, joined) = self.join(spec, alias, path, walk)?;
                    let inner = if tree.is_empty() {
                        Clause::predicate(
                            ColumnRef::new(join_alias.clone(), related.primary_key()),
                            ScalarFilter::IsNotNull,
                        )
                    } else {
                        self.compile_tree(tree, related, &join_alias, &joined, walk)?
                    };
                    self.propagate(related, &join_alias, &joined, walk)?;
                    Ok(inner)
                }
                Some(FieldMeta::Scalar { .. }) => {
                    let full = join_path(path, name);
                    Err(QueryError::invalid_filter(
                        meta.name(),
                        format!("Nested condition on '{}' requires a relation, but it is a scalar field", full),
                    )
                    .with_field(full))
                }
                None => Err(QueryError::unknown_field(meta.name(), join_path(path, name))),
            },
            Condition::And(trees) => Ok(Clause::and(self.compile_trees(trees, meta, alias, path, walk)?)),
            Condition::Or(trees) => Ok(Clause::or(self.compile_trees(trees, meta, alias, path, walk)?)),
            Condition::Not(tree) => Ok(Clause::not(self.compile_tree(tree, meta, alias, path, walk)?)),
        }
    }

    /// A bare value on a relation compares keys: the local foreign key on
    /// owning sides, otherwise the related primary key through a join.
    fn compile_relation_predicate(
        &self,
        spec: &'a RelationSpec,
        filter: &ScalarFilter<FilterValue>,
        meta: &'a EntityMeta,
        alias: &SmolStr,
        path: &str,
        walk: &mut Walk<'_>,
    ) -> QueryResult<Clause> {
        if filter.values().iter().any(|v| v.is_structured()) {
            let full = join_path(path, &spec.name);
            return Err(QueryError::invalid_filter(
                meta.name(),
                format!(
                    "Relation '{}' cannot be compared with a structured value; use a nested condition instead",
                    full
                ),
            )
            .with_field(full));
        }

        if spec.is_owning() {
            let column = spec.local_key().ok_or_else(|| {
                QueryError::internal(format!("Relation '{}' has no foreign key column", spec.name))
            })?;
            return Ok(Clause::predicate(ColumnRef::new(alias.clone(), column), filter.clone()));
        }

        let (related, join_alias, joined) = self.join(spec, alias, path, walk)?;
        let keys = Clause::predicate(
            ColumnRef::new(join_alias.clone(), related.primary_key()),
            filter.clone(),
        );
        self.propagate(related, &join_alias, &joined, walk)?;
        Ok(keys)
    }

    fn join(
        &self,
        spec: &RelationSpec,
        alias: &SmolStr,
        path: &str,
        walk: &mut Walk<'_>,
    ) -> QueryResult<(&'a EntityMeta, SmolStr, String)> {
        let related = self.registry.entity(&spec.related_entity)?;
        let path = join_path(path, &spec.name);
        let join_alias = walk.ctx.join(&path, alias, spec, related.table());
        Ok((related, join_alias, path))
    }

    /// Attach the joined entity's filters to the join, once per path.
    fn propagate(
        &self,
        related: &'a EntityMeta,
        alias: &SmolStr,
        path: &str,
        walk: &mut Walk<'_>,
    ) -> QueryResult<()> {
        if !self.options.propagate_to_joins || walk.ctx.propagated(path).is_some() {
            return Ok(());
        }
        if walk.chain.iter().any(|e| e == related.name()) {
            trace!(entity = related.name(), path, "Entity already filtered on this chain, not propagating");
            return Ok(());
        }

        walk.chain.push(related.name().to_string());
        let result = self.compile_entity_filters(related, alias, path, walk);
        walk.chain.pop();

        walk.ctx.set_propagated(path, result?);
        Ok(())
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{FilterDefinition, FilterParams};
    use crate::error::ErrorCode;
    use crate::test_fixtures::{location_filters, scenario_registry};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn in_one() -> ScalarFilter<FilterValue> {
        ScalarFilter::In(vec![FilterValue::Int(1)])
    }

    fn pred(alias: &str, column: &str, filter: ScalarFilter<FilterValue>) -> Clause {
        Clause::predicate(ColumnRef::new(alias, column), filter)
    }

    #[test]
    fn test_no_filters_is_noop() {
        let registry = scenario_registry();
        let options = CompileOptions::default();
        let compiled = FilterCompiler::new(&registry, &options)
            .compile_filters("ClientManagementObject", &ActiveFilterSet::new())
            .unwrap();

        assert!(compiled.is_empty());
        assert_eq!(compiled.condition, Clause::True);
        assert!(compiled.joins.is_empty());
    }

    #[test]
    fn test_one_hop_relation_value_uses_foreign_key() {
        let registry = scenario_registry();
        let options = CompileOptions::default();
        let compiled = FilterCompiler::new(&registry, &options)
            .compile_filters("User", &location_filters(&[1]))
            .unwrap();

        assert!(compiled.joins.is_empty());
        assert_eq!(compiled.condition, pred("e0", "location_id", in_one()));
    }

    #[test]
    fn test_primary_query_with_multiple_filters() {
        let registry = scenario_registry();
        let options = CompileOptions::default();
        let compiled = FilterCompiler::new(&registry, &options)
            .compile_filters("ClientManagementObject", &location_filters(&[1]))
            .unwrap();

        assert_eq!(compiled.joins.len(), 1);
        let owner = compiled.join_for("owner").unwrap();
        assert_eq!(owner.alias, "e1");
        assert_eq!(owner.table, "user");
        assert_eq!(
            owner.on,
            vec![(ColumnRef::new("e0", "owner_id"), ColumnRef::new("e1", "id"))]
        );
        // User's own byLocation filter rides on the join
        assert_eq!(owner.filter, pred("e1", "location_id", in_one()));

        assert_eq!(
            compiled.condition,
            Clause::And(vec![
                pred("e1", "location_id", in_one()),
                pred("e0", "deleted_at", ScalarFilter::IsNull),
            ])
        );
    }

    #[test]
    fn test_population_root_resolves_three_hops_with_joins() {
        let registry = scenario_registry();
        let options = CompileOptions::default();
        let compiled = FilterCompiler::new(&registry, &options)
            .compile_filters("Client", &location_filters(&[1]))
            .unwrap();

        let paths: Vec<&str> = compiled.joins.iter().map(|j| j.path.as_str()).collect();
        assert_eq!(paths, vec!["managementObjects", "managementObjects.owner"]);

        let cmo = compiled.join_for("managementObjects").unwrap();
        assert_eq!(
            cmo.on,
            vec![(ColumnRef::new("e0", "id"), ColumnRef::new("e1", "client_id"))]
        );

        assert_eq!(compiled.condition, pred("e2", "location_id", in_one()));

        // The management objects' own filters reuse the owner join.
        assert_eq!(
            cmo.filter,
            Clause::And(vec![
                pred("e2", "location_id", in_one()),
                pred("e1", "deleted_at", ScalarFilter::IsNull),
            ])
        );
        let owner = compiled.join_for("managementObjects.owner").unwrap();
        assert_eq!(owner.filter, pred("e2", "location_id", in_one()));
    }

    #[test]
    fn test_nested_paths_never_become_literals() {
        let registry = scenario_registry();
        let options = CompileOptions::default();
        let compiler = FilterCompiler::new(&registry, &options);

        for entity in ["User", "Client", "ClientManagementObject"] {
            let compiled = compiler.compile_filters(entity, &location_filters(&[1, 2])).unwrap();
            let predicates = compiled
                .joins
                .iter()
                .flat_map(|j| j.filter.predicates())
                .chain(compiled.condition.predicates());
            for (column, filter) in predicates {
                assert!(
                    filter.values().iter().all(|v| !v.is_structured()),
                    "{} compared with a structured value on {}",
                    column,
                    entity
                );
            }
        }
    }

    #[test]
    fn test_structured_relation_value_is_rejected() {
        let registry = scenario_registry();
        let options = CompileOptions::default();
        let tree = ConditionTree::new().field(
            "owner",
            ScalarFilter::Equals(FilterValue::Json(json!({ "location": { "$in": [1] } }))),
        );
        let err = FilterCompiler::new(&registry, &options)
            .compile("ClientManagementObject", &tree, &ActiveFilterSet::new())
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::InvalidFilter);
        assert_eq!(err.context.field.as_deref(), Some("owner"));
    }

    #[test]
    fn test_alias_reused_across_filters() {
        let registry = scenario_registry();
        let options = CompileOptions::default().without_propagation();
        let tree = ConditionTree::new()
            .path("owner.name", "Alice")
            .path("owner.location.name", "HQ");
        let compiled = FilterCompiler::new(&registry, &options)
            .compile("ClientManagementObject", &tree, &location_filters(&[1]))
            .unwrap();

        let paths: Vec<&str> = compiled.joins.iter().map(|j| j.path.as_str()).collect();
        assert_eq!(paths, vec!["owner", "owner.location"]);
        assert_eq!(
            compiled.condition,
            Clause::And(vec![
                pred("e1", "name", ScalarFilter::Equals("Alice".into())),
                pred("e2", "name", ScalarFilter::Equals("HQ".into())),
                pred("e1", "location_id", in_one()),
                pred("e0", "deleted_at", ScalarFilter::IsNull),
            ])
        );
    }

    #[test]
    fn test_scalar_filters_split_across_filters_are_equivalent() {
        let options = CompileOptions::default();
        let single = EntityRegistry::new().register(
            EntityMeta::new("Post", "post")
                .scalar("title")
                .scalar("views")
                .filter(FilterDefinition::constant(
                    "both",
                    ConditionTree::new().value("title", "a").field("views", ScalarFilter::Gt(10i64.into())),
                )),
        );
        let split = EntityRegistry::new().register(
            EntityMeta::new("Post", "post")
                .scalar("title")
                .scalar("views")
                .filter(FilterDefinition::constant("title", ConditionTree::new().value("title", "a")))
                .filter(FilterDefinition::constant(
                    "views",
                    ConditionTree::new().field("views", ScalarFilter::Gt(10i64.into())),
                )),
        );

        let one = FilterCompiler::new(&single, &options)
            .compile_filters("Post", &ActiveFilterSet::new().enable("both"))
            .unwrap();
        let many = FilterCompiler::new(&split, &options)
            .compile_filters("Post", &ActiveFilterSet::new().enable("title").enable("views"))
            .unwrap();
        assert_eq!(one, many);
    }

    #[test]
    fn test_compilation_is_deterministic() {
        let registry = scenario_registry();
        let options = CompileOptions::default();
        let compiler = FilterCompiler::new(&registry, &options);
        let a = compiler.compile_filters("Client", &location_filters(&[1, 2])).unwrap();
        let b = compiler.compile_filters("Client", &location_filters(&[1, 2])).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_unknown_field_fails_fast() {
        let registry = scenario_registry();
        let options = CompileOptions::default();
        let tree = ConditionTree::new().path("owner.nickname", "x");
        let err = FilterCompiler::new(&registry, &options)
            .compile("ClientManagementObject", &tree, &ActiveFilterSet::new())
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::UnknownField);
        assert_eq!(err.context.entity.as_deref(), Some("User"));
        assert_eq!(err.context.field.as_deref(), Some("owner.nickname"));
    }

    #[test]
    fn test_nested_condition_on_scalar_fails() {
        let registry = scenario_registry();
        let options = CompileOptions::default();
        let tree = ConditionTree::new().relation("name", ConditionTree::new().value("x", 1i64));
        let err = FilterCompiler::new(&registry, &options)
            .compile("User", &tree, &ActiveFilterSet::new())
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFilter);
    }

    #[test]
    fn test_missing_parameter_fails() {
        let registry = scenario_registry();
        let options = CompileOptions::default();
        let err = FilterCompiler::new(&registry, &options)
            .compile_filters("User", &ActiveFilterSet::new().enable("byLocation"))
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::MissingParameter);
        assert!(err.message.contains("byLocation"));
        assert!(err.message.contains("locations"));
    }

    #[test]
    fn test_unknown_filter_fails() {
        let registry = scenario_registry();
        let options = CompileOptions::default();
        let err = FilterCompiler::new(&registry, &options)
            .compile_filters("User", &ActiveFilterSet::new().enable("archived"))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownFilter);
    }

    #[test]
    fn test_empty_nested_condition_checks_existence() {
        let registry = scenario_registry();
        let options = CompileOptions::default();
        let tree = ConditionTree::new().relation("owner", ConditionTree::new());
        let compiled = FilterCompiler::new(&registry, &options)
            .compile("ClientManagementObject", &tree, &ActiveFilterSet::new())
            .unwrap();
        assert_eq!(compiled.condition, pred("e1", "id", ScalarFilter::IsNotNull));
    }

    #[test]
    fn test_to_many_relation_value_compares_related_key() {
        let registry = scenario_registry();
        let options = CompileOptions::default();
        let tree = ConditionTree::new().value("managementObjects", vec![7i64]);
        let compiled = FilterCompiler::new(&registry, &options)
            .compile("Client", &tree, &ActiveFilterSet::new())
            .unwrap();

        assert_eq!(compiled.joins.len(), 1);
        assert_eq!(compiled.condition, pred("e1", "id", ScalarFilter::In(vec![FilterValue::Int(7)])));
    }

    #[test]
    fn test_logical_groups() {
        let registry = scenario_registry();
        let options = CompileOptions::default();
        let tree = ConditionTree::new().or([
            ConditionTree::new().value("name", "a"),
            ConditionTree::new().path("owner.name", "b"),
        ]);
        let compiled = FilterCompiler::new(&registry, &options)
            .compile("ClientManagementObject", &tree, &ActiveFilterSet::new())
            .unwrap();

        assert_eq!(
            compiled.condition,
            Clause::Or(vec![
                pred("e0", "name", ScalarFilter::Equals("a".into())),
                pred("e1", "name", ScalarFilter::Equals("b".into())),
            ])
        );
    }

    #[test]
    fn test_propagation_stops_at_cycles() {
        let registry = EntityRegistry::new()
            .register(
                EntityMeta::new("Parent", "parent")
                    .relation(RelationSpec::one_to_many("children", "Child", "parent_id").mapped_by("parent"))
                    .filter(FilterDefinition::constant(
                        "live",
                        ConditionTree::new().relation("children", ConditionTree::new()),
                    )),
            )
            .register(
                EntityMeta::new("Child", "child")
                    .relation(RelationSpec::many_to_one("parent", "Parent", "parent_id"))
                    .filter(FilterDefinition::constant(
                        "live",
                        ConditionTree::new().relation("parent", ConditionTree::new()),
                    )),
            );
        let options = CompileOptions::default();
        let compiled = FilterCompiler::new(&registry, &options)
            .compile_filters("Parent", &ActiveFilterSet::new().enable("live"))
            .unwrap();

        let paths: Vec<&str> = compiled.joins.iter().map(|j| j.path.as_str()).collect();
        assert_eq!(paths, vec!["children", "children.parent"]);
    }

    #[test]
    fn test_compile_condition_into_shared_context() {
        let registry = scenario_registry();
        let options = CompileOptions::default().without_propagation();
        let compiler = FilterCompiler::new(&registry, &options);
        let mut ctx = compiler.context();
        let active = ActiveFilterSet::new();

        compiler
            .compile_condition(&ConditionTree::new().path("owner.name", "a"), "ClientManagementObject", &mut ctx, &active)
            .unwrap();
        compiler
            .compile_condition(&ConditionTree::new().path("owner.location.name", "b"), "ClientManagementObject", &mut ctx, &active)
            .unwrap();

        assert_eq!(ctx.len(), 2);
    }

    #[test]
    fn test_default_filters_apply_to_joins() {
        let registry = EntityRegistry::new()
            .register(
                EntityMeta::new("Post", "post")
                    .relation(RelationSpec::many_to_one("author", "Author", "author_id")),
            )
            .register(
                EntityMeta::new("Author", "author")
                    .column("bannedAt", "banned_at", true)
                    .filter(
                        FilterDefinition::constant("active", ConditionTree::new().value("bannedAt", FilterValue::Null))
                            .default_enabled(true),
                    ),
            );
        let options = CompileOptions::default();
        let compiler = FilterCompiler::new(&registry, &options);
        let tree = ConditionTree::new().relation("author", ConditionTree::new());

        let compiled = compiler.compile("Post", &tree, &ActiveFilterSet::new()).unwrap();
        assert_eq!(compiled.condition, pred("e1", "id", ScalarFilter::IsNotNull));
        assert_eq!(compiled.joins[0].filter, pred("e1", "banned_at", ScalarFilter::IsNull));

        let compiled = compiler
            .compile("Post", &tree, &ActiveFilterSet::new().disable("active"))
            .unwrap();
        assert_eq!(compiled.condition, pred("e1", "id", ScalarFilter::IsNotNull));
        assert!(compiled.joins[0].filter.is_true());
    }

    #[test]
    fn test_params_reach_joined_filters() {
        let registry = scenario_registry();
        let options = CompileOptions::default();
        let active = ActiveFilterSet::new()
            .enable_with("byLocation", FilterParams::new().set("locations", vec![5i64]));
        let compiled = FilterCompiler::new(&registry, &options)
            .compile_filters("Client", &active)
            .unwrap();

        let five = ScalarFilter::In(vec![FilterValue::Int(5)]);
        assert!(compiled.condition.predicates().iter().all(|(_, f)| **f == five));
        assert!(compiled.joins.iter().all(|j| j.filter.predicates().iter().all(|(_, f)| **f == five)));
    }

    #[test]
    fn test_absence_check_ignores_filtered_out_rows() {
        let registry = scenario_registry();
        let options = CompileOptions::default();
        let tree = ConditionTree::new().value("managementObjects", FilterValue::Null);
        let compiled = FilterCompiler::new(&registry, &options)
            .compile("Client", &tree, &ActiveFilterSet::new().enable("notDeleted"))
            .unwrap();

        // The soft-delete check belongs to the join, not to the absence test.
        assert_eq!(compiled.condition, pred("e1", "id", ScalarFilter::IsNull));
        let cmo = compiled.join_for("managementObjects").unwrap();
        assert_eq!(cmo.filter, pred("e1", "deleted_at", ScalarFilter::IsNull));
    }

    #[test]
    fn test_without_propagation_joins_carry_no_filter() {
        let registry = scenario_registry();
        let options = CompileOptions::default().without_propagation();
        let compiled = FilterCompiler::new(&registry, &options)
            .compile_filters("Client", &location_filters(&[1]))
            .unwrap();
        assert!(compiled.joins.iter().all(|j| j.filter.is_true()));
    }
}
