//! Company → Location → User → Client → ClientManagementObject metadata
//! shared by unit tests.

use crate::condition::ConditionTree;
use crate::definition::{ActiveFilterSet, FilterDefinition, FilterParams};
use crate::filter::FilterValue;
use crate::metadata::{EntityMeta, EntityRegistry};
use crate::relation::RelationSpec;

fn by_location(shape: fn(FilterValue) -> ConditionTree) -> FilterDefinition {
    FilterDefinition::new("byLocation", move |args| Ok(shape(args.require("locations")?.clone())))
        .requires(["locations"])
}

pub(crate) fn scenario_registry() -> EntityRegistry {
    EntityRegistry::new()
        .register(EntityMeta::new("Company", "company").scalar("name"))
        .register(
            EntityMeta::new("Location", "location")
                .scalar("name")
                .relation(RelationSpec::many_to_one("company", "Company", "company_id")),
        )
        .register(
            EntityMeta::new("User", "user")
                .scalar("name")
                .relation(RelationSpec::many_to_one("location", "Location", "location_id"))
                .filter(by_location(|locations| ConditionTree::new().value("location", locations))),
        )
        .register(
            EntityMeta::new("ClientManagementObject", "client_management_object")
                .column("deletedAt", "deleted_at", true)
                .scalar("name")
                .relation(RelationSpec::many_to_one("client", "Client", "client_id"))
                .relation(RelationSpec::many_to_one("owner", "User", "owner_id"))
                .filter(by_location(|locations| {
                    ConditionTree::new().relation("owner", ConditionTree::new().value("location", locations))
                }))
                .filter(FilterDefinition::constant(
                    "notDeleted",
                    ConditionTree::new().value("deletedAt", FilterValue::Null),
                )),
        )
        .register(
            EntityMeta::new("Client", "client")
                .scalar("name")
                .relation(
                    RelationSpec::one_to_many("managementObjects", "ClientManagementObject", "client_id")
                        .mapped_by("client"),
                )
                .filter(by_location(|locations| {
                    ConditionTree::new().relation(
                        "managementObjects",
                        ConditionTree::new()
                            .relation("owner", ConditionTree::new().value("location", locations)),
                    )
                })),
        )
}

/// `byLocation` bound to `ids` plus `notDeleted`.
pub(crate) fn location_filters(ids: &[i64]) -> ActiveFilterSet {
    ActiveFilterSet::new()
        .enable_with("byLocation", FilterParams::new().set("locations", ids.to_vec()))
        .enable("notDeleted")
}
