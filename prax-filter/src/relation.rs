//! Relation specification types.

/// Type of relation between entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationType {
    /// One-to-one relation (e.g., User has one Profile).
    OneToOne,
    /// One-to-many relation (e.g., Client has many management objects).
    OneToMany,
    /// Many-to-one relation (e.g., management object belongs to a Client).
    ManyToOne,
}

impl RelationType {
    /// Check if this relation returns multiple records.
    pub fn is_many(&self) -> bool {
        matches!(self, Self::OneToMany)
    }

    /// Check if this relation returns a single record.
    pub fn is_one(&self) -> bool {
        matches!(self, Self::OneToOne | Self::ManyToOne)
    }
}

/// Specification for a relation between entities.
///
/// `fields` are columns on the declaring entity and `references` the
/// matching columns on the related entity, pairwise. A join from alias
/// `a` to alias `b` is therefore `a.fields[i] = b.references[i]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationSpec {
    /// Name of the relation (field name).
    pub name: String,
    /// Type of relation.
    pub relation_type: RelationType,
    /// Name of the related entity.
    pub related_entity: String,
    /// Columns on this entity.
    pub fields: Vec<String>,
    /// Columns on the related entity.
    pub references: Vec<String>,
    /// Name of the owning relation on the other side, for inverse sides.
    pub mapped_by: Option<String>,
}

impl RelationSpec {
    fn new(name: impl Into<String>, relation_type: RelationType, related: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            relation_type,
            related_entity: related.into(),
            fields: Vec::new(),
            references: Vec::new(),
            mapped_by: None,
        }
    }

    /// Create a many-to-one relation spec holding the foreign key locally.
    ///
    /// ```rust
    /// use prax_filter::RelationSpec;
    ///
    /// let owner = RelationSpec::many_to_one("owner", "User", "owner_id");
    /// assert_eq!(owner.fields, vec!["owner_id"]);
    /// assert_eq!(owner.references, vec!["id"]);
    /// ```
    pub fn many_to_one(
        name: impl Into<String>,
        related_entity: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        let mut spec = Self::new(name, RelationType::ManyToOne, related_entity);
        spec.fields = vec![foreign_key.into()];
        spec.references = vec!["id".to_string()];
        spec
    }

    /// Create an owning one-to-one relation spec holding the foreign key locally.
    pub fn one_to_one(
        name: impl Into<String>,
        related_entity: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        let mut spec = Self::new(name, RelationType::OneToOne, related_entity);
        spec.fields = vec![foreign_key.into()];
        spec.references = vec!["id".to_string()];
        spec
    }

    /// Create a one-to-many relation spec; the foreign key lives on the
    /// related entity.
    pub fn one_to_many(
        name: impl Into<String>,
        related_entity: impl Into<String>,
        remote_foreign_key: impl Into<String>,
    ) -> Self {
        let mut spec = Self::new(name, RelationType::OneToMany, related_entity);
        spec.fields = vec!["id".to_string()];
        spec.references = vec![remote_foreign_key.into()];
        spec
    }

    /// Set the local columns.
    pub fn fields(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Set the referenced columns.
    pub fn references(mut self, refs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.references = refs.into_iter().map(Into::into).collect();
        self
    }

    /// Mark this side as the inverse of `owner` on the related entity.
    pub fn mapped_by(mut self, owner: impl Into<String>) -> Self {
        self.mapped_by = Some(owner.into());
        self
    }

    /// Whether the foreign key is stored on the declaring entity.
    pub fn is_owning(&self) -> bool {
        match self.relation_type {
            RelationType::ManyToOne => true,
            RelationType::OneToOne => self.mapped_by.is_none(),
            RelationType::OneToMany => false,
        }
    }

    /// The local column compared against when a relation is filtered by
    /// a bare key value.
    pub fn local_key(&self) -> Option<&str> {
        self.fields.first().map(String::as_str)
    }

    /// Column pairs `(local, remote)` that join the two entities.
    pub fn key_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .zip(self.references.iter())
            .map(|(f, r)| (f.as_str(), r.as_str()))
    }
}
