/// Project entity type definitions
///
/// A project is the top-level record of the datastore: slides, media and
/// questions all hang off it. Its JSON form, with default field names:
///
/// ```json
/// {
///   "id": "p1", "parent": null, "original_parent": null,
///   "category": "catX", "language": "langY", "author": "userZ",
///   "name": "Demo", "description": "d", "tags": ["a", "b"],
///   "is_dubbed": false, "is_edited": false,
///   "resolution_x": 1920, "resolution_y": 1080,
///   "slide_ordering_sequence": [0, 1], "slides": []
/// }
/// ```

use crate::{
    backend::{Backend, Record},
    config::{ModelConfig, ModelsConfig},
    entity::{Entity, EntityContext, Lifecycle},
    error::{EntityError, EntityResult},
    json,
    project::validate,
};
use async_trait::async_trait;
use serde_json::{json, Map, Value};

/// Every property of a project, in table order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectField {
    Id,
    Parent,
    OriginalParent,
    Category,
    Language,
    Author,
    Name,
    Description,
    Tags,
    IsDubbed,
    IsEdited,
    ResolutionX,
    ResolutionY,
    SlideOrderingSequence,
    Slides,
}

impl ProjectField {
    pub const ALL: [ProjectField; 15] = [
        ProjectField::Id,
        ProjectField::Parent,
        ProjectField::OriginalParent,
        ProjectField::Category,
        ProjectField::Language,
        ProjectField::Author,
        ProjectField::Name,
        ProjectField::Description,
        ProjectField::Tags,
        ProjectField::IsDubbed,
        ProjectField::IsEdited,
        ProjectField::ResolutionX,
        ProjectField::ResolutionY,
        ProjectField::SlideOrderingSequence,
        ProjectField::Slides,
    ];

    /// Order the JSON validation chain runs in. Slides come before the ordering
    /// sequence that indexes them.
    pub const VALIDATION_ORDER: [ProjectField; 15] = [
        ProjectField::Id,
        ProjectField::Parent,
        ProjectField::OriginalParent,
        ProjectField::Category,
        ProjectField::Language,
        ProjectField::Author,
        ProjectField::Name,
        ProjectField::Description,
        ProjectField::Tags,
        ProjectField::IsDubbed,
        ProjectField::IsEdited,
        ProjectField::ResolutionX,
        ProjectField::ResolutionY,
        ProjectField::Slides,
        ProjectField::SlideOrderingSequence,
    ];

    /// Public property name
    pub fn property_name(self) -> &'static str {
        match self {
            ProjectField::Id => "id",
            ProjectField::Parent => "parent",
            ProjectField::OriginalParent => "originalParent",
            ProjectField::Category => "category",
            ProjectField::Language => "language",
            ProjectField::Author => "author",
            ProjectField::Name => "name",
            ProjectField::Description => "description",
            ProjectField::Tags => "tags",
            ProjectField::IsDubbed => "isDubbed",
            ProjectField::IsEdited => "isEdited",
            ProjectField::ResolutionX => "resolutionX",
            ProjectField::ResolutionY => "resolutionY",
            ProjectField::SlideOrderingSequence => "slideOrderingSequence",
            ProjectField::Slides => "slides",
        }
    }

    /// Role key in the project field table
    pub fn role(self) -> &'static str {
        match self {
            ProjectField::Id => "ID_FIELD",
            ProjectField::Parent => "PARENT_FIELD",
            ProjectField::OriginalParent => "ORIGINAL_PARENT_FIELD",
            ProjectField::Category => "CATEGORY_FIELD",
            ProjectField::Language => "LANGUAGE_FIELD",
            ProjectField::Author => "AUTHOR_FIELD",
            ProjectField::Name => "NAME_FIELD",
            ProjectField::Description => "DESCRIPTION_FIELD",
            ProjectField::Tags => "TAGS_FIELD",
            ProjectField::IsDubbed => "IS_DUBBED_FIELD",
            ProjectField::IsEdited => "IS_EDITED_FIELD",
            ProjectField::ResolutionX => "RESOLUTION_X_FIELD",
            ProjectField::ResolutionY => "RESOLUTION_Y_FIELD",
            ProjectField::SlideOrderingSequence => "SLIDE_ORDERING_SEQUENCE_FIELD",
            ProjectField::Slides => "SLIDES_FIELD",
        }
    }
}

/// Id of another record, plus the record itself when it was resolved during validation
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    id: String,
    target: Option<Record>,
}

impl Reference {
    pub fn unresolved(id: impl Into<String>) -> Self {
        Self { id: id.into(), target: None }
    }

    pub fn resolved(record: Record) -> Self {
        Self {
            id: record.id().to_string(),
            target: Some(record),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn target(&self) -> Option<&Record> {
        self.target.as_ref()
    }
}

/// Typed project state, filled in by validation or record decoding
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ProjectFields {
    pub id: String,
    pub parent: Option<Reference>,
    pub original_parent: Option<Reference>,
    pub category: Option<Reference>,
    pub language: Option<Reference>,
    pub author: Option<Reference>,
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub is_dubbed: bool,
    pub is_edited: bool,
    pub resolution_x: i64,
    pub resolution_y: i64,
    pub slide_ordering_sequence: Vec<i64>,
    /// Raw slide JSON; slides are not validated yet
    pub slides: Vec<Value>,
}

/// A validated row of the project class
///
/// Fields are private and only readable. `assign` exists so callers get an
/// explicit error instead of silently diverging copies.
#[derive(Debug, Clone)]
pub struct Project {
    fields: ProjectFields,
    model: ModelConfig,
    record: Record,
    lifecycle: Lifecycle,
}

impl Project {
    /// Project id
    pub fn id(&self) -> &str {
        &self.fields.id
    }

    /// Id of the parent project, if any
    pub fn parent(&self) -> Option<&str> {
        self.fields.parent.as_ref().map(Reference::id)
    }

    /// Id of the project this one was originally derived from
    pub fn original_parent(&self) -> Option<&str> {
        self.fields.original_parent.as_ref().map(Reference::id)
    }

    /// Category id
    pub fn category(&self) -> Option<&str> {
        self.fields.category.as_ref().map(Reference::id)
    }

    /// Language id
    pub fn language(&self) -> Option<&str> {
        self.fields.language.as_ref().map(Reference::id)
    }

    /// Author (user) id
    pub fn author(&self) -> Option<&str> {
        self.fields.author.as_ref().map(Reference::id)
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.fields.name
    }

    /// Free-text description
    pub fn description(&self) -> &str {
        &self.fields.description
    }

    /// Tags in payload order
    pub fn tags(&self) -> &[String] {
        &self.fields.tags
    }

    /// Whether the project has been dubbed
    pub fn is_dubbed(&self) -> bool {
        self.fields.is_dubbed
    }

    /// Whether the project has been edited
    pub fn is_edited(&self) -> bool {
        self.fields.is_edited
    }

    /// Horizontal resolution in pixels
    pub fn resolution_x(&self) -> i64 {
        self.fields.resolution_x
    }

    /// Vertical resolution in pixels
    pub fn resolution_y(&self) -> i64 {
        self.fields.resolution_y
    }

    /// Slide indices in display order
    pub fn slide_ordering_sequence(&self) -> &[i64] {
        &self.fields.slide_ordering_sequence
    }

    /// Raw slide JSON
    pub fn slides(&self) -> &[Value] {
        &self.fields.slides
    }

    /// Reference handle for a reference property, None for scalar properties or null references
    pub fn reference(&self, field: ProjectField) -> Option<&Reference> {
        match field {
            ProjectField::Parent => self.fields.parent.as_ref(),
            ProjectField::OriginalParent => self.fields.original_parent.as_ref(),
            ProjectField::Category => self.fields.category.as_ref(),
            ProjectField::Language => self.fields.language.as_ref(),
            ProjectField::Author => self.fields.author.as_ref(),
            _ => None,
        }
    }

    /// Properties are read-only after construction; every write is refused.
    pub fn assign(&mut self, field: ProjectField, _value: Value) -> EntityResult<()> {
        let error = EntityError::immutable_write(&self.model.class_name, field.property_name());
        tracing::warn!("❌ {}", error);
        Err(error)
    }

    /// Current value of a property as JSON, references as ids
    pub fn value_of(&self, field: ProjectField) -> Value {
        match field {
            ProjectField::Id => json!(self.id()),
            ProjectField::Parent => json!(self.parent()),
            ProjectField::OriginalParent => json!(self.original_parent()),
            ProjectField::Category => json!(self.category()),
            ProjectField::Language => json!(self.language()),
            ProjectField::Author => json!(self.author()),
            ProjectField::Name => json!(self.name()),
            ProjectField::Description => json!(self.description()),
            ProjectField::Tags => json!(self.tags()),
            ProjectField::IsDubbed => json!(self.is_dubbed()),
            ProjectField::IsEdited => json!(self.is_edited()),
            ProjectField::ResolutionX => json!(self.resolution_x()),
            ProjectField::ResolutionY => json!(self.resolution_y()),
            ProjectField::SlideOrderingSequence => json!(self.slide_ordering_sequence()),
            ProjectField::Slides => json!(self.slides()),
        }
    }

    fn serialize(&self, expand_references: bool) -> Value {
        let mut object = Map::new();
        for field in ProjectField::ALL {
            let value = match self.reference(field).and_then(Reference::target) {
                Some(target) if expand_references => target.to_json(),
                _ => self.value_of(field),
            };
            object.insert(self.model.field(field.role()), value);
        }
        Value::Object(object)
    }
}

#[async_trait]
impl Entity for Project {
    fn class_name(models: &ModelsConfig) -> &str {
        &models.project.class_name
    }

    fn construct_from_record(record: Record, models: &ModelsConfig) -> EntityResult<Self> {
        let model = models.project.clone();
        let fields = validate::decode_record(&record, &model)?;

        tracing::debug!("✅ Decoded {} {} from record", model.class_name, fields.id);
        Ok(Self {
            fields,
            model,
            record,
            lifecycle: Lifecycle::Validated,
        })
    }

    async fn construct_from_json(json_string: &str, ctx: &EntityContext) -> EntityResult<Self> {
        let model = ctx.models().project.clone();

        tracing::debug!("{} lifecycle: {:?}", model.class_name, Lifecycle::ParsingJson);
        let object = match json::try_parse_object(json_string) {
            Some(object) => object,
            None => {
                tracing::debug!("{} lifecycle: {:?}", model.class_name, Lifecycle::Rejected);
                return Err(EntityError::InvalidJson);
            }
        };

        tracing::debug!("{} lifecycle: {:?}", model.class_name, Lifecycle::ValidatingFields);
        let fields = match validate::run_chain(object, &model, ctx).await {
            Ok(fields) => fields,
            Err(e) => {
                tracing::debug!("{} lifecycle: {:?}", model.class_name, Lifecycle::Rejected);
                return Err(e);
            }
        };

        tracing::info!("✅ {} {} validated", model.class_name, fields.id);
        let record = Record::new(model.class_name.clone(), fields.id.clone());
        Ok(Self {
            fields,
            model,
            record,
            lifecycle: Lifecycle::Validated,
        })
    }

    fn raw_object(&self) -> &Record {
        &self.record
    }

    fn serialize_with_ids(&self) -> Value {
        self.serialize(false)
    }

    fn serialize_with_objects(&self) -> Value {
        self.serialize(true)
    }

    async fn save(&mut self, backend: &dyn Backend) -> EntityResult<Record> {
        for field in ProjectField::ALL {
            let value = self.value_of(field);
            self.record.set(&self.model.field(field.role()), value);
        }

        let saved = match backend.save(&self.record).await {
            Ok(saved) => saved,
            Err(e) => {
                tracing::error!("❌ Failed to save {} {}: {}", self.model.class_name, self.id(), e);
                return Err(e.into());
            }
        };

        self.record = saved.clone();
        self.lifecycle = Lifecycle::Saved;
        tracing::info!("💾 Saved {} {}", self.model.class_name, self.id());
        Ok(saved)
    }

    fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }
}
