/// Project validation chain
///
/// Fields are validated one at a time in `ProjectField::VALIDATION_ORDER`.
/// Reference fields suspend on a backend lookup; everything else is a plain
/// predicate over the parsed object. The first failure aborts the chain and the
/// partially filled draft is dropped with it.

use crate::{
    backend::Record,
    config::ModelConfig,
    entity::{validate_boolean_field, validate_reference_field, EntityContext, RawObject},
    error::{EntityError, EntityResult},
    json,
    project::types::{ProjectField, ProjectFields, Reference},
};
use serde_json::Value;

/// Draft project being filled in by the chain
struct ProjectDraft<'a> {
    object: &'a RawObject,
    model: &'a ModelConfig,
    ctx: &'a EntityContext,
    fields: ProjectFields,
}

impl ProjectDraft<'_> {
    async fn validate(&mut self, field: ProjectField) -> EntityResult<()> {
        let name = self.model.field(field.role());
        let class_name = self.model.class_name.as_str();
        let object = self.object;

        match field {
            ProjectField::Id => self.fields.id = string_field(object, &name, class_name)?,
            ProjectField::Parent => {
                self.fields.parent = self.reference(&name, class_name).await?;
            }
            ProjectField::OriginalParent => {
                self.fields.original_parent = self.reference(&name, class_name).await?;
            }
            ProjectField::Category => {
                let target = self.ctx.models().category.class_name.as_str();
                self.fields.category = self.reference(&name, target).await?;
            }
            ProjectField::Language => {
                let target = self.ctx.models().language.class_name.as_str();
                self.fields.language = self.reference(&name, target).await?;
            }
            ProjectField::Author => {
                let target = self.ctx.models().user.class_name.as_str();
                self.fields.author = self.reference(&name, target).await?;
            }
            ProjectField::Name => self.fields.name = string_field(object, &name, class_name)?,
            ProjectField::Description => {
                self.fields.description = string_field(object, &name, class_name)?;
            }
            ProjectField::Tags => self.fields.tags = string_array_field(object, &name, class_name)?,
            ProjectField::IsDubbed => {
                self.fields.is_dubbed = validate_boolean_field(object, &name, class_name)?;
            }
            ProjectField::IsEdited => {
                self.fields.is_edited = validate_boolean_field(object, &name, class_name)?;
            }
            ProjectField::ResolutionX => {
                self.fields.resolution_x = integer_field(object, &name, class_name)?;
            }
            ProjectField::ResolutionY => {
                self.fields.resolution_y = integer_field(object, &name, class_name)?;
            }
            ProjectField::Slides => self.fields.slides = slides_field(object, &name),
            ProjectField::SlideOrderingSequence => {
                self.fields.slide_ordering_sequence = integer_array_field(object, &name, class_name)?;
            }
        }
        Ok(())
    }

    async fn reference(&self, name: &str, target_class: &str) -> EntityResult<Option<Reference>> {
        let resolved = validate_reference_field(
            self.object,
            name,
            &self.model.class_name,
            target_class,
            self.ctx.backend(),
        )
        .await?;
        Ok(resolved.map(Reference::resolved))
    }
}

/// Run the full chain over a parsed payload
///
/// Consumes the parsed object; it does not outlive validation.
pub(crate) async fn run_chain(
    object: RawObject,
    model: &ModelConfig,
    ctx: &EntityContext,
) -> EntityResult<ProjectFields> {
    let mut draft = ProjectDraft {
        object: &object,
        model,
        ctx,
        fields: ProjectFields::default(),
    };

    for field in ProjectField::VALIDATION_ORDER {
        tracing::debug!("🔍 Validating {}.{}", model.class_name, field.property_name());
        if let Err(e) = draft.validate(field).await {
            tracing::warn!("❌ {} rejected at {}: {}", model.class_name, field.property_name(), e);
            return Err(e);
        }
    }

    Ok(draft.fields)
}

/// Decode a trusted record without existence lookups
///
/// Values are copied, not re-validated: references are never looked up. Shapes
/// are still checked because the fields are typed; a record missing a required
/// scalar or holding the wrong JSON type cannot be represented and is refused
/// with `FieldNotPresent`/`TypeMismatch` instead of being defaulted or coerced.
/// Absent reference and slide fields decode as empty.
///
/// The entity id is the record's id. A stored id field, when present, must be
/// the same string.
pub(crate) fn decode_record(record: &Record, model: &ModelConfig) -> EntityResult<ProjectFields> {
    let object = record.fields();
    let class_name = model.class_name.as_str();
    let name = |field: ProjectField| model.field(field.role());

    Ok(ProjectFields {
        id: stored_id(record, &name(ProjectField::Id), class_name)?,
        parent: stored_reference(object, &name(ProjectField::Parent), class_name)?,
        original_parent: stored_reference(object, &name(ProjectField::OriginalParent), class_name)?,
        category: stored_reference(object, &name(ProjectField::Category), class_name)?,
        language: stored_reference(object, &name(ProjectField::Language), class_name)?,
        author: stored_reference(object, &name(ProjectField::Author), class_name)?,
        name: string_field(object, &name(ProjectField::Name), class_name)?,
        description: string_field(object, &name(ProjectField::Description), class_name)?,
        tags: string_array_field(object, &name(ProjectField::Tags), class_name)?,
        is_dubbed: validate_boolean_field(object, &name(ProjectField::IsDubbed), class_name)?,
        is_edited: validate_boolean_field(object, &name(ProjectField::IsEdited), class_name)?,
        resolution_x: integer_field(object, &name(ProjectField::ResolutionX), class_name)?,
        resolution_y: integer_field(object, &name(ProjectField::ResolutionY), class_name)?,
        slide_ordering_sequence: integer_array_field(
            object,
            &name(ProjectField::SlideOrderingSequence),
            class_name,
        )?,
        slides: slides_field(object, &name(ProjectField::Slides)),
    })
}

fn stored_id(record: &Record, field: &str, class_name: &str) -> EntityResult<String> {
    match record.get(field) {
        None => Ok(record.id().to_string()),
        Some(Value::String(stored)) if stored == record.id() => Ok(stored.clone()),
        Some(Value::String(stored)) => Err(EntityError::id_mismatch(field, class_name, record.id(), stored)),
        Some(other) => Err(EntityError::type_mismatch(field, class_name, json::type_name(other), "string")),
    }
}

fn present<'a>(object: &'a RawObject, field: &str, class_name: &str) -> EntityResult<&'a Value> {
    object
        .get(field)
        .ok_or_else(|| EntityError::field_not_present(field, class_name))
}

fn string_field(object: &RawObject, field: &str, class_name: &str) -> EntityResult<String> {
    match present(object, field, class_name)? {
        Value::String(value) => Ok(value.clone()),
        other => Err(EntityError::type_mismatch(field, class_name, json::type_name(other), "string")),
    }
}

fn integer_field(object: &RawObject, field: &str, class_name: &str) -> EntityResult<i64> {
    let value = present(object, field, class_name)?;
    json::as_integer(value)
        .ok_or_else(|| EntityError::type_mismatch(field, class_name, json::type_name(value), "integer"))
}

fn array_field<'a>(
    object: &'a RawObject,
    field: &str,
    class_name: &str,
    expected: &str,
) -> EntityResult<&'a Vec<Value>> {
    match present(object, field, class_name)? {
        Value::Array(items) => Ok(items),
        other => Err(EntityError::type_mismatch(field, class_name, json::type_name(other), expected)),
    }
}

fn string_array_field(object: &RawObject, field: &str, class_name: &str) -> EntityResult<Vec<String>> {
    const EXPECTED: &str = "array of string";
    array_field(object, field, class_name, EXPECTED)?
        .iter()
        .map(|item| match item {
            Value::String(value) => Ok(value.clone()),
            other => Err(element_mismatch(field, class_name, other, EXPECTED)),
        })
        .collect()
}

fn integer_array_field(object: &RawObject, field: &str, class_name: &str) -> EntityResult<Vec<i64>> {
    const EXPECTED: &str = "array of integer";
    array_field(object, field, class_name, EXPECTED)?
        .iter()
        .map(|item| json::as_integer(item).ok_or_else(|| element_mismatch(field, class_name, item, EXPECTED)))
        .collect()
}

fn element_mismatch(field: &str, class_name: &str, element: &Value, expected: &str) -> EntityError {
    let found = format!("array containing {}", json::type_name(element));
    EntityError::type_mismatch(field, class_name, &found, expected)
}

// TODO: validate each slide once the Slide entity exists; until then slides are carried as raw JSON.
fn slides_field(object: &RawObject, field: &str) -> Vec<Value> {
    match object.get(field) {
        Some(Value::Array(items)) => items.clone(),
        _ => Vec::new(),
    }
}

fn stored_reference(object: &RawObject, field: &str, class_name: &str) -> EntityResult<Option<Reference>> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(id)) => Ok(Some(Reference::unresolved(id.clone()))),
        Some(other) => Err(EntityError::type_mismatch(field, class_name, json::type_name(other), "string")),
    }
}
