/// Class-name registry for decoding backend records into entities
///
/// Maps a backend class name to the entity type that decodes its records.
/// Registration swaps the whole map atomically (ArcSwap), so lookups never
/// block and concurrent decoders see either the old or the new table.

use crate::{
    backend::Record,
    config::ModelsConfig,
    entity::{Entity, Lifecycle},
    error::{EntityError, EntityResult},
    project::Project,
};
use arc_swap::ArcSwap;
use serde_json::Value;
use std::{collections::HashMap, sync::Arc};

/// Any registered entity, decoded from a record
#[derive(Debug, Clone)]
pub enum AnyEntity {
    Project(Project),
}

impl AnyEntity {
    pub fn class_name(&self) -> &str {
        match self {
            AnyEntity::Project(project) => project.raw_object().class_name(),
        }
    }

    pub fn serialize_with_ids(&self) -> Value {
        match self {
            AnyEntity::Project(project) => project.serialize_with_ids(),
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        match self {
            AnyEntity::Project(project) => project.lifecycle(),
        }
    }

    pub fn as_project(&self) -> Option<&Project> {
        match self {
            AnyEntity::Project(project) => Some(project),
        }
    }
}

impl From<Project> for AnyEntity {
    fn from(project: Project) -> Self {
        AnyEntity::Project(project)
    }
}

type Decoder = Arc<dyn Fn(Record, &ModelsConfig) -> EntityResult<AnyEntity> + Send + Sync>;

pub struct EntityRegistry {
    /// class_name -> record decoder
    decoders: ArcSwap<HashMap<String, Decoder>>,
}

impl std::fmt::Debug for EntityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let decoders = self.decoders.load();
        let mut classes: Vec<&String> = decoders.keys().collect();
        classes.sort();
        f.debug_struct("EntityRegistry").field("classes", &classes).finish()
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self {
            decoders: ArcSwap::new(Arc::new(HashMap::new())),
        }
    }

    /// Registry with every built-in entity registered under its configured class name
    pub fn with_builtin(models: &ModelsConfig) -> Self {
        let registry = Self::new();
        registry.register_type::<Project>(Project::class_name(models));
        registry
    }

    /// Associate a class name with an entity type, replacing any previous entry
    pub fn register_type<E>(&self, class_name: &str)
    where
        E: Entity + 'static,
        AnyEntity: From<E>,
    {
        let decoder: Decoder = Arc::new(|record: Record, models: &ModelsConfig| {
            E::construct_from_record(record, models).map(AnyEntity::from)
        });

        self.decoders.rcu(|current| {
            let mut next = HashMap::clone(current);
            next.insert(class_name.to_string(), Arc::clone(&decoder));
            next
        });

        tracing::info!("🔄 Registered entity type for class '{}'", class_name);
    }

    pub fn is_registered(&self, class_name: &str) -> bool {
        self.decoders.load().contains_key(class_name)
    }

    /// Decode a record with the entity type registered for its class
    pub fn decode(&self, record: Record, models: &ModelsConfig) -> EntityResult<AnyEntity> {
        let decoder = self
            .decoders
            .load()
            .get(record.class_name())
            .cloned()
            .ok_or_else(|| EntityError::interface_not_implemented(record.class_name()))?;

        decoder(record, models)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn project_record() -> Record {
        Record::new("Project", "p1")
            .with_field("id", "p1")
            .with_field("parent", Value::Null)
            .with_field("original_parent", Value::Null)
            .with_field("category", "catX")
            .with_field("language", "langY")
            .with_field("author", "userZ")
            .with_field("name", "Demo")
            .with_field("description", "d")
            .with_field("tags", json!(["a", "b"]))
            .with_field("is_dubbed", false)
            .with_field("is_edited", false)
            .with_field("resolution_x", 1920)
            .with_field("resolution_y", 1080)
            .with_field("slide_ordering_sequence", json!([0, 1]))
            .with_field("slides", json!([]))
    }

    #[test]
    fn decodes_registered_class() {
        let models = ModelsConfig::default();
        let registry = EntityRegistry::with_builtin(&models);
        assert!(registry.is_registered("Project"));

        let entity = registry.decode(project_record(), &models).unwrap();
        assert_eq!(entity.class_name(), "Project");
        assert_eq!(entity.lifecycle(), Lifecycle::Validated);
        assert_eq!(entity.as_project().map(Project::name), Some("Demo"));
    }

    #[test]
    fn unregistered_class_is_not_implemented() {
        let models = ModelsConfig::default();
        let registry = EntityRegistry::new();

        let err = registry.decode(project_record(), &models).unwrap_err();
        assert!(matches!(err, EntityError::InterfaceNotImplemented { ref class_name } if class_name == "Project"));
    }

    #[test]
    fn registration_under_alias_class() {
        let models = ModelsConfig::default();
        let registry = EntityRegistry::with_builtin(&models);
        registry.register_type::<Project>("LegacyProject");

        assert!(registry.is_registered("LegacyProject"));
        assert!(format!("{registry:?}").contains("LegacyProject"));
    }
}
