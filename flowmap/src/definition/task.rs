//! Tasks and the activity metadata they are bound to.

use super::MapperDef;
use crate::data::DataType;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A declared input or output of an activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDecl {
    /// The attribute name.
    pub name: String,
    /// The declared type.
    #[serde(rename = "type", default)]
    pub data_type: DataType,
}

impl AttributeDecl {
    /// Creates a new declaration.
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Static input/output schema of an activity kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityMetadata {
    /// The activity reference.
    pub id: String,
    /// Declared inputs.
    #[serde(default)]
    pub inputs: Vec<AttributeDecl>,
    /// Declared outputs.
    #[serde(default)]
    pub outputs: Vec<AttributeDecl>,
}

impl ActivityMetadata {
    /// Creates metadata with no declared attributes.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Declares an input.
    #[must_use]
    pub fn with_input(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.inputs.push(AttributeDecl::new(name, data_type));
        self
    }

    /// Declares an output.
    #[must_use]
    pub fn with_output(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.outputs.push(AttributeDecl::new(name, data_type));
        self
    }

    /// Looks up a declared output.
    #[must_use]
    pub fn output(&self, name: &str) -> Option<&AttributeDecl> {
        self.outputs.iter().find(|decl| decl.name == name)
    }
}

/// One node of a flow definition, bound to an activity.
///
/// The pair `(definition_name, id)` identifies the task across every
/// running instance of its flow.
#[derive(Debug, Clone)]
pub struct Task {
    definition_name: String,
    id: String,
    name: Option<String>,
    activity: Option<Arc<ActivityMetadata>>,
    input_mapper: Option<Arc<MapperDef>>,
    output_mapper: Option<Arc<MapperDef>>,
}

impl Task {
    /// Creates a task of the given flow definition.
    #[must_use]
    pub fn new(definition_name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            definition_name: definition_name.into(),
            id: id.into(),
            name: None,
            activity: None,
            input_mapper: None,
            output_mapper: None,
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Binds the task to an activity.
    #[must_use]
    pub fn with_activity(mut self, activity: Arc<ActivityMetadata>) -> Self {
        self.activity = Some(activity);
        self
    }

    /// Sets the authored input mapping.
    #[must_use]
    pub fn with_input_mapper(mut self, def: MapperDef) -> Self {
        self.input_mapper = Some(Arc::new(def));
        self
    }

    /// Sets the authored output mapping.
    #[must_use]
    pub fn with_output_mapper(mut self, def: MapperDef) -> Self {
        self.output_mapper = Some(Arc::new(def));
        self
    }

    /// Returns the name of the flow definition owning this task.
    #[must_use]
    pub fn definition_name(&self) -> &str {
        &self.definition_name
    }

    /// Returns the task id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the display name, falling back to the id.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    /// Returns the activity metadata, if bound.
    #[must_use]
    pub fn activity(&self) -> Option<&Arc<ActivityMetadata>> {
        self.activity.as_ref()
    }

    /// Returns the authored input mapping, if any.
    #[must_use]
    pub fn input_mapper(&self) -> Option<&Arc<MapperDef>> {
        self.input_mapper.as_ref()
    }

    /// Returns the authored output mapping, if any.
    #[must_use]
    pub fn output_mapper(&self) -> Option<&Arc<MapperDef>> {
        self.output_mapper.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_activity_metadata_from_json() {
        let metadata: ActivityMetadata = serde_json::from_value(json!({
            "id": "rest",
            "inputs": [{"name": "uri", "type": "string"}],
            "outputs": [{"name": "result", "type": "object"}, {"name": "status"}]
        }))
        .unwrap();

        assert_eq!(metadata.inputs.len(), 1);
        assert_eq!(metadata.output("result").unwrap().data_type, DataType::Object);
        assert_eq!(metadata.output("status").unwrap().data_type, DataType::Any);
        assert!(metadata.output("missing").is_none());
    }

    #[test]
    fn test_task_builder() {
        let activity = Arc::new(ActivityMetadata::new("log").with_output("message", DataType::String));
        let task = Task::new("orders", "log_1")
            .with_activity(Arc::clone(&activity))
            .with_output_mapper(MapperDef::new());

        assert_eq!(task.definition_name(), "orders");
        assert_eq!(task.id(), "log_1");
        assert_eq!(task.name(), "log_1");
        assert!(Arc::ptr_eq(task.activity().unwrap(), &activity));
        assert!(task.input_mapper().is_none());
        assert!(task.output_mapper().is_some());
    }
}
