//! Mapper executing an authored mapper definition.

use super::Mapper;
use crate::data::{DataType, MutableScope, Scope};
use crate::definition::{MapperDef, MappingDef, MappingType};
use crate::errors::{ConfigurationError, MappingError, ResolutionError};
use crate::resolve::{Resolver, ScopeResolver};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::trace;

/// Applies the entries of a [`MapperDef`] in order.
///
/// Without a resolver, references are resolved against the input scope only.
#[derive(Debug, Clone)]
pub struct BasicMapper {
    id: String,
    def: Arc<MapperDef>,
    resolver: Option<Arc<dyn Resolver>>,
    strict_types: bool,
}

impl BasicMapper {
    /// Creates a mapper after validating the definition.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if an entry can never be applied.
    pub fn new(
        id: impl Into<String>,
        def: Arc<MapperDef>,
        resolver: Option<Arc<dyn Resolver>>,
    ) -> Result<Self, ConfigurationError> {
        let id = id.into();
        def.validate(&id)?;
        Ok(Self {
            id,
            def,
            resolver,
            strict_types: true,
        })
    }

    /// Sets whether a failed type coercion aborts the mapping.
    #[must_use]
    pub const fn with_strict_types(mut self, strict: bool) -> Self {
        self.strict_types = strict;
        self
    }

    /// Returns the mapper identity.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the definition being applied.
    #[must_use]
    pub fn definition(&self) -> &Arc<MapperDef> {
        &self.def
    }

    /// Returns true if the mapper resolves through a resolver.
    #[must_use]
    pub const fn has_resolver(&self) -> bool {
        self.resolver.is_some()
    }

    fn evaluate(&self, mapping: &MappingDef, input: &dyn Scope) -> Result<Value, ResolutionError> {
        match mapping.mapping_type {
            MappingType::Literal => Ok(mapping.value.clone()),
            MappingType::Assign => match mapping.value.as_str() {
                Some(reference) => self.resolve(reference, input),
                None => Err(ResolutionError::new(
                    mapping.value.to_string(),
                    "assign mapping requires a string reference",
                )),
            },
            MappingType::Object => self.fill_template(&mapping.value, input),
        }
    }

    fn resolve(&self, expression: &str, input: &dyn Scope) -> Result<Value, ResolutionError> {
        match &self.resolver {
            Some(resolver) => resolver.resolve(expression, input),
            None => ScopeResolver::scope_only().resolve(expression, input),
        }
    }

    fn fill_template(&self, template: &Value, input: &dyn Scope) -> Result<Value, ResolutionError> {
        match template {
            Value::String(s) if s.starts_with('$') => self.resolve(s, input),
            Value::Array(items) => items
                .iter()
                .map(|item| self.fill_template(item, input))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Value::Object(fields) => fields
                .iter()
                .map(|(key, value)| -> Result<(String, Value), ResolutionError> {
                    Ok((key.clone(), self.fill_template(value, input)?))
                })
                .collect::<Result<Map<_, _>, _>>()
                .map(Value::Object),
            other => Ok(other.clone()),
        }
    }

    /// Coerces `value` to `data_type`, returning the type it is stored under.
    ///
    /// Without strict types a failed coercion keeps the raw value as `Any`.
    fn coerce(&self, data_type: DataType, value: Value) -> Result<(DataType, Value), ResolutionError> {
        match data_type.coerce(value.clone()) {
            Ok(coerced) => Ok((data_type, coerced)),
            Err(err) if self.strict_types => Err(err.into()),
            Err(_) => Ok((DataType::Any, value)),
        }
    }

    /// Writes `value` to `target`.
    ///
    /// An existing attribute keeps its declared type. A dotted target whose
    /// head names an existing object attribute writes into that object.
    fn write(&self, output: &dyn MutableScope, target: &str, value: Value) -> Result<(), ResolutionError> {
        if let Some(existing) = output.get_attr(target) {
            let (data_type, value) = self.coerce(existing.data_type(), value)?;
            output.add_attr(target, data_type, value);
            return Ok(());
        }

        if let Some((head, field_path)) = target.split_once('.') {
            if let Some(existing) = output.get_attr(head) {
                let data_type = existing.data_type();
                if data_type.is_object_like() || existing.value().is_object() {
                    let mut root = existing.into_value();
                    if root.is_null() {
                        root = Value::Object(Map::new());
                    }
                    set_nested(&mut root, field_path, value)
                        .map_err(|reason| ResolutionError::new(target, reason))?;
                    let (data_type, root) = self.coerce(data_type, root)?;
                    output.add_attr(head, data_type, root);
                    return Ok(());
                }
            }
        }

        output.add_attr(target, DataType::Any, value);
        Ok(())
    }
}

fn set_nested(root: &mut Value, field_path: &str, value: Value) -> Result<(), String> {
    let mut current = root;
    let mut fields = field_path.split('.').peekable();

    while let Some(field) = fields.next() {
        if field.is_empty() {
            return Err(format!("empty field in path '{field_path}'"));
        }
        let Value::Object(map) = current else {
            return Err(format!("cannot set field '{field}' on a non-object value"));
        };
        if fields.peek().is_none() {
            map.insert(field.to_string(), value);
            return Ok(());
        }
        current = map
            .entry(field.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    Ok(())
}

impl Mapper for BasicMapper {
    fn apply(&self, input: &dyn Scope, output: &dyn MutableScope) -> Result<(), MappingError> {
        for (index, mapping) in self.def.iter().enumerate() {
            let value = self
                .evaluate(mapping, input)
                .map_err(|err| err.with_mapping(index, &mapping.map_to))?;
            self.write(output, &mapping.map_to, value)
                .map_err(|err| err.with_mapping(index, &mapping.map_to))?;

            trace!(
                mapper = %self.id,
                index,
                target = %mapping.map_to,
                mapping_type = %mapping.mapping_type,
                "Applied mapping"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SimpleScope;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn mapper(def: MapperDef, resolver: Option<Arc<dyn Resolver>>) -> BasicMapper {
        BasicMapper::new("test.mapper", Arc::new(def), resolver).unwrap()
    }

    fn input_scope() -> SimpleScope {
        let scope = SimpleScope::new();
        scope.add_attr("a", DataType::Integer, json!(1));
        scope.add_attr("b", DataType::Integer, json!(2));
        scope.add_attr("order", DataType::Object, json!({"id": "o-9", "lines": [{"sku": "x"}]}));
        scope
    }

    #[test]
    fn test_literal_and_assign() {
        let def = MapperDef::new()
            .with_mapping(MappingDef::literal("greeting", json!("hi")))
            .with_mapping(MappingDef::assign("order_id", "$.order.id"));
        let output = SimpleScope::new();

        mapper(def, None).apply(&input_scope(), &output).unwrap();

        assert_eq!(output.value("greeting"), Some(json!("hi")));
        assert_eq!(output.value("order_id"), Some(json!("o-9")));
        assert_eq!(output.get_attr("order_id").unwrap().data_type(), DataType::Any);
    }

    #[test]
    fn test_later_entry_wins() {
        let def = MapperDef::new()
            .with_mapping(MappingDef::assign("x", "$.a"))
            .with_mapping(MappingDef::assign("x", "$.b"));
        let output = SimpleScope::new();

        mapper(def, None).apply(&input_scope(), &output).unwrap();

        assert_eq!(output.value("x"), Some(json!(2)));
    }

    #[test]
    fn test_object_template() {
        let def = MapperDef::new().with_mapping(MappingDef::object(
            "payload",
            json!({"id": "$.order.id", "skus": ["$.order.lines[0].sku", "fixed"], "n": 3}),
        ));
        let output = SimpleScope::new();

        mapper(def, None).apply(&input_scope(), &output).unwrap();

        assert_eq!(
            output.value("payload"),
            Some(json!({"id": "o-9", "skus": ["x", "fixed"], "n": 3}))
        );
    }

    #[test]
    fn test_existing_attribute_keeps_type() {
        let output = SimpleScope::new();
        output.add_attr("count", DataType::String, json!(""));
        let def = MapperDef::new().with_mapping(MappingDef::assign("count", "$.a"));

        mapper(def, None).apply(&input_scope(), &output).unwrap();

        let attr = output.get_attr("count").unwrap();
        assert_eq!(attr.data_type(), DataType::String);
        assert_eq!(attr.value(), &json!("1"));
    }

    #[test]
    fn test_nested_target() {
        let output = SimpleScope::new();
        output.add_attr("request", DataType::Object, json!({"method": "GET"}));
        let def = MapperDef::new()
            .with_mapping(MappingDef::assign("request.body.order", "$.order.id"));

        mapper(def, None).apply(&input_scope(), &output).unwrap();

        assert_eq!(
            output.value("request"),
            Some(json!({"method": "GET", "body": {"order": "o-9"}}))
        );
    }

    #[test]
    fn test_failure_names_mapping_and_keeps_prior_writes() {
        let def = MapperDef::new()
            .with_mapping(MappingDef::literal("first", json!(true)))
            .with_mapping(MappingDef::assign("second", "$.missing"));
        let output = SimpleScope::new();

        let err = mapper(def, None).apply(&input_scope(), &output).unwrap_err();

        match err {
            MappingError::Resolution(err) => {
                assert_eq!(err.mapping_index, Some(1));
                assert_eq!(err.target.as_deref(), Some("second"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(output.value("first"), Some(json!(true)));
        assert!(output.get_attr("second").is_none());
    }

    #[test]
    fn test_strict_coercion_failure() {
        let output = SimpleScope::new();
        output.add_attr("flag", DataType::Boolean, json!(false));
        let def = MapperDef::new().with_mapping(MappingDef::literal("flag", json!("perhaps")));

        let strict = mapper(def.clone(), None);
        assert!(strict.apply(&input_scope(), &output).is_err());

        let lenient = mapper(def, None).with_strict_types(false);
        lenient.apply(&input_scope(), &output).unwrap();
        let attr = output.get_attr("flag").unwrap();
        assert_eq!(attr.value(), &json!("perhaps"));
        assert_eq!(attr.data_type(), DataType::Any);
    }

    #[test]
    fn test_lenient_coercion_keeps_type_when_it_succeeds() {
        let output = SimpleScope::new();
        output.add_attr("flag", DataType::Boolean, json!(false));
        let def = MapperDef::new().with_mapping(MappingDef::literal("flag", json!("true")));

        mapper(def, None).with_strict_types(false).apply(&input_scope(), &output).unwrap();

        let attr = output.get_attr("flag").unwrap();
        assert_eq!(attr.value(), &json!(true));
        assert_eq!(attr.data_type(), DataType::Boolean);
    }

    #[test]
    fn test_without_resolver_rejects_activity_reference() {
        let def = MapperDef::new().with_mapping(MappingDef::assign("x", "$activity[t].y"));
        let err = mapper(def, None).apply(&input_scope(), &SimpleScope::new()).unwrap_err();
        assert!(err.to_string().contains("not available"));
    }

    #[test]
    fn test_with_resolver_reads_activity_output() {
        let input = input_scope();
        input.add_attr("_A.t.y", DataType::Any, json!("from t"));
        let def = MapperDef::new().with_mapping(MappingDef::assign("x", "$activity[t].y"));
        let output = SimpleScope::new();

        let resolver: Arc<dyn Resolver> = Arc::new(ScopeResolver::default());
        mapper(def, Some(resolver)).apply(&input, &output).unwrap();

        assert_eq!(output.value("x"), Some(json!("from t")));
    }

    #[test]
    fn test_invalid_definition_rejected() {
        let def = MapperDef::new().with_mapping(MappingDef::assign("x", ""));
        let err = BasicMapper::new("flow.t.input", Arc::new(def), None).unwrap_err();
        assert_eq!(err.key, "flow.t.input");
    }
}
