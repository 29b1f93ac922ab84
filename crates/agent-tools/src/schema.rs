//! Parameter schemas for capabilities
//!
//! A [`ParameterSchema`] is the typed contract of a capability's arguments.
//! It is used twice: rendered to JSON Schema for the model, and to validate
//! (and default-fill) every call before dispatch.

use serde_json::{Map, Value, json};

/// JSON type of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl ParamType {
    /// JSON Schema type name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => {
                value.is_i64()
                    || value.is_u64()
                    || value.as_f64().is_some_and(|f| f.fract() == 0.0)
            }
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }

    /// Whole-number floats become plain integers so readers can use `as_i64`
    fn normalize(self, value: &Value) -> Value {
        match (self, value.as_f64()) {
            (Self::Integer, Some(f)) if !value.is_i64() && !value.is_u64() => {
                Value::from(f as i64)
            }
            _ => value.clone(),
        }
    }
}

/// One declared parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    name: String,
    ty: ParamType,
    description: String,
    required: bool,
    allowed: Option<Vec<Value>>,
    default: Option<Value>,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, ty: ParamType) -> Self {
        Self {
            name: name.into(),
            ty,
            description: String::new(),
            required: false,
            allowed: None,
            default: None,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::String)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Integer)
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Restrict the value to one of `values`
    pub fn one_of<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.allowed = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Value filled in when the caller omits the parameter
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn param_type(&self) -> ParamType {
        self.ty
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    fn to_json_schema(&self) -> Value {
        let mut prop = Map::new();
        prop.insert("type".into(), json!(self.ty.as_str()));
        if !self.description.is_empty() {
            prop.insert("description".into(), json!(self.description));
        }
        if let Some(allowed) = &self.allowed {
            prop.insert("enum".into(), Value::Array(allowed.clone()));
        }
        if let Some(default) = &self.default {
            prop.insert("default".into(), default.clone());
        }
        Value::Object(prop)
    }
}

/// Ordered set of parameters accepted by a capability
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSchema {
    params: Vec<ParamSpec>,
}

impl ParameterSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter; a later parameter with the same name replaces it
    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.retain(|p| p.name != spec.name);
        self.params.push(spec);
        self
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub fn get(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// JSON Schema object describing the parameters
    pub fn to_json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .params
            .iter()
            .map(|p| (p.name.clone(), p.to_json_schema()))
            .collect();
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        })
    }

    /// Check `args` against the schema and fill in declared defaults
    ///
    /// `null` is accepted as "no arguments". Unknown parameters, missing
    /// required parameters, type mismatches and values outside an enum are
    /// all rejected with a message suitable for the model.
    pub fn validate(&self, args: &Value) -> Result<Value, String> {
        let provided = match args {
            Value::Null => Map::new(),
            Value::Object(map) => map.clone(),
            other => {
                return Err(format!(
                    "arguments must be a JSON object, got {}",
                    json_type_name(other)
                ));
            }
        };

        if let Some(unknown) = provided.keys().find(|k| self.get(k).is_none()) {
            return Err(format!("unknown parameter '{unknown}'"));
        }

        let mut validated = Map::new();
        for param in &self.params {
            match provided.get(&param.name) {
                Some(Value::Null) | None => {
                    if let Some(default) = &param.default {
                        validated.insert(param.name.clone(), default.clone());
                    } else if param.required {
                        return Err(format!("missing required parameter '{}'", param.name));
                    }
                }
                Some(value) => {
                    if !param.ty.matches(value) {
                        return Err(format!(
                            "parameter '{}' must be of type {}, got {}",
                            param.name,
                            param.ty.as_str(),
                            json_type_name(value)
                        ));
                    }
                    if let Some(allowed) = &param.allowed {
                        if !allowed.contains(value) {
                            let choices: Vec<String> =
                                allowed.iter().map(ToString::to_string).collect();
                            return Err(format!(
                                "parameter '{}' must be one of [{}], got {value}",
                                param.name,
                                choices.join(", ")
                            ));
                        }
                    }
                    validated.insert(param.name.clone(), param.ty.normalize(value));
                }
            }
        }

        Ok(Value::Object(validated))
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn news_schema() -> ParameterSchema {
        ParameterSchema::new()
            .param(
                ParamSpec::string("category")
                    .one_of(["general", "forex", "crypto", "merger"])
                    .default_value("general"),
            )
            .param(ParamSpec::integer("limit").default_value(10))
            .param(ParamSpec::string("symbol").required())
    }

    #[test]
    fn test_defaults_are_filled() {
        let out = news_schema().validate(&json!({"symbol": "AAPL"})).unwrap();
        assert_eq!(
            out,
            json!({"category": "general", "limit": 10, "symbol": "AAPL"})
        );
    }

    #[test]
    fn test_whole_float_is_normalized_to_integer() {
        let out = news_schema()
            .validate(&json!({"symbol": "AAPL", "limit": 5.0}))
            .unwrap();
        assert_eq!(out["limit"].as_i64(), Some(5));

        let err = news_schema()
            .validate(&json!({"symbol": "AAPL", "limit": 5.5}))
            .unwrap_err();
        assert!(err.contains("must be of type integer"));
    }

    #[test]
    fn test_missing_required() {
        let err = news_schema().validate(&json!({})).unwrap_err();
        assert!(err.contains("missing required parameter 'symbol'"));
    }

    #[test]
    fn test_unknown_parameter() {
        let err = news_schema()
            .validate(&json!({"symbol": "AAPL", "ticker": "MSFT"}))
            .unwrap_err();
        assert!(err.contains("unknown parameter 'ticker'"));
    }

    #[test]
    fn test_type_mismatch() {
        let err = news_schema()
            .validate(&json!({"symbol": "AAPL", "limit": "ten"}))
            .unwrap_err();
        assert!(err.contains("must be of type integer"));
    }

    #[test]
    fn test_enum_mismatch() {
        let err = news_schema()
            .validate(&json!({"symbol": "AAPL", "category": "sports"}))
            .unwrap_err();
        assert!(err.contains("must be one of"));
    }

    #[test]
    fn test_non_object_arguments() {
        let err = news_schema().validate(&json!("AAPL")).unwrap_err();
        assert!(err.contains("JSON object"));
    }

    #[test]
    fn test_null_means_no_arguments() {
        let schema = ParameterSchema::new();
        assert_eq!(schema.validate(&Value::Null).unwrap(), json!({}));
    }

    #[test]
    fn test_json_schema_shape() {
        let schema = news_schema().to_json_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["symbol"]));
        assert_eq!(schema["properties"]["category"]["enum"][1], "forex");
        assert_eq!(schema["properties"]["limit"]["default"], 10);
    }
}
