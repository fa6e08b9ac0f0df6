use serde::Serialize;
use serde_json::{Map, Value, json};
use std::fmt;

/// Expected JSON kind of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
    Any,
}

impl ParamKind {
    fn from_type_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "string" | "str" => ParamKind::String,
            "integer" | "int" => ParamKind::Integer,
            "number" | "float" => ParamKind::Number,
            "boolean" | "bool" => ParamKind::Boolean,
            "array" | "list" => ParamKind::Array,
            "object" | "dict" => ParamKind::Object,
            _ => ParamKind::Any,
        }
    }

    fn from_schema(schema: &Value) -> Self {
        match schema {
            Value::String(name) => Self::from_type_name(name),
            Value::Object(map) => match map.get("type") {
                Some(Value::String(name)) => Self::from_type_name(name),
                // ["string", "null"] style unions: first non-null member wins
                Some(Value::Array(names)) => names
                    .iter()
                    .filter_map(Value::as_str)
                    .find(|name| *name != "null")
                    .map(Self::from_type_name)
                    .unwrap_or(ParamKind::Any),
                _ => ParamKind::Any,
            },
            _ => ParamKind::Any,
        }
    }

    pub fn accepts(self, value: &Value) -> bool {
        match self {
            ParamKind::String => value.is_string(),
            ParamKind::Integer => value.is_i64() || value.is_u64(),
            ParamKind::Number => value.is_number(),
            ParamKind::Boolean => value.is_boolean(),
            ParamKind::Array => value.is_array(),
            ParamKind::Object => value.is_object(),
            ParamKind::Any => true,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Integer => "integer",
            ParamKind::Number => "number",
            ParamKind::Boolean => "boolean",
            ParamKind::Array => "array",
            ParamKind::Object => "object",
            ParamKind::Any => "any",
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Ordered parameter list of a tool, plus the schema exactly as the server sent it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InputSchema {
    pub params: Vec<ParamSpec>,
    pub raw: Value,
}

impl InputSchema {
    /// Accepts a JSON Schema object (`properties` + `required`) or a flat
    /// `{"param": "kind"}` mapping where every parameter is required.
    pub fn parse(raw: &Value) -> Self {
        let Some(map) = raw.as_object() else {
            return Self {
                params: Vec::new(),
                raw: raw.clone(),
            };
        };

        let params = if let Some(properties) = map.get("properties").and_then(Value::as_object) {
            let required: Vec<&str> = map
                .get("required")
                .and_then(Value::as_array)
                .map(|names| names.iter().filter_map(Value::as_str).collect())
                .unwrap_or_default();
            properties
                .iter()
                .map(|(name, schema)| ParamSpec {
                    name: name.clone(),
                    kind: ParamKind::from_schema(schema),
                    required: required.contains(&name.as_str()),
                    description: schema
                        .get("description")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                })
                .collect()
        } else if map.contains_key("type") {
            Vec::new()
        } else {
            map.iter()
                .map(|(name, kind)| ParamSpec {
                    name: name.clone(),
                    kind: ParamKind::from_schema(kind),
                    required: true,
                    description: None,
                })
                .collect()
        };

        Self {
            params,
            raw: raw.clone(),
        }
    }

    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|param| param.name == name)
    }

    /// Checks required parameters are present and every known parameter has
    /// the declared kind. Unknown extra keys are passed through untouched.
    pub fn validate(&self, arguments: &Map<String, Value>) -> Result<(), String> {
        for param in &self.params {
            match arguments.get(&param.name) {
                None | Some(Value::Null) if param.required => {
                    return Err(format!("missing required parameter '{}'", param.name));
                }
                Some(value) if !value.is_null() && !param.kind.accepts(value) => {
                    return Err(format!(
                        "parameter '{}' must be {}, got {}",
                        param.name,
                        param.kind,
                        json_kind(value)
                    ));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A tool as advertised by the connected server.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub schema: InputSchema,
}

impl ToolDescriptor {
    /// Builds a descriptor from one entry of a `tools/list` reply.
    pub fn from_listing(entry: &Value) -> Result<Self, String> {
        let map = entry
            .as_object()
            .ok_or_else(|| "tool entry is not an object".to_string())?;
        let name = map
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| "tool entry has no name".to_string())?;
        let description = map
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string();
        let schema = map
            .get("inputSchema")
            .or_else(|| map.get("schema"))
            .map(InputSchema::parse)
            .unwrap_or_default();

        Ok(Self {
            name: name.to_string(),
            description,
            schema,
        })
    }

    /// Compact JSON summary used when describing the tool to a model.
    pub fn summary(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "parameters": self.schema.params,
        })
    }
}
