//! JSON Schema tool builder

use advisor_core::ToolDefinition;

/// Builder for `ToolDefinition` parameter schemas.
///
/// # Example
/// ```ignore
/// let tool = ToolBuilder::new("product_search", "Search the product catalog")
///     .param("max_price", "number", "Inclusive price ceiling", false)
///     .param("sort_by", "string", "Result ordering", false)
///     .string_enum("sort_by", &["relevance", "price_asc", "price_desc"])
///     .build();
/// ```
#[derive(Debug, Clone, Default)]
pub struct ToolBuilder {
    name: String,
    description: String,
    properties: serde_json::Map<String, serde_json::Value>,
    required: Vec<String>,
}

impl ToolBuilder {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            properties: serde_json::Map::new(),
            required: Vec::new(),
        }
    }

    /// Add a parameter with type and description
    pub fn param(
        mut self,
        name: impl Into<String>,
        param_type: &str,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        let name = name.into();
        let mut prop = serde_json::Map::new();
        prop.insert(
            "type".to_string(),
            serde_json::Value::String(param_type.to_string()),
        );
        prop.insert(
            "description".to_string(),
            serde_json::Value::String(description.into()),
        );

        self.properties.insert(name.clone(), serde_json::Value::Object(prop));

        if required {
            self.required.push(name);
        }
        self
    }

    /// Add enum constraint to an existing string parameter
    pub fn string_enum<S: AsRef<str>>(mut self, name: &str, values: &[S]) -> Self {
        if let Some(obj) = self.properties.get_mut(name).and_then(|p| p.as_object_mut()) {
            let enum_values: Vec<serde_json::Value> = values
                .iter()
                .map(|v| serde_json::Value::String(v.as_ref().to_string()))
                .collect();
            obj.insert("enum".to_string(), serde_json::Value::Array(enum_values));
        }
        self
    }

    /// Add a string-array parameter with an item enum
    pub fn string_array(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        item_values: &[&str],
    ) -> Self {
        let name = name.into();
        let items: Vec<serde_json::Value> = item_values
            .iter()
            .map(|v| serde_json::Value::String(v.to_string()))
            .collect();
        self.properties.insert(
            name,
            serde_json::json!({
                "type": "array",
                "description": description.into(),
                "items": { "type": "string", "enum": items },
            }),
        );
        self
    }

    /// Add number range constraint
    pub fn number_range(mut self, name: &str, min: Option<f64>, max: Option<f64>) -> Self {
        if let Some(obj) = self.properties.get_mut(name).and_then(|p| p.as_object_mut()) {
            if let Some(min_val) = min {
                obj.insert("minimum".to_string(), serde_json::json!(min_val));
            }
            if let Some(max_val) = max {
                obj.insert("maximum".to_string(), serde_json::json!(max_val));
            }
        }
        self
    }

    pub fn build(self) -> ToolDefinition {
        let parameters = serde_json::json!({
            "type": "object",
            "properties": self.properties,
            "required": self.required,
        });

        ToolDefinition::new(self.name, self.description, parameters)
    }
}
