//! Product records and validation of the `/generate_doc` request body.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Length the UI expects for the SAP code. Not enforced server-side.
pub const CODE_LENGTH: usize = 7;

/// One barcode / description / SAP code triple, rendered as one page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProductEntry {
    pub barcode: String,
    pub description: String,
    pub code: String,
}

impl ProductEntry {
    pub fn new(
        barcode: impl Into<String>,
        description: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        ProductEntry {
            barcode: barcode.into(),
            description: description.into(),
            code: code.into(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("request body is not valid JSON: {0}")]
    MalformedJson(String),
    #[error("request body must be a JSON object")]
    NotAnObject,
    #[error("`products` must be an array")]
    ProductsNotArray,
    #[error("product {index} must be an object")]
    EntryNotObject { index: usize },
    #[error("product {index} is missing field `{field}`")]
    MissingField { index: usize, field: &'static str },
    #[error("product {index} field `{field}` must be a string")]
    FieldNotString { index: usize, field: &'static str },
}

/// Decoded body of `POST /generate_doc`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GenerateRequest {
    pub products: Vec<ProductEntry>,
}

impl GenerateRequest {
    /// Parse and validate a raw JSON body.
    ///
    /// The whole list is checked before anything is returned, so a bad
    /// entry anywhere in the list is reported before rendering starts.
    /// A body without a `products` key is an empty request.
    pub fn from_json(body: &[u8]) -> Result<Self, ValidationError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| ValidationError::MalformedJson(e.to_string()))?;
        let Value::Object(root) = value else {
            return Err(ValidationError::NotAnObject);
        };

        let products = match root.get("products") {
            None => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(index, item)| entry_from_value(index, item))
                .collect::<Result<Vec<_>, _>>()?,
            Some(_) => return Err(ValidationError::ProductsNotArray),
        };

        Ok(GenerateRequest { products })
    }
}

fn entry_from_value(index: usize, value: &Value) -> Result<ProductEntry, ValidationError> {
    let Value::Object(fields) = value else {
        return Err(ValidationError::EntryNotObject { index });
    };
    Ok(ProductEntry {
        barcode: string_field(fields, index, "barcode")?,
        description: string_field(fields, index, "description")?,
        code: string_field(fields, index, "code")?,
    })
}

fn string_field(
    fields: &Map<String, Value>,
    index: usize,
    field: &'static str,
) -> Result<String, ValidationError> {
    match fields.get(field) {
        None | Some(Value::Null) => Err(ValidationError::MissingField { index, field }),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ValidationError::FieldNotString { index, field }),
    }
}
