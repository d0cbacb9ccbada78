use std::collections::HashMap;

use serde_json::Value;

use super::{
    error::TypeError,
    schema::{Id, IngredientAmount},
};

pub type FormData = HashMap<String, Value>;

/// Loosely typed request body. Numbers may arrive as JSON numbers or numeric strings.
pub struct Form {
    inner: FormData,
}

impl Form {
    pub fn from_data(data: FormData) -> Self {
        Self { inner: data }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.get(key).is_some_and(|value| !value.is_null())
    }

    pub fn get_str(&self, key: &str) -> Result<String, TypeError> {
        match self.inner.get(key) {
            Some(value) => match value.as_str() {
                Some(v) => Ok(v.trim().to_string()),
                None => Err(TypeError::new("Not a valid string.")),
            },
            None => Err(TypeError::new("This field is required.")),
        }
    }

    pub fn get_number(&self, key: &str) -> Result<i64, TypeError> {
        match self.inner.get(key) {
            Some(value) => {
                value_as_number(value).ok_or_else(|| TypeError::new("A valid integer is required."))
            }
            None => Err(TypeError::new("This field is required.")),
        }
    }

    pub fn get_list(&self, key: &str) -> Result<&Vec<Value>, TypeError> {
        match self.inner.get(key) {
            Some(Value::Array(list)) => Ok(list),
            Some(_) => Err(TypeError::new("Expected a list of items.")),
            None => Err(TypeError::new("This field is required.")),
        }
    }

    pub fn get_ids(&self, key: &str) -> Result<Vec<Id>, TypeError> {
        self.get_list(key)?
            .iter()
            .map(|value| {
                value_as_number(value).ok_or_else(|| TypeError::new("Incorrect type. Expected pk value."))
            })
            .collect()
    }

    pub fn get_ingredients(&self, key: &str) -> Result<Vec<IngredientAmount>, TypeError> {
        self.get_list(key)?
            .iter()
            .map(|value| {
                let id = value.get("id").and_then(value_as_number);
                let amount = value.get("amount").and_then(value_as_number);

                match (id, amount) {
                    (Some(id), Some(amount)) => Ok(IngredientAmount { id, amount }),
                    _ => Err(TypeError::new(
                        "Each ingredient needs an integer id and amount.",
                    )),
                }
            })
            .collect()
    }
}

fn value_as_number(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
