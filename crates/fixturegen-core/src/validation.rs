use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::schema::{FieldType, ModelGraph};

/// Validate internal consistency of a model graph.
///
/// This checks:
/// - duplicate model ids and duplicate field names
/// - dangling `Model` references
/// - per-field constraint consistency
/// - empty enum/union member lists
pub fn validate_graph(graph: &ModelGraph) -> Result<()> {
    let mut known_models = BTreeSet::new();
    for model in &graph.models {
        if !known_models.insert(model.id.clone()) {
            return Err(Error::InvalidSchema(format!(
                "duplicate model id: {}",
                model.id
            )));
        }
    }

    for model in &graph.models {
        let mut field_names = BTreeSet::new();
        for field in &model.fields {
            if !field_names.insert(field.name.clone()) {
                return Err(Error::InvalidSchema(format!(
                    "duplicate field name: {}.{}",
                    model.id, field.name
                )));
            }

            let context = format!("{}.{}", model.id, field.name);
            field.constraints.validate(&context)?;
            validate_type(&field.ty, &known_models, &context)?;
        }
    }

    Ok(())
}

fn validate_type(ty: &FieldType, known_models: &BTreeSet<String>, context: &str) -> Result<()> {
    match ty {
        FieldType::Model { id } => {
            if !known_models.contains(id) {
                return Err(Error::InvalidSchema(format!(
                    "{context}: referenced model not found: {id}"
                )));
            }
            Ok(())
        }
        FieldType::Enum { members } => {
            if members.is_empty() {
                return Err(Error::InvalidSchema(format!(
                    "{context}: enum must declare at least one member"
                )));
            }
            Ok(())
        }
        FieldType::Union { members } => {
            if members.is_empty() {
                return Err(Error::InvalidSchema(format!(
                    "{context}: union must declare at least one member"
                )));
            }
            for member in members {
                validate_type(member, known_models, context)?;
            }
            Ok(())
        }
        FieldType::List { item } => validate_type(item, known_models, context),
        FieldType::Map { key, value } => {
            validate_type(key, known_models, context)?;
            validate_type(value, known_models, context)
        }
        _ => Ok(()),
    }
}
