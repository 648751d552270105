//! Human-readable JSON dump of a container.
//!
//! Fields pass through their adapters, so the dump shows editor values:
//! radians, Z-up vectors, bit-sets as lists of enabled bits, and references
//! as target names.
//!
//! ```json
//! {
//!   "variant": "ds3",
//!   "map_id": "m30_00_00_00",
//!   "models": [{ "name": "m_test", "subtype": "MapPiece", "fields": { ... } }],
//!   "parts": [], "regions": [], "events": []
//! }
//! ```

use mapstudio_foundation::{
    BitSet, Error, ErrorContext, ErrorKind, Family, FieldType, FlatValue, GameVariant, NodeValue,
    Result, Value,
};
use mapstudio_schema::{EntityDescriptor, FieldAdapter, SubtypeRegistry};
use serde_json::{Map, Number, Value as Json};

use crate::record::{FlatContainer, Record};

/// Renders a container as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if a subtype is not registered for the container's
/// variant, a value does not match its descriptor, or a float is not finite.
pub fn to_json(container: &FlatContainer, registry: &SubtypeRegistry) -> Result<String> {
    let value = to_json_value(container, registry)?;
    serde_json::to_string_pretty(&value).map_err(|e| serialization(e.to_string()))
}

/// Builds the JSON tree for a container.
///
/// # Errors
///
/// See [`to_json`].
pub fn to_json_value(container: &FlatContainer, registry: &SubtypeRegistry) -> Result<Json> {
    let mut root = Map::new();
    root.insert("variant".into(), Json::from(container.variant.as_str()));
    root.insert("map_id".into(), Json::from(container.map_id.as_str()));
    for family in Family::CONTAINER_ORDER {
        let mut list = Vec::with_capacity(container.records(family).len());
        for record in container.records(family) {
            let descriptor = registry.descriptor(container.variant, record.subtype)?;
            list.push(record_to_json(record, &descriptor)?);
        }
        root.insert(list_key(family).into(), Json::Array(list));
    }
    Ok(Json::Object(root))
}

/// Parses a JSON dump back into a container.
///
/// Fields absent from a record take their zero value.
///
/// # Errors
///
/// Returns an error on malformed JSON, an unknown variant or subtype, an
/// unknown field, or a value of the wrong shape.
pub fn from_json(text: &str, registry: &SubtypeRegistry) -> Result<FlatContainer> {
    let value: Json = serde_json::from_str(text).map_err(|e| serialization(e.to_string()))?;
    from_json_value(&value, registry)
}

/// Converts a JSON tree back into a container.
///
/// # Errors
///
/// See [`from_json`].
pub fn from_json_value(value: &Json, registry: &SubtypeRegistry) -> Result<FlatContainer> {
    let root = value
        .as_object()
        .ok_or_else(|| serialization("top level is not an object"))?;
    let variant_name = root
        .get("variant")
        .and_then(Json::as_str)
        .ok_or_else(|| serialization("missing variant"))?;
    let variant = GameVariant::ALL
        .into_iter()
        .find(|v| v.as_str() == variant_name)
        .ok_or_else(|| serialization(format!("unknown variant {variant_name:?}")))?;
    let map_id = root
        .get("map_id")
        .and_then(Json::as_str)
        .ok_or_else(|| serialization("missing map_id"))?;

    let mut container = FlatContainer::new(variant, map_id);
    for family in Family::CONTAINER_ORDER {
        let Some(list) = root.get(list_key(family)) else {
            continue;
        };
        let list = list
            .as_array()
            .ok_or_else(|| serialization(format!("{} is not a list", list_key(family))))?;
        for entry in list {
            let record = record_from_json(entry, registry, variant, family)?;
            container.records_mut(family).push(record);
        }
    }
    Ok(container)
}

const fn list_key(family: Family) -> &'static str {
    match family {
        Family::Model => "models",
        Family::Part => "parts",
        Family::Region => "regions",
        Family::Event => "events",
    }
}

fn serialization(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::Serialization(message.into()))
}

fn record_to_json(record: &Record, descriptor: &EntityDescriptor) -> Result<Json> {
    let mut fields = Map::new();
    for (field, value) in descriptor.fields().iter().zip(&record.values) {
        let json = field_to_json(field, value).map_err(|e| {
            e.with_context(
                ErrorContext::new()
                    .with_record(record.family(), record.name.clone())
                    .with_field(field.name),
            )
        })?;
        fields.insert(field.name.into(), json);
    }
    let mut object = Map::new();
    object.insert("name".into(), Json::from(record.name.as_str()));
    object.insert("subtype".into(), Json::from(record.subtype.tag()));
    object.insert("fields".into(), Json::Object(fields));
    Ok(Json::Object(object))
}

fn field_to_json(field: &FieldAdapter, value: &FlatValue) -> Result<Json> {
    if field.is_reference() {
        return Ok(match value {
            Value::Ref(name) => name_to_json(name.as_deref()),
            Value::RefArray(names) => {
                Json::Array(names.iter().map(|n| name_to_json(n.as_deref())).collect())
            }
            other => return Err(Error::type_mismatch(field.flat_type(), other.value_type())),
        });
    }
    node_to_json(&field.read(value)?)
}

fn name_to_json(name: Option<&str>) -> Json {
    name.map_or(Json::Null, Json::from)
}

fn float(x: f64) -> Result<Json> {
    Number::from_f64(x)
        .map(Json::Number)
        .ok_or_else(|| serialization(format!("non-finite float {x}")))
}

fn node_to_json(value: &NodeValue) -> Result<Json> {
    Ok(match value {
        Value::Bool(b) => Json::from(*b),
        Value::U8(v) => Json::from(*v),
        Value::I8(v) => Json::from(*v),
        Value::I16(v) => Json::from(*v),
        Value::U16(v) => Json::from(*v),
        Value::I32(v) => Json::from(*v),
        Value::U32(v) => Json::from(*v),
        Value::F32(v) => float(f64::from(*v))?,
        Value::F64(v) => float(*v)?,
        Value::Vec3(v) => Json::Array(
            v.iter()
                .map(|x| float(f64::from(*x)))
                .collect::<Result<_>>()?,
        ),
        Value::Euler(v) => Json::Array(v.iter().map(|x| float(*x)).collect::<Result<_>>()?),
        Value::String(s) => Json::from(s.as_str()),
        Value::Blocks(blocks) => Json::from(blocks.clone()),
        Value::Bits128(set) => Json::from(set.enabled()),
        Value::Bits256(set) => Json::from(set.enabled()),
        Value::Ref(_) | Value::RefArray(_) => {
            return Err(Error::new(ErrorKind::Internal(
                "reference value outside a reference field".into(),
            )));
        }
    })
}

fn record_from_json(
    entry: &Json,
    registry: &SubtypeRegistry,
    variant: GameVariant,
    family: Family,
) -> Result<Record> {
    let object = entry
        .as_object()
        .ok_or_else(|| serialization(format!("{family} entry is not an object")))?;
    let name = object
        .get("name")
        .and_then(Json::as_str)
        .ok_or_else(|| serialization(format!("{family} entry has no name")))?;
    let context = || ErrorContext::new().with_record(family, name);
    let tag = object
        .get("subtype")
        .and_then(Json::as_str)
        .ok_or_else(|| serialization("missing subtype").with_context(context()))?;
    let subtype = registry
        .resolve_tag(variant, family, tag)
        .map_err(|e| e.with_context(context()))?;
    let descriptor = registry.descriptor(variant, subtype)?;

    let mut record = Record::new(name, &descriptor);
    let Some(fields) = object.get("fields") else {
        return Ok(record);
    };
    let fields = fields
        .as_object()
        .ok_or_else(|| serialization("fields is not an object").with_context(context()))?;
    for (key, json) in fields {
        let index = descriptor
            .field_index(key)
            .ok_or_else(|| Error::field_not_found(subtype.to_string(), key.as_str()))
            .map_err(|e| e.with_context(context()))?;
        let field = &descriptor.fields()[index];
        record.values[index] =
            field_from_json(field, json).map_err(|e| e.with_context(context().with_field(key.as_str())))?;
    }
    Ok(record)
}

fn field_from_json(field: &FieldAdapter, json: &Json) -> Result<FlatValue> {
    match field.flat_type() {
        FieldType::Ref => Ok(Value::Ref(name_from_json(json)?)),
        FieldType::RefArray(n) => {
            let items = array(json, n)?;
            Ok(Value::RefArray(
                items.iter().map(name_from_json).collect::<Result<_>>()?,
            ))
        }
        _ => field.write(&node_from_json(field.node_type(), json)?),
    }
}

fn name_from_json(json: &Json) -> Result<Option<String>> {
    match json {
        Json::Null => Ok(None),
        Json::String(s) => Ok(Some(s.clone())),
        other => Err(serialization(format!("expected a name or null, got {other}"))),
    }
}

fn array(json: &Json, len: usize) -> Result<&[Json]> {
    match json.as_array() {
        Some(items) if items.len() == len => Ok(items),
        _ => Err(serialization(format!("expected a list of {len}, got {json}"))),
    }
}

fn int<T: TryFrom<i64>>(json: &Json) -> Result<T> {
    json.as_i64()
        .and_then(|v| T::try_from(v).ok())
        .ok_or_else(|| serialization(format!("integer out of range: {json}")))
}

fn number(json: &Json) -> Result<f64> {
    json.as_f64()
        .ok_or_else(|| serialization(format!("expected a number, got {json}")))
}

fn indices(json: &Json) -> Result<Vec<usize>> {
    json.as_array()
        .ok_or_else(|| serialization(format!("expected a list of bit indices, got {json}")))?
        .iter()
        .map(int::<usize>)
        .collect()
}

fn enabled_bits<const BLOCKS: usize>(json: &Json) -> Result<BitSet<BLOCKS>> {
    let enabled = indices(json)?;
    if let Some(&i) = enabled.iter().find(|&&i| i >= BitSet::<BLOCKS>::WIDTH) {
        return Err(serialization(format!(
            "bit index {i} out of range for a {}-bit set",
            BitSet::<BLOCKS>::WIDTH
        )));
    }
    BitSet::from_enabled(enabled)
}

#[allow(clippy::cast_possible_truncation)]
fn node_from_json(ty: FieldType, json: &Json) -> Result<NodeValue> {
    Ok(match ty {
        FieldType::Bool => Value::Bool(
            json.as_bool()
                .ok_or_else(|| serialization(format!("expected a bool, got {json}")))?,
        ),
        FieldType::U8 => Value::U8(int(json)?),
        FieldType::I8 => Value::I8(int(json)?),
        FieldType::I16 => Value::I16(int(json)?),
        FieldType::U16 => Value::U16(int(json)?),
        FieldType::I32 => Value::I32(int(json)?),
        FieldType::U32 => Value::U32(int(json)?),
        FieldType::F32 => Value::F32(number(json)? as f32),
        FieldType::F64 => Value::F64(number(json)?),
        FieldType::Vec3 => {
            let items = array(json, 3)?;
            Value::Vec3([
                number(&items[0])? as f32,
                number(&items[1])? as f32,
                number(&items[2])? as f32,
            ])
        }
        FieldType::Euler => {
            let items = array(json, 3)?;
            Value::Euler([number(&items[0])?, number(&items[1])?, number(&items[2])?])
        }
        FieldType::String => Value::String(
            json.as_str()
                .ok_or_else(|| serialization(format!("expected a string, got {json}")))?
                .to_string(),
        ),
        FieldType::Blocks(n) => Value::Blocks(array(json, n)?.iter().map(int).collect::<Result<_>>()?),
        FieldType::Bits128 => Value::Bits128(enabled_bits(json)?),
        FieldType::Bits256 => Value::Bits256(enabled_bits(json)?),
        FieldType::Ref | FieldType::RefArray(_) => {
            return Err(Error::new(ErrorKind::Internal(
                "reference type outside a reference field".into(),
            )));
        }
    })
}
