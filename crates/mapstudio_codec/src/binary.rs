//! The binary map container.
//!
//! Layout, all scalars little-endian:
//!
//! ```text
//! magic "MSBG" | u32 version | u32 variant code | string map id
//! for each family (model, part, region, event):
//!     u32 group count
//!     for each group: string subtype tag | u32 record count | records
//! record: string name | fields in descriptor order
//! ```
//!
//! Strings are a `u32` byte length followed by bytes in the variant's text
//! encoding. Bit-sets are 4 or 8 `u32` blocks. References are `i32` indices
//! into the target family's flattened record list, `-1` for null.

use std::collections::HashMap;
use std::io::{self, Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use mapstudio_foundation::{
    BitSet128, BitSet256, Error, ErrorContext, ErrorKind, Family, FieldType, FlatValue,
    GameVariant, Result, TextEncoding, Value,
};
use mapstudio_schema::{EntityDescriptor, Subtype, SubtypeRegistry};

use crate::record::{FlatContainer, Record};

/// Container magic bytes.
pub const MAGIC: [u8; 4] = *b"MSBG";

/// Container format version written by [`encode`].
pub const FORMAT_VERSION: u32 = 1;

/// A value whose references are still container indices.
type IndexedValue = Value<i32>;

struct RawRecord {
    name: String,
    subtype: Subtype,
    offset: u64,
    values: Vec<IndexedValue>,
}

/// Decodes a container.
///
/// # Errors
///
/// Returns an error on bad magic, unknown version or variant, truncation,
/// trailing bytes, invalid text, a subtype tag the variant does not support,
/// or a reference index outside the target family's list.
pub fn decode(bytes: &[u8], registry: &SubtypeRegistry) -> Result<FlatContainer> {
    let mut reader = Reader::new(bytes);

    let mut magic = [0u8; 4];
    reader.read("magic", |c| c.read_exact(&mut magic))?;
    if magic != MAGIC {
        return Err(Error::corrupt(format!("bad magic {magic:02x?}")));
    }
    let version = reader.read("version", |c| c.read_u32::<LittleEndian>())?;
    if version != FORMAT_VERSION {
        return Err(Error::corrupt(format!("unsupported format version {version}")));
    }
    let code = reader.read("variant", |c| c.read_u32::<LittleEndian>())?;
    let variant =
        GameVariant::from_code(code).ok_or_else(|| Error::new(ErrorKind::UnknownVariant(code)))?;
    reader.encoding = variant.text_encoding();
    let map_id = reader.string("map id")?;

    let mut raw: HashMap<Family, Vec<RawRecord>> = HashMap::new();
    for family in Family::CONTAINER_ORDER {
        let records = read_family(&mut reader, registry, variant, family)?;
        tracing::trace!(%family, count = records.len(), "decoded family");
        raw.insert(family, records);
    }

    if reader.remaining() > 0 {
        return Err(Error::corrupt(format!(
            "{} trailing bytes after event list",
            reader.remaining()
        ))
        .with_context(ErrorContext::new().with_offset(reader.offset())));
    }

    let names: HashMap<Family, Vec<String>> = raw
        .iter()
        .map(|(family, records)| (*family, records.iter().map(|r| r.name.clone()).collect()))
        .collect();

    let mut container = FlatContainer::new(variant, map_id);
    for family in Family::CONTAINER_ORDER {
        for record in raw.remove(&family).unwrap_or_default() {
            let descriptor = registry.descriptor(variant, record.subtype)?;
            let resolved = link_names(&record, &descriptor, &names)?;
            container.records_mut(family).push(resolved);
        }
    }

    tracing::debug!(
        %variant,
        map_id = %container.map_id,
        records = container.len(),
        "decoded container"
    );
    Ok(container)
}

fn read_family(
    reader: &mut Reader<'_>,
    registry: &SubtypeRegistry,
    variant: GameVariant,
    family: Family,
) -> Result<Vec<RawRecord>> {
    let mut records = Vec::new();
    let groups = reader.read("group count", |c| c.read_u32::<LittleEndian>())?;
    for _ in 0..groups {
        let tag_offset = reader.offset();
        let tag = reader.string("subtype tag")?;
        let subtype = registry
            .resolve_tag(variant, family, &tag)
            .map_err(|e| e.with_context(ErrorContext::new().with_offset(tag_offset)))?;
        let descriptor = registry.descriptor(variant, subtype)?;
        let count = reader.read("record count", |c| c.read_u32::<LittleEndian>())?;
        for _ in 0..count {
            let offset = reader.offset();
            let name = reader.string("record name")?;
            let mut values = Vec::with_capacity(descriptor.fields().len());
            for field in descriptor.fields() {
                let value = reader.value(field.flat_type()).map_err(|e| {
                    e.with_context(
                        ErrorContext::new()
                            .with_record(family, name.clone())
                            .with_field(field.name)
                            .with_offset(offset),
                    )
                })?;
                values.push(value);
            }
            records.push(RawRecord {
                name,
                subtype,
                offset,
                values,
            });
        }
    }
    Ok(records)
}

fn link_names(
    record: &RawRecord,
    descriptor: &EntityDescriptor,
    names: &HashMap<Family, Vec<String>>,
) -> Result<Record> {
    let mut values = Vec::with_capacity(record.values.len());
    for (field, value) in descriptor.fields().iter().zip(&record.values) {
        let target = field.reference_target().map(|(t, _)| t.family);
        let linked = value.clone().map_refs(|index| {
            let list = target.and_then(|family| names.get(&family));
            usize::try_from(index)
                .ok()
                .and_then(|i| list.and_then(|l| l.get(i)))
                .cloned()
                .ok_or_else(|| {
                    Error::corrupt(format!(
                        "reference index {index} out of range for {}",
                        target.map_or("?", Family::as_str)
                    ))
                    .with_context(
                        ErrorContext::new()
                            .with_record(descriptor.family(), record.name.clone())
                            .with_field(field.name)
                            .with_offset(record.offset),
                    )
                })
        })?;
        values.push(linked);
    }
    Ok(Record {
        name: record.name.clone(),
        subtype: record.subtype,
        values,
    })
}

/// Encodes a container.
///
/// Within each family, records are grouped by subtype in order of first
/// appearance; reference indices follow that grouped order.
///
/// # Errors
///
/// Returns an error if a family contains duplicate names, a record names a
/// reference target absent from the container, a record is in the wrong
/// family list, or a value does not match its descriptor.
pub fn encode(container: &FlatContainer, registry: &SubtypeRegistry) -> Result<Vec<u8>> {
    let variant = container.variant;
    let mut grouped = HashMap::new();
    let mut indices: HashMap<Family, HashMap<&str, i32>> = HashMap::new();
    for family in Family::CONTAINER_ORDER {
        let groups = group_by_subtype(container.records(family), family)?;
        let mut index = HashMap::new();
        for (position, record) in groups.iter().flat_map(|(_, rs)| rs.iter()).enumerate() {
            let position = i32::try_from(position)
                .map_err(|_| Error::corrupt(format!("too many {family} records")))?;
            if index.insert(record.name.as_str(), position).is_some() {
                return Err(Error::duplicate_name(family, record.name.clone()));
            }
        }
        indices.insert(family, index);
        grouped.insert(family, groups);
    }

    let mut writer = Writer::new(variant.text_encoding());
    writer.bytes(&MAGIC)?;
    writer.u32(FORMAT_VERSION)?;
    writer.u32(variant.code())?;
    writer.string(&container.map_id)?;

    for family in Family::CONTAINER_ORDER {
        let groups = grouped.remove(&family).unwrap_or_default();
        writer.count(groups.len())?;
        for (subtype, records) in groups {
            let descriptor = registry.descriptor(variant, subtype)?;
            writer.string(subtype.tag())?;
            writer.count(records.len())?;
            for record in records {
                write_record(&mut writer, record, &descriptor, &indices).map_err(|e| {
                    if e.context.is_some() {
                        e
                    } else {
                        e.with_context(ErrorContext::new().with_record(family, record.name.clone()))
                    }
                })?;
            }
        }
    }

    tracing::debug!(%variant, bytes = writer.buf.len(), "encoded container");
    Ok(writer.buf)
}

fn group_by_subtype(records: &[Record], family: Family) -> Result<Vec<(Subtype, Vec<&Record>)>> {
    let mut groups: Vec<(Subtype, Vec<&Record>)> = Vec::new();
    for record in records {
        if record.family() != family {
            return Err(Error::new(ErrorKind::Internal(format!(
                "{} record {:?} in the {family} list",
                record.subtype, record.name
            ))));
        }
        match groups.iter_mut().find(|(s, _)| *s == record.subtype) {
            Some((_, members)) => members.push(record),
            None => groups.push((record.subtype, vec![record])),
        }
    }
    Ok(groups)
}

fn write_record(
    writer: &mut Writer,
    record: &Record,
    descriptor: &EntityDescriptor,
    indices: &HashMap<Family, HashMap<&str, i32>>,
) -> Result<()> {
    if record.values.len() != descriptor.fields().len() {
        return Err(Error::new(ErrorKind::Internal(format!(
            "{} record has {} values, descriptor has {} fields",
            record.subtype,
            record.values.len(),
            descriptor.fields().len()
        ))));
    }
    writer.string(&record.name)?;
    for (field, value) in descriptor.fields().iter().zip(&record.values) {
        let expected = field.flat_type();
        if value.value_type() != expected {
            return Err(Error::type_mismatch(expected, value.value_type()).with_context(
                ErrorContext::new()
                    .with_record(record.family(), record.name.clone())
                    .with_field(field.name),
            ));
        }
        let target = field.reference_target().map(|(t, _)| t.family);
        let indexed: IndexedValue = value.clone().map_refs(|name| {
            target
                .and_then(|family| indices.get(&family))
                .and_then(|index| index.get(name.as_str()).copied())
                .ok_or_else(|| {
                    Error::new(ErrorKind::MissingExportTarget {
                        family: record.family(),
                        source_name: record.name.clone(),
                        field: field.name.to_string(),
                        target: name.clone(),
                    })
                })
        })?;
        writer.value(&indexed)?;
    }
    Ok(())
}

struct Reader<'a> {
    cursor: Cursor<&'a [u8]>,
    encoding: TextEncoding,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(bytes),
            encoding: TextEncoding::Utf8,
        }
    }

    fn offset(&self) -> u64 {
        self.cursor.position()
    }

    fn remaining(&self) -> u64 {
        (self.cursor.get_ref().len() as u64).saturating_sub(self.offset())
    }

    fn read<T>(
        &mut self,
        what: &str,
        f: impl FnOnce(&mut Cursor<&'a [u8]>) -> io::Result<T>,
    ) -> Result<T> {
        let offset = self.offset();
        f(&mut self.cursor).map_err(|e| {
            Error::new(ErrorKind::Truncated {
                offset,
                message: format!("reading {what}: {e}"),
            })
        })
    }

    fn string(&mut self, what: &str) -> Result<String> {
        let len = self.read(what, |c| c.read_u32::<LittleEndian>())?;
        if u64::from(len) > self.remaining() {
            return Err(Error::new(ErrorKind::Truncated {
                offset: self.offset(),
                message: format!("{what} claims {len} bytes, {} remain", self.remaining()),
            }));
        }
        let mut bytes = vec![0u8; len as usize];
        self.read(what, |c| c.read_exact(&mut bytes))?;
        match self.encoding {
            TextEncoding::Utf8 => String::from_utf8(bytes)
                .map_err(|e| Error::corrupt(format!("{what} is not UTF-8: {e}"))),
            TextEncoding::Utf16Le => {
                if bytes.len() % 2 != 0 {
                    return Err(Error::corrupt(format!("{what} has an odd UTF-16 byte length")));
                }
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                    .collect();
                String::from_utf16(&units)
                    .map_err(|e| Error::corrupt(format!("{what} is not UTF-16: {e}")))
            }
        }
    }

    fn f32x3(&mut self) -> Result<[f32; 3]> {
        let mut v = [0f32; 3];
        self.read("vector", |c| c.read_f32_into::<LittleEndian>(&mut v))?;
        Ok(v)
    }

    fn blocks(&mut self, n: usize) -> Result<Vec<u32>> {
        let mut blocks = vec![0u32; n];
        self.read("bit-set", |c| c.read_u32_into::<LittleEndian>(&mut blocks))?;
        Ok(blocks)
    }

    fn index(&mut self) -> Result<Option<i32>> {
        let index = self.read("reference", |c| c.read_i32::<LittleEndian>())?;
        match index {
            -1 => Ok(None),
            i if i >= 0 => Ok(Some(i)),
            i => Err(Error::corrupt(format!("negative reference index {i}"))),
        }
    }

    fn value(&mut self, ty: FieldType) -> Result<IndexedValue> {
        Ok(match ty {
            FieldType::Bool => match self.read("bool", |c| c.read_u8())? {
                0 => Value::Bool(false),
                1 => Value::Bool(true),
                b => return Err(Error::corrupt(format!("invalid bool byte {b}"))),
            },
            FieldType::U8 => Value::U8(self.read("u8", |c| c.read_u8())?),
            FieldType::I8 => Value::I8(self.read("i8", |c| c.read_i8())?),
            FieldType::I16 => Value::I16(self.read("i16", |c| c.read_i16::<LittleEndian>())?),
            FieldType::U16 => Value::U16(self.read("u16", |c| c.read_u16::<LittleEndian>())?),
            FieldType::I32 => Value::I32(self.read("i32", |c| c.read_i32::<LittleEndian>())?),
            FieldType::U32 => Value::U32(self.read("u32", |c| c.read_u32::<LittleEndian>())?),
            FieldType::F32 => Value::F32(self.read("f32", |c| c.read_f32::<LittleEndian>())?),
            FieldType::F64 => Value::F64(self.read("f64", |c| c.read_f64::<LittleEndian>())?),
            FieldType::Vec3 => Value::Vec3(self.f32x3()?),
            FieldType::Euler => {
                let mut v = [0f64; 3];
                self.read("euler", |c| c.read_f64_into::<LittleEndian>(&mut v))?;
                Value::Euler(v)
            }
            FieldType::String => Value::String(self.string("string field")?),
            FieldType::Blocks(n) => Value::Blocks(self.blocks(n)?),
            FieldType::Bits128 => Value::Bits128(BitSet128::try_from_slice(&self.blocks(4)?)?),
            FieldType::Bits256 => Value::Bits256(BitSet256::try_from_slice(&self.blocks(8)?)?),
            FieldType::Ref => Value::Ref(self.index()?),
            FieldType::RefArray(n) => {
                Value::RefArray((0..n).map(|_| self.index()).collect::<Result<_>>()?)
            }
        })
    }
}

struct Writer {
    buf: Vec<u8>,
    encoding: TextEncoding,
}

impl Writer {
    fn new(encoding: TextEncoding) -> Self {
        Self {
            buf: Vec::new(),
            encoding,
        }
    }

    fn bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    fn u32(&mut self, v: u32) -> Result<()> {
        self.buf.write_u32::<LittleEndian>(v).map_err(io_error)
    }

    fn count(&mut self, n: usize) -> Result<()> {
        let n = u32::try_from(n).map_err(|_| Error::corrupt(format!("count {n} exceeds u32")))?;
        self.u32(n)
    }

    fn string(&mut self, s: &str) -> Result<()> {
        let bytes: Vec<u8> = match self.encoding {
            TextEncoding::Utf8 => s.as_bytes().to_vec(),
            TextEncoding::Utf16Le => s.encode_utf16().flat_map(u16::to_le_bytes).collect(),
        };
        self.count(bytes.len())?;
        self.bytes(&bytes)
    }

    fn index(&mut self, index: Option<i32>) -> Result<()> {
        self.buf
            .write_i32::<LittleEndian>(index.unwrap_or(-1))
            .map_err(io_error)
    }

    fn value(&mut self, value: &IndexedValue) -> Result<()> {
        match value {
            Value::String(s) => return self.string(s),
            Value::Ref(index) => return self.index(*index),
            Value::RefArray(indices) => return indices.iter().try_for_each(|i| self.index(*i)),
            _ => {}
        }
        let buf = &mut self.buf;
        match value {
            Value::Bool(b) => buf.write_u8(u8::from(*b)),
            Value::U8(v) => buf.write_u8(*v),
            Value::I8(v) => buf.write_i8(*v),
            Value::I16(v) => buf.write_i16::<LittleEndian>(*v),
            Value::U16(v) => buf.write_u16::<LittleEndian>(*v),
            Value::I32(v) => buf.write_i32::<LittleEndian>(*v),
            Value::U32(v) => buf.write_u32::<LittleEndian>(*v),
            Value::F32(v) => buf.write_f32::<LittleEndian>(*v),
            Value::F64(v) => buf.write_f64::<LittleEndian>(*v),
            Value::Vec3(v) => v.iter().try_for_each(|x| buf.write_f32::<LittleEndian>(*x)),
            Value::Euler(v) => v.iter().try_for_each(|x| buf.write_f64::<LittleEndian>(*x)),
            Value::Blocks(blocks) => blocks
                .iter()
                .try_for_each(|b| buf.write_u32::<LittleEndian>(*b)),
            Value::Bits128(set) => set
                .to_blocks()
                .iter()
                .try_for_each(|b| buf.write_u32::<LittleEndian>(*b)),
            Value::Bits256(set) => set
                .to_blocks()
                .iter()
                .try_for_each(|b| buf.write_u32::<LittleEndian>(*b)),
            Value::String(_) | Value::Ref(_) | Value::RefArray(_) => Ok(()),
        }
        .map_err(io_error)
    }
}

fn io_error(e: io::Error) -> Error {
    Error::new(ErrorKind::Io(e.to_string()))
}
