//! Struct schemas
//!
//! A struct packs its fields in declaration order. Each field carries a
//! `FieldMode`:
//! - `Required`: always packed
//! - `Optional`: preceded by a presence byte, payload omitted at the zero value
//! - `BinaryExtension`: packed normally, but left at its zero value when the
//!   input runs out while decoding
//! - `Skip`: never packed, decoded as the zero value
//!
//! Binary extension fields must form a contiguous suffix. `StructSchema::new`
//! is a `const fn` that refuses a misplaced extension, so a bad schema on a
//! `PackStruct::SCHEMA` constant fails the build.

use super::{CodecError, CodecResult, Decoder, Encoder, Pack, Unpack};

/// Per-field packing behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldMode {
    Required,
    Optional,
    BinaryExtension,
    Skip,
}

/// A named field descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub mode: FieldMode,
}

impl FieldSpec {
    pub const fn required(name: &'static str) -> Self {
        Self { name, mode: FieldMode::Required }
    }

    pub const fn optional(name: &'static str) -> Self {
        Self { name, mode: FieldMode::Optional }
    }

    pub const fn extension(name: &'static str) -> Self {
        Self { name, mode: FieldMode::BinaryExtension }
    }

    pub const fn skip(name: &'static str) -> Self {
        Self { name, mode: FieldMode::Skip }
    }
}

/// Ordered field descriptors of one struct
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructSchema {
    name: &'static str,
    fields: &'static [FieldSpec],
}

impl StructSchema {
    /// Build a schema, panicking (at compile time in const context) on a
    /// misplaced binary extension field.
    pub const fn new(name: &'static str, fields: &'static [FieldSpec]) -> Self {
        if misplaced_extension(fields).is_some() {
            panic!("binary extension fields must form a contiguous suffix");
        }
        Self { name, fields }
    }

    /// Build a schema at runtime, reporting a misplaced binary extension field
    pub fn try_new(name: &'static str, fields: &'static [FieldSpec]) -> CodecResult<Self> {
        match misplaced_extension(fields) {
            Some(index) => Err(CodecError::MisplacedBinaryExtension {
                schema: name,
                field: fields[index].name,
            }),
            None => Ok(Self { name, fields }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fields(&self) -> &'static [FieldSpec] {
        self.fields
    }
}

/// Index of the first extension field that is followed by a non-extension field
const fn misplaced_extension(fields: &[FieldSpec]) -> Option<usize> {
    let mut first_extension: Option<usize> = None;
    let mut i = 0;
    while i < fields.len() {
        match fields[i].mode {
            FieldMode::BinaryExtension => {
                if first_extension.is_none() {
                    first_extension = Some(i);
                }
            }
            _ => {
                if first_extension.is_some() {
                    return first_extension;
                }
            }
        }
        i += 1;
    }
    None
}

/// A struct with an explicit packing schema
pub trait PackStruct: Sized {
    const SCHEMA: StructSchema;

    /// Call `fields.field(..)` once per schema entry, in order
    fn pack_fields(&self, fields: &mut FieldWriter<'_>) -> CodecResult<()>;

    /// Call `fields.field()` once per schema entry, in order
    fn unpack_fields(fields: &mut FieldReader<'_, '_>) -> CodecResult<Self>;
}

/// Writes struct fields, applying each field's mode
pub struct FieldWriter<'a> {
    enc: &'a mut Encoder,
    schema: StructSchema,
    index: usize,
}

impl<'a> FieldWriter<'a> {
    pub(crate) fn new(enc: &'a mut Encoder, schema: StructSchema) -> Self {
        Self { enc, schema, index: 0 }
    }

    pub fn field<T: Pack + Default + PartialEq>(&mut self, value: &T) -> CodecResult<()> {
        let spec = next_spec(&self.schema, &mut self.index)?;
        match spec.mode {
            FieldMode::Required | FieldMode::BinaryExtension => value.pack(self.enc),
            FieldMode::Optional => {
                let present = *value != T::default();
                self.enc.write_bool(present);
                if present {
                    value.pack(self.enc)?;
                }
                Ok(())
            }
            FieldMode::Skip => Ok(()),
        }
    }

    pub(crate) fn finish(self) -> CodecResult<()> {
        check_consumed(&self.schema, self.index)
    }
}

/// Reads struct fields, applying each field's mode
pub struct FieldReader<'a, 'b> {
    dec: &'a mut Decoder<'b>,
    schema: StructSchema,
    index: usize,
}

impl<'a, 'b> FieldReader<'a, 'b> {
    pub(crate) fn new(dec: &'a mut Decoder<'b>, schema: StructSchema) -> Self {
        Self { dec, schema, index: 0 }
    }

    pub fn field<T: Unpack + Default>(&mut self) -> CodecResult<T> {
        let spec = next_spec(&self.schema, &mut self.index)?;
        match spec.mode {
            FieldMode::Required => T::unpack(self.dec),
            FieldMode::Optional => {
                if self.dec.read_bool()? {
                    T::unpack(self.dec)
                } else {
                    Ok(T::default())
                }
            }
            FieldMode::BinaryExtension => {
                if self.dec.is_exhausted() {
                    Ok(T::default())
                } else {
                    T::unpack(self.dec)
                }
            }
            FieldMode::Skip => Ok(T::default()),
        }
    }

    pub(crate) fn finish(self) -> CodecResult<()> {
        check_consumed(&self.schema, self.index)
    }
}

fn next_spec(schema: &StructSchema, index: &mut usize) -> CodecResult<FieldSpec> {
    let spec = schema.fields.get(*index).copied().ok_or_else(|| CodecError::SchemaMismatch {
        schema: schema.name,
        reason: format!("more than {} fields visited", schema.fields.len()),
    })?;
    *index += 1;
    Ok(spec)
}

fn check_consumed(schema: &StructSchema, visited: usize) -> CodecResult<()> {
    if visited != schema.fields.len() {
        return Err(CodecError::SchemaMismatch {
            schema: schema.name,
            reason: format!("visited {} of {} fields", visited, schema.fields.len()),
        });
    }
    Ok(())
}

/// Implement `Pack`/`Unpack` for `PackStruct` types
#[macro_export]
macro_rules! impl_pack_struct {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::codec::Pack for $ty {
                fn pack(&self, enc: &mut $crate::codec::Encoder) -> $crate::codec::CodecResult<()> {
                    enc.write_struct(self)
                }
            }

            impl $crate::codec::Unpack for $ty {
                fn unpack(dec: &mut $crate::codec::Decoder<'_>) -> $crate::codec::CodecResult<Self> {
                    dec.read_struct()
                }
            }
        )*
    };
}
