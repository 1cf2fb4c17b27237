//! `Pack`/`Unpack` for primitive and standard-library types

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use super::{CodecError, CodecResult, Decoder, Encoder, Pack, Unpack};

macro_rules! impl_le_int {
    ($($ty:ty),*) => {
        $(
            impl Pack for $ty {
                fn pack(&self, enc: &mut Encoder) -> CodecResult<()> {
                    enc.write_raw(&self.to_le_bytes());
                    Ok(())
                }
            }

            impl Unpack for $ty {
                fn unpack(dec: &mut Decoder<'_>) -> CodecResult<Self> {
                    Ok(<$ty>::from_le_bytes(dec.read_array()?))
                }
            }
        )*
    };
}

impl_le_int!(u8, i8, u16, i16, u32, i32, u64, i64, u128, i128, f32, f64);

impl Pack for bool {
    fn pack(&self, enc: &mut Encoder) -> CodecResult<()> {
        enc.write_bool(*self);
        Ok(())
    }
}

impl Unpack for bool {
    fn unpack(dec: &mut Decoder<'_>) -> CodecResult<Self> {
        dec.read_bool()
    }
}

impl Pack for str {
    fn pack(&self, enc: &mut Encoder) -> CodecResult<()> {
        enc.write_string(self);
        Ok(())
    }
}

impl Pack for String {
    fn pack(&self, enc: &mut Encoder) -> CodecResult<()> {
        enc.write_string(self);
        Ok(())
    }
}

impl Unpack for String {
    fn unpack(dec: &mut Decoder<'_>) -> CodecResult<Self> {
        dec.read_string()
    }
}

impl<T: Pack + ?Sized> Pack for &T {
    fn pack(&self, enc: &mut Encoder) -> CodecResult<()> {
        (**self).pack(enc)
    }
}

impl<T: Pack> Pack for Box<T> {
    fn pack(&self, enc: &mut Encoder) -> CodecResult<()> {
        (**self).pack(enc)
    }
}

// Lists: varint count, then elements
impl<T: Pack> Pack for [T] {
    fn pack(&self, enc: &mut Encoder) -> CodecResult<()> {
        enc.write_uvarint(self.len() as u64);
        for item in self {
            item.pack(enc)?;
        }
        Ok(())
    }
}

impl<T: Pack> Pack for Vec<T> {
    fn pack(&self, enc: &mut Encoder) -> CodecResult<()> {
        self.as_slice().pack(enc)
    }
}

impl<T: Unpack> Unpack for Vec<T> {
    fn unpack(dec: &mut Decoder<'_>) -> CodecResult<Self> {
        let count = dec.read_len()?;
        // Every element takes at least one byte
        let mut items = Vec::with_capacity(count.min(dec.remaining()));
        for _ in 0..count {
            items.push(T::unpack(dec)?);
        }
        Ok(items)
    }
}

// Fixed arrays: elements only, no count
impl<T: Pack, const N: usize> Pack for [T; N] {
    fn pack(&self, enc: &mut Encoder) -> CodecResult<()> {
        for item in self {
            item.pack(enc)?;
        }
        Ok(())
    }
}

impl<T: Unpack, const N: usize> Unpack for [T; N] {
    fn unpack(dec: &mut Decoder<'_>) -> CodecResult<Self> {
        let mut items = Vec::with_capacity(N);
        for _ in 0..N {
            items.push(T::unpack(dec)?);
        }
        items
            .try_into()
            .map_err(|_| CodecError::Unsupported(format!("array of {} elements", N)))
    }
}

// `optional<T>`: presence byte, then the value
impl<T: Pack> Pack for Option<T> {
    fn pack(&self, enc: &mut Encoder) -> CodecResult<()> {
        match self {
            Some(value) => {
                enc.write_bool(true);
                value.pack(enc)
            }
            None => {
                enc.write_bool(false);
                Ok(())
            }
        }
    }
}

impl<T: Unpack> Unpack for Option<T> {
    fn unpack(dec: &mut Decoder<'_>) -> CodecResult<Self> {
        if dec.read_bool()? {
            Ok(Some(T::unpack(dec)?))
        } else {
            Ok(None)
        }
    }
}

// Maps: varint count, then (key, value) pairs in ascending key order
impl<K: Pack + Ord, V: Pack> Pack for BTreeMap<K, V> {
    fn pack(&self, enc: &mut Encoder) -> CodecResult<()> {
        enc.write_uvarint(self.len() as u64);
        for (key, value) in self {
            key.pack(enc)?;
            value.pack(enc)?;
        }
        Ok(())
    }
}

impl<K: Unpack + Ord, V: Unpack> Unpack for BTreeMap<K, V> {
    fn unpack(dec: &mut Decoder<'_>) -> CodecResult<Self> {
        let count = dec.read_len()?;
        let mut map = BTreeMap::new();
        for _ in 0..count {
            let key = K::unpack(dec)?;
            let value = V::unpack(dec)?;
            map.insert(key, value);
        }
        Ok(map)
    }
}

impl<K: Pack + Ord, V: Pack, S> Pack for HashMap<K, V, S> {
    fn pack(&self, enc: &mut Encoder) -> CodecResult<()> {
        let mut entries: Vec<(&K, &V)> = self.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        enc.write_uvarint(entries.len() as u64);
        for (key, value) in entries {
            key.pack(enc)?;
            value.pack(enc)?;
        }
        Ok(())
    }
}

impl<K: Unpack + Eq + Hash, V: Unpack> Unpack for HashMap<K, V> {
    fn unpack(dec: &mut Decoder<'_>) -> CodecResult<Self> {
        let count = dec.read_len()?;
        let mut map = HashMap::with_capacity(count.min(dec.remaining()));
        for _ in 0..count {
            let key = K::unpack(dec)?;
            let value = V::unpack(dec)?;
            map.insert(key, value);
        }
        Ok(map)
    }
}
