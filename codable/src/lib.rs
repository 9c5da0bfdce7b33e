/*!
Structural serialization of Rust types to and from CBOR.

Types describe their shape by implementing [`Encode`] and [`Decode`] against
keyed, unkeyed and scalar containers. The containers build, or walk, a
[`Value`] tree, which is then written or read with `tessera-cbor`.
*/

use tessera_cbor as cbor;
use tracing::*;

pub use cbor::{Tag, Value};

mod coerce;
mod date;
mod decoder;
mod encoder;
mod error;
mod impls;
mod key_case;
mod options;

pub use decoder::{
    Decode, Decoder, KeyedDecoder, MapDecoder, ReferencingDecoder, ScalarDecoder, UnkeyedDecoder,
};
pub use encoder::{
    Encode, Encoder, KeyedEncoder, ReferencingEncoder, ScalarEncoder, UnkeyedEncoder,
};
pub use error::{CodingPath, Error, Key};
pub use impls::{ByteBuf, MapKey};
pub use key_case::{to_camel_case, to_snake_case};
pub use options::{DateEncodingStrategy, DateStrategy, KeyFn, KeyStrategy, Options, UserInfo};


#[cfg(test)]
mod options_tests;

#[cfg(test)]
mod date_tests;

/// Encode `value` to a CBOR value tree
#[cfg_attr(feature = "instrument", instrument(skip_all))]
pub fn to_value<T>(value: &T, options: &Options) -> Result<Value, Error>
where
    T: Encode + ?Sized,
{
    let mut encoder = Encoder::new(options.clone());
    value
        .encode(&mut encoder)
        .inspect_err(|e| debug!("Failed to encode value: {e}"))?;
    Ok(encoder.into_value())
}

/// Encode `value` to CBOR bytes
pub fn encode_structured<T>(value: &T, options: &Options) -> Result<Vec<u8>, Error>
where
    T: Encode + ?Sized,
{
    to_value(value, options).map(|v| cbor::encode::encode(&v))
}

/// Decode a `T` from a CBOR value tree
#[cfg_attr(feature = "instrument", instrument(skip_all))]
pub fn from_value<T: Decode>(value: &Value, options: &Options) -> Result<T, Error> {
    T::decode(&mut Decoder::new(value, options))
        .inspect_err(|e| debug!("Failed to decode value: {e}"))
}

/// Decode a `T` from CBOR bytes, which must hold exactly one item
#[cfg_attr(feature = "instrument", instrument(skip_all))]
pub fn decode_structured<T: Decode>(data: &[u8], options: &Options) -> Result<T, Error> {
    let value = cbor::decode::decode(data).inspect_err(|e| debug!("Invalid CBOR: {e}"))?;
    from_value(&value, options)
}
