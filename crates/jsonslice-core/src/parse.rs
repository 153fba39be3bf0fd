//! JSON text to tape, driven by serde_json's deserializer.
//!
//! Values stream straight into a `TapeBuilder` through `DeserializeSeed`,
//! so no intermediate `serde_json::Value` tree is built.

use std::fmt;

use serde::de::{self, DeserializeSeed, MapAccess, SeqAccess, Visitor};

use crate::document::Document;
use crate::error::ParseError;
use crate::tape::TapeBuilder;

impl Document {
    /// Parse JSON text into a document that owns `input`.
    pub fn parse(input: impl Into<Vec<u8>>) -> Result<Document, ParseError> {
        let input = input.into();
        let mut builder = TapeBuilder::with_input_hint(input.len());
        {
            let mut de = serde_json::Deserializer::from_slice(&input);
            TapeSeed(&mut builder).deserialize(&mut de)?;
            de.end()?;
        }
        builder.finish_with_input(input)
    }
}

struct TapeSeed<'b>(&'b mut TapeBuilder);

impl<'de> DeserializeSeed<'de> for TapeSeed<'_> {
    type Value = ();

    fn deserialize<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for TapeSeed<'_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_unit<E>(self) -> Result<(), E>
    where
        E: de::Error,
    {
        self.0.null();
        Ok(())
    }

    fn visit_none<E>(self) -> Result<(), E>
    where
        E: de::Error,
    {
        self.0.null();
        Ok(())
    }

    fn visit_bool<E>(self, v: bool) -> Result<(), E>
    where
        E: de::Error,
    {
        self.0.bool(v);
        Ok(())
    }

    fn visit_i64<E>(self, v: i64) -> Result<(), E>
    where
        E: de::Error,
    {
        self.0.i64(v);
        Ok(())
    }

    fn visit_u64<E>(self, v: u64) -> Result<(), E>
    where
        E: de::Error,
    {
        self.0.u64(v);
        Ok(())
    }

    fn visit_f64<E>(self, v: f64) -> Result<(), E>
    where
        E: de::Error,
    {
        self.0.f64(v);
        Ok(())
    }

    fn visit_str<E>(self, v: &str) -> Result<(), E>
    where
        E: de::Error,
    {
        self.0.string(v);
        Ok(())
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<(), A::Error>
    where
        A: SeqAccess<'de>,
    {
        let builder = self.0;
        builder.begin_array();
        while seq.next_element_seed(TapeSeed(&mut *builder))?.is_some() {}
        builder.end_array();
        Ok(())
    }

    fn visit_map<A>(self, mut map: A) -> Result<(), A::Error>
    where
        A: MapAccess<'de>,
    {
        let builder = self.0;
        builder.begin_object();
        while map.next_key_seed(KeySeed(&mut *builder))?.is_some() {
            map.next_value_seed(TapeSeed(&mut *builder))?;
        }
        builder.end_object();
        Ok(())
    }
}

struct KeySeed<'b>(&'b mut TapeBuilder);

impl<'de> DeserializeSeed<'de> for KeySeed<'_> {
    type Value = ();

    fn deserialize<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_str(self)
    }
}

impl<'de> Visitor<'de> for KeySeed<'_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object key")
    }

    fn visit_str<E>(self, v: &str) -> Result<(), E>
    where
        E: de::Error,
    {
        self.0.key(v);
        Ok(())
    }
}
