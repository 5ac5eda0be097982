//! # Serde module for DistinctCounter
//!
//! This module provides serde-based (serialization and deserialization) features for
//! `DistinctCounter`. It uses `serde`'s custom serialization and deserialization mechanisms.
//!
//! During serialization the counter state is converted into a tuple
//! `(threshold, generation, sample)`. The random source is not serialized: a deserialized
//! counter draws from a fresh source seeded from OS entropy.
//!
//! During deserialization the tuple is validated against counter invariants
//! (positive threshold, generation below 64, distinct sample smaller than threshold),
//! so a corrupted payload never produces a counter in an impossible state.
//!
//! Refer to the serde documentation for more details on custom serialization and deserialization:
//! - [Serialization](https://serde.rs/impl-serialize.html)
//! - [Deserialization](https://serde.rs/impl-deserialize.html)
use std::hash::{Hash, Hasher};

use rand::{RngCore, SeedableRng};
use serde::de::Error;
use serde::ser::SerializeTuple;
use serde::{Deserialize, Serialize};

use crate::estimator::DistinctCounter;

impl<T, R, H> Serialize for DistinctCounter<T, R, H>
where
    T: Hash + Eq + Serialize,
    R: RngCore,
    H: Hasher + Default,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut tup = serializer.serialize_tuple(3)?;
        tup.serialize_element(&self.threshold())?;
        tup.serialize_element(&self.generation())?;
        tup.serialize_element(&self.sample().collect::<Vec<_>>())?;
        tup.end()
    }
}

impl<'de, T, R, H> Deserialize<'de> for DistinctCounter<T, R, H>
where
    T: Hash + Eq + Deserialize<'de>,
    R: RngCore + SeedableRng,
    H: Hasher + Default,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let (threshold, generation, items): (usize, u8, Vec<T>) =
            Deserialize::deserialize(deserializer)?;
        DistinctCounter::from_parts(threshold, generation, items, R::from_entropy())
            .map_err(D::Error::custom)
    }
}
