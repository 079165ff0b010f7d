//! Document value model (§3): a tagged sum over the scalar and compound
//! shapes a document database can hand back from a collection.

use serde::{Deserialize, Serialize};

/// A single document field value.
///
/// `Object` preserves field insertion order for display (a `Vec` of pairs,
/// not a `BTreeMap`) since §3 requires "field order preserved for display,
/// not for semantics" — a `BTreeMap` would silently re-sort on every
/// round-trip, which is exactly the representation choice that guarantee
/// rules out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum DocValue {
    Null,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Double(f64),
    /// Decimal128, carried as its canonical decimal string form (no native
    /// 128-bit decimal type in the standard library).
    Decimal128(String),
    String(String),
    Binary(Vec<u8>),
    /// 12-byte ObjectId, stored as its 24-character hex form.
    ObjectId(String),
    /// Milliseconds since the Unix epoch, UTC.
    DateTime(i64),
    /// Internal replication timestamp: (seconds, ordinal).
    Timestamp(u32, u32),
    MinKey,
    MaxKey,
    Array(Vec<DocValue>),
    Object(Vec<(String, DocValue)>),
}

impl DocValue {
    /// A short, stable tag naming this value's shape — used by the type
    /// lattice (§4.1) to classify observations without re-matching on the
    /// full enum at every call site.
    pub fn type_tag(&self) -> DocTypeTag {
        match self {
            DocValue::Null => DocTypeTag::Null,
            DocValue::Bool(_) => DocTypeTag::Bool,
            DocValue::Int32(_) => DocTypeTag::Int32,
            DocValue::Int64(_) => DocTypeTag::Int64,
            DocValue::Double(_) => DocTypeTag::Double,
            DocValue::Decimal128(_) => DocTypeTag::Decimal128,
            DocValue::String(_) => DocTypeTag::String,
            DocValue::Binary(_) => DocTypeTag::Binary,
            DocValue::ObjectId(_) => DocTypeTag::ObjectId,
            DocValue::DateTime(_) => DocTypeTag::DateTime,
            DocValue::Timestamp(..) => DocTypeTag::Timestamp,
            DocValue::MinKey => DocTypeTag::MinKey,
            DocValue::MaxKey => DocTypeTag::MaxKey,
            DocValue::Array(_) => DocTypeTag::Array,
            DocValue::Object(_) => DocTypeTag::Object,
        }
    }

    /// Look up a field by name on an `Object`; `None` for any other shape
    /// or a missing field. Distinguishing "missing" from "present and
    /// null" is the caller's job — this just returns `None` for both a
    /// non-object value and an absent key, since both mean "cannot
    /// descend further" to a path walker.
    pub fn get_field(&self, name: &str) -> Option<&DocValue> {
        match self {
            DocValue::Object(fields) => fields.iter().find(|(k, _)| k == name).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[DocValue]> {
        match self {
            DocValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DocValue::Null)
    }

    /// Render this value as canonical extended-JSON, used by the executor
    /// when a column collapses to VARCHAR (§4.1, §4.7) and by the
    /// in-memory document client for debugging output.
    pub fn to_extended_json(&self) -> serde_json::Value {
        use serde_json::json;
        match self {
            DocValue::Null => serde_json::Value::Null,
            DocValue::Bool(b) => json!(b),
            DocValue::Int32(n) => json!({"$numberInt": n.to_string()}),
            DocValue::Int64(n) => json!({"$numberLong": n.to_string()}),
            DocValue::Double(n) => json!(n),
            DocValue::Decimal128(s) => json!({"$numberDecimal": s}),
            DocValue::String(s) => json!(s),
            DocValue::Binary(b) => json!({"$binary": {"base64": base64_encode(b), "subType": "00"}}),
            DocValue::ObjectId(hex) => json!({"$oid": hex}),
            DocValue::DateTime(ms) => json!({"$date": {"$numberLong": ms.to_string()}}),
            DocValue::Timestamp(t, i) => json!({"$timestamp": {"t": t, "i": i}}),
            DocValue::MinKey => json!({"$minKey": 1}),
            DocValue::MaxKey => json!({"$maxKey": 1}),
            DocValue::Array(items) => {
                serde_json::Value::Array(items.iter().map(DocValue::to_extended_json).collect())
            }
            DocValue::Object(fields) => {
                let mut map = serde_json::Map::new();
                for (k, v) in fields {
                    map.insert(k.clone(), v.to_extended_json());
                }
                serde_json::Value::Object(map)
            }
        }
    }

    /// Compact canonical-JSON rendering (field order preserved), matching
    /// the S1/S2 scenario outputs (`"{\"field1\": 1, \"field2\": 2}"`).
    pub fn to_json_string(&self) -> String {
        render_json_compact(self)
    }

    /// Inverse of [`DocValue::to_extended_json`], used to load demo/test
    /// documents from a JSON file: plain JSON scalars map to the obvious
    /// `DocValue` variant (a whole number becomes `Int64`), and the
    /// `{"$oid": ..}`/`{"$numberLong": ..}`/etc. wrapper objects recover
    /// the BSON-specific types a bare JSON document can't otherwise spell.
    pub fn from_extended_json(v: &serde_json::Value) -> DocValue {
        match v {
            serde_json::Value::Null => DocValue::Null,
            serde_json::Value::Bool(b) => DocValue::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    DocValue::Int64(i)
                } else {
                    DocValue::Double(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => DocValue::String(s.clone()),
            serde_json::Value::Array(items) => {
                DocValue::Array(items.iter().map(DocValue::from_extended_json).collect())
            }
            serde_json::Value::Object(map) => {
                if let Some(wrapped) = extended_wrapper(map) {
                    return wrapped;
                }
                DocValue::Object(
                    map.iter().map(|(k, v)| (k.clone(), DocValue::from_extended_json(v))).collect(),
                )
            }
        }
    }
}

/// Recognizes the single-key `$oid`/`$numberLong`/... wrapper objects
/// `to_extended_json` emits; `None` for a plain multi-key (or unrecognized)
/// object, which falls through to `DocValue::Object`.
fn extended_wrapper(map: &serde_json::Map<String, serde_json::Value>) -> Option<DocValue> {
    if map.len() != 1 {
        return None;
    }
    let (key, val) = map.iter().next()?;
    match key.as_str() {
        "$oid" => Some(DocValue::ObjectId(val.as_str()?.to_string())),
        "$numberInt" => Some(DocValue::Int32(val.as_str()?.parse().ok()?)),
        "$numberLong" => Some(DocValue::Int64(val.as_str()?.parse().ok()?)),
        "$numberDecimal" => Some(DocValue::Decimal128(val.as_str()?.to_string())),
        "$date" => {
            let obj = val.as_object()?;
            let ms = obj.get("$numberLong")?.as_str()?.parse().ok()?;
            Some(DocValue::DateTime(ms))
        }
        "$minKey" => Some(DocValue::MinKey),
        "$maxKey" => Some(DocValue::MaxKey),
        _ => None,
    }
}

fn render_json_compact(v: &DocValue) -> String {
    match v {
        DocValue::Null => "null".to_string(),
        DocValue::Bool(b) => b.to_string(),
        DocValue::Int32(n) => n.to_string(),
        DocValue::Int64(n) => n.to_string(),
        DocValue::Double(n) => {
            if n.fract() == 0.0 && n.is_finite() {
                format!("{n:.1}")
            } else {
                n.to_string()
            }
        }
        DocValue::Decimal128(s) => s.clone(),
        DocValue::String(s) => format!("{s:?}"),
        DocValue::Binary(b) => format!("{b:?}"),
        DocValue::ObjectId(hex) => format!("{hex:?}"),
        DocValue::DateTime(ms) => ms.to_string(),
        DocValue::Timestamp(t, i) => format!("{{\"t\": {t}, \"i\": {i}}}"),
        DocValue::MinKey => "\"MinKey\"".to_string(),
        DocValue::MaxKey => "\"MaxKey\"".to_string(),
        DocValue::Array(items) => {
            let rendered: Vec<String> = items.iter().map(render_json_compact).collect();
            format!("[{}]", rendered.join(", "))
        }
        DocValue::Object(fields) => {
            let rendered: Vec<String> = fields
                .iter()
                .map(|(k, v)| format!("{k:?}: {}", render_json_compact(v)))
                .collect();
            format!("{{{}}}", rendered.join(", "))
        }
    }
}

fn base64_encode(bytes: &[u8]) -> String {
    const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    let mut out = String::new();
    for chunk in bytes.chunks(3) {
        let b0 = chunk[0];
        let b1 = chunk.get(1).copied();
        let b2 = chunk.get(2).copied();
        out.push(ALPHABET[(b0 >> 2) as usize] as char);
        out.push(ALPHABET[(((b0 & 0x03) << 4) | (b1.unwrap_or(0) >> 4)) as usize] as char);
        if let Some(b1) = b1 {
            out.push(ALPHABET[(((b1 & 0x0f) << 2) | (b2.unwrap_or(0) >> 6)) as usize] as char);
        } else {
            out.push('=');
        }
        if let Some(b2) = b2 {
            out.push(ALPHABET[(b2 & 0x3f) as usize] as char);
        } else {
            out.push('=');
        }
    }
    out
}

/// Shape tag for a `DocValue`, used as the observation unit fed into the
/// type lattice (§4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DocTypeTag {
    Null,
    Bool,
    Int32,
    Int64,
    Double,
    Decimal128,
    String,
    Binary,
    ObjectId,
    DateTime,
    Timestamp,
    MinKey,
    MaxKey,
    Array,
    Object,
}
