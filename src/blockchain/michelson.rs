//! Micheline JSON model and helpers for reading annotated storage.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::blockchain::types::{TezosError, TezosResult};

/// A Micheline expression in its JSON encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Micheline {
    Int {
        int: String,
    },
    String {
        string: String,
    },
    Bytes {
        bytes: String,
    },
    Prim {
        prim: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<Micheline>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        annots: Vec<String>,
    },
    Seq(Vec<Micheline>),
}

impl Micheline {
    pub fn nat(value: u64) -> Self {
        Micheline::Int {
            int: value.to_string(),
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Micheline::String {
            string: value.into(),
        }
    }

    /// Bytes literal, hex-encoded.
    pub fn bytes(value: &[u8]) -> Self {
        Micheline::Bytes {
            bytes: hex::encode(value),
        }
    }

    pub fn prim(prim: &str, args: Vec<Micheline>) -> Self {
        Micheline::Prim {
            prim: prim.to_string(),
            args,
            annots: Vec::new(),
        }
    }

    pub fn pair(left: Micheline, right: Micheline) -> Self {
        Self::prim("Pair", vec![left, right])
    }

    pub fn elt(key: Micheline, value: Micheline) -> Self {
        Self::prim("Elt", vec![key, value])
    }

    /// Primitive name, if this is an application.
    pub fn prim_name(&self) -> Option<&str> {
        match self {
            Micheline::Prim { prim, .. } => Some(prim),
            _ => None,
        }
    }

    pub fn args(&self) -> &[Micheline] {
        match self {
            Micheline::Prim { args, .. } => args,
            _ => &[],
        }
    }

    /// First field annotation, without the leading `%`.
    pub fn field_annotation(&self) -> Option<&str> {
        match self {
            Micheline::Prim { annots, .. } => annots.iter().find_map(|a| a.strip_prefix('%')),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Micheline::Int { int } => int.parse().ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.prim_name() {
            Some("True") => Some(true),
            Some("False") => Some(false),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Micheline::String { string } => Some(string),
            _ => None,
        }
    }

    /// Number of elements of a sequence (lists, sets, maps).
    pub fn seq_len(&self) -> Option<usize> {
        match self {
            Micheline::Seq(items) => Some(items.len()),
            _ => None,
        }
    }
}

/// Find the type declared by a top-level script section
/// (`parameter`, `storage`).
pub fn section<'a>(code: &'a Micheline, name: &str) -> Option<&'a Micheline> {
    match code {
        Micheline::Seq(sections) => sections
            .iter()
            .find(|s| s.prim_name() == Some(name))
            .and_then(|s| s.args().first()),
        _ => None,
    }
}

/// Names of the entrypoints declared by a parameter type.
pub fn entrypoints(parameter: &Micheline) -> Vec<String> {
    let mut names = Vec::new();
    collect_entrypoints(parameter, &mut names);
    names
}

fn collect_entrypoints(ty: &Micheline, names: &mut Vec<String>) {
    if let Some(name) = ty.field_annotation() {
        names.push(name.to_string());
        return;
    }
    if ty.prim_name() == Some("or") {
        for branch in ty.args() {
            collect_entrypoints(branch, names);
        }
    }
}

/// Walk a storage value against its type and collect every
/// field-annotated leaf (and annotated pair) by name.
pub fn annotated_fields(ty: &Micheline, value: &Micheline) -> TezosResult<BTreeMap<String, Micheline>> {
    let mut fields = BTreeMap::new();
    collect_fields(ty, value, &mut fields)?;
    Ok(fields)
}

fn collect_fields(
    ty: &Micheline,
    value: &Micheline,
    fields: &mut BTreeMap<String, Micheline>,
) -> TezosResult<()> {
    if let Some(name) = ty.field_annotation() {
        fields.insert(name.to_string(), value.clone());
    }

    if ty.prim_name() != Some("pair") {
        return Ok(());
    }

    let (left_ty, right_ty) = split_comb(ty.args(), "pair")
        .ok_or_else(|| TezosError::Decode("pair type with fewer than two arguments".into()))?;

    let items = match value {
        Micheline::Prim { prim, args, .. } if prim == "Pair" => args.as_slice(),
        Micheline::Seq(items) => items.as_slice(),
        other => {
            return Err(TezosError::Decode(format!(
                "expected a pair value, found {:?}",
                other
            )))
        }
    };
    let (left, right) = split_comb(items, "Pair")
        .ok_or_else(|| TezosError::Decode("pair value with fewer than two elements".into()))?;

    collect_fields(&left_ty, &left, fields)?;
    collect_fields(&right_ty, &right, fields)
}

/// Split a right comb `[a, b, c...]` into `(a, prim(b, c...))`.
fn split_comb(items: &[Micheline], prim: &str) -> Option<(Micheline, Micheline)> {
    match items {
        [] | [_] => None,
        [left, right] => Some((left.clone(), right.clone())),
        [left, rest @ ..] => Some((left.clone(), Micheline::prim(prim, rest.to_vec()))),
    }
}
